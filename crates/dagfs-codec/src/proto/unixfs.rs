//! The unixfs payload carried in `PBNode.Data`.
//!
//! ```text
//! message Data {
//!   enum DataType { Raw = 0; Directory = 1; File = 2; Metadata = 3; Symlink = 4; }
//!   required DataType Type = 1;
//!   optional bytes Data = 2;
//!   optional uint64 filesize = 3;
//!   repeated uint64 blocksize = 4;
//! }
//!
//! message Metadata {
//!   required string MimeType = 1;
//! }
//! ```

use std::fmt;

use crate::error::SchemaResult;
use crate::schema::{Label, SchemaRegistry};

pub const DATA: &str = "Data";
pub const DATA_TYPE: &str = "DataType";
pub const METADATA: &str = "Metadata";

/// Kind of unixfs node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DataType {
    Raw,
    Directory,
    File,
    Metadata,
    Symlink,
}

impl DataType {
    pub const ALL: [DataType; 5] = [
        Self::Raw,
        Self::Directory,
        Self::File,
        Self::Metadata,
        Self::Symlink,
    ];

    pub fn code(self) -> u64 {
        match self {
            Self::Raw => 0,
            Self::Directory => 1,
            Self::File => 2,
            Self::Metadata => 3,
            Self::Symlink => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Raw => "Raw",
            Self::Directory => "Directory",
            Self::File => "File",
            Self::Metadata => "Metadata",
            Self::Symlink => "Symlink",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub fn schema() -> SchemaResult<SchemaRegistry> {
    let data_type = DataType::ALL
        .into_iter()
        .try_fold(SchemaRegistry::define_enum(DATA_TYPE), |e, t| {
            e.value(t.name(), t.code())
        })?;

    SchemaRegistry::builder()
        .enumeration(data_type)?
        .message(
            SchemaRegistry::define_message(DATA)
                .field(Label::Required, DATA_TYPE, "Type", 1)?
                .field(Label::Optional, "bytes", "Data", 2)?
                .field(Label::Optional, "uint64", "filesize", 3)?
                .field(Label::Repeated, "uint64", "blocksize", 4)?,
        )?
        .message(
            SchemaRegistry::define_message(METADATA)
                .field(Label::Required, "string", "MimeType", 1)?,
        )?
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageCodec;

    #[test]
    fn decodes_file_payload() {
        let registry = schema().unwrap();
        // Type=File, Data="hi", filesize=2
        let data = vec![0x08, 0x02, 0x12, 0x02, b'h', b'i', 0x18, 0x02];
        let record = MessageCodec::new(&registry).decode(DATA, data).unwrap();
        assert_eq!(record.get_enum("Type"), Some("File"));
        assert_eq!(record.get_bytes("Data").map(|b| b.as_ref()), Some(&b"hi"[..]));
        assert_eq!(record.get_uint("filesize"), Some(2));
    }

    #[test]
    fn type_is_required() {
        let registry = schema().unwrap();
        assert!(MessageCodec::new(&registry).decode(DATA, vec![0x18, 0x02]).is_err());
    }

    #[test]
    fn data_type_names() {
        for t in DataType::ALL {
            assert_eq!(DataType::from_name(t.name()), Some(t));
        }
        assert_eq!(DataType::from_name("Socket"), None);
        assert_eq!(DataType::Directory.to_string(), "Directory");
    }

    #[test]
    fn registries_merge() {
        let merged = schema()
            .unwrap()
            .merge(&crate::proto::merkledag::schema().unwrap())
            .unwrap();
        assert!(merged.message(DATA).is_ok());
        assert!(merged.message(crate::proto::merkledag::PB_NODE).is_ok());
    }
}
