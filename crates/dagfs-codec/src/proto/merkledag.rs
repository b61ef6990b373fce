//! The merkledag node envelope.
//!
//! ```text
//! message PBLink {
//!   optional bytes Hash = 1;
//!   optional string Name = 2;
//!   optional uint64 Size = 3;
//! }
//!
//! message PBNode {
//!   repeated PBLink Links = 2;
//!   optional bytes Data = 1;
//! }
//! ```
//!
//! `PBLink.Hash` is raw multihash bytes on the wire and base58 text once
//! decoded. `Links` is declared first, so encoders emit links before data.

use std::sync::Arc;

use crate::error::SchemaResult;
use crate::filter::Base58Filter;
use crate::schema::{Label, SchemaRegistry};

pub const PB_NODE: &str = "PBNode";
pub const PB_LINK: &str = "PBLink";

pub fn schema() -> SchemaResult<SchemaRegistry> {
    SchemaRegistry::builder()
        .message(
            SchemaRegistry::define_message(PB_LINK)
                .filtered_field(Label::Optional, "bytes", "Hash", 1, Arc::new(Base58Filter))?
                .field(Label::Optional, "string", "Name", 2)?
                .field(Label::Optional, "uint64", "Size", 3)?,
        )?
        .message(
            SchemaRegistry::define_message(PB_NODE)
                .field(Label::Repeated, PB_LINK, "Links", 2)?
                .field(Label::Optional, "bytes", "Data", 1)?,
        )?
        .build()
}

#[cfg(test)]
mod tests {
    use dagfs_types::ContentHash;

    use super::*;
    use crate::message::MessageCodec;
    use crate::value::{Record, Value};

    #[test]
    fn node_with_link_roundtrip() {
        let registry = schema().unwrap();
        let codec = MessageCodec::new(&registry);
        let target = ContentHash::compute(b"child");
        let node = Record::new()
            .with(
                "Links",
                vec![Value::Message(
                    Record::new()
                        .with("Hash", target.to_string())
                        .with("Name", "child")
                        .with("Size", 5u64),
                )],
            )
            .with("Data", b"\x08\x01".to_vec());

        let bytes = codec.encode(PB_NODE, &node).unwrap();
        // Links (field 2) precede Data (field 1).
        assert_eq!(bytes[0], 0x12);
        assert_eq!(codec.decode(PB_NODE, bytes).unwrap(), node);
    }

    #[test]
    fn empty_node_decodes() {
        let registry = schema().unwrap();
        let record = MessageCodec::new(&registry).decode(PB_NODE, Vec::new()).unwrap();
        assert!(record.is_empty());
    }

    #[test]
    fn definitions_display() {
        let registry = schema().unwrap();
        let text = registry.message(PB_NODE).unwrap().to_string();
        assert!(text.contains("repeated PBLink Links = 2;"));
    }
}
