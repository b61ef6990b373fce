//! The node representation exchanged with an [`ObjectAccessor`](crate::ObjectAccessor).

use std::sync::OnceLock;

use bytes::Bytes;
use dagfs_codec::proto::merkledag::{self, PB_NODE};
use dagfs_codec::{CodecError, MessageCodec, Record, SchemaResult, SchemaRegistry, Value};
use dagfs_types::ContentHash;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{DagError, DagResult};

/// One row of a node's link table.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LinkRecord {
    #[serde(default)]
    pub name: String,
    pub hash: ContentHash,
    #[serde(default)]
    pub size: u64,
}

impl LinkRecord {
    pub fn new(name: impl Into<String>, hash: ContentHash, size: u64) -> Self {
        Self {
            name: name.into(),
            hash,
            size,
        }
    }
}

/// A complete merkledag node: opaque payload plus ordered links.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObjectRecord {
    pub data: Bytes,
    pub links: Vec<LinkRecord>,
}

impl ObjectRecord {
    pub fn new(data: impl Into<Bytes>, links: Vec<LinkRecord>) -> Self {
        Self {
            data: data.into(),
            links,
        }
    }

    /// Serialize as a `PBNode`.
    pub fn encode(&self) -> DagResult<Vec<u8>> {
        let registry = merkledag_schema()?;
        Ok(MessageCodec::new(registry).encode(PB_NODE, &self.to_record())?)
    }

    /// Parse a `PBNode`.
    pub fn decode(data: impl Into<Bytes>) -> DagResult<Self> {
        let registry = merkledag_schema()?;
        let record = MessageCodec::new(registry).decode(PB_NODE, data)?;
        Self::from_record(&record)
    }

    pub fn to_record(&self) -> Record {
        let links: Vec<Value> = self
            .links
            .iter()
            .map(|link| {
                Value::Message(
                    Record::new()
                        .with("Hash", link.hash.to_string())
                        .with("Name", link.name.as_str())
                        .with("Size", link.size),
                )
            })
            .collect();
        let mut record = Record::new();
        if !links.is_empty() {
            record.insert("Links", links);
        }
        if !self.data.is_empty() {
            record.insert("Data", self.data.clone());
        }
        record
    }

    pub fn from_record(record: &Record) -> DagResult<Self> {
        let mut links = Vec::new();
        for item in record.get_list("Links") {
            let link = item
                .as_message()
                .ok_or_else(|| DagError::Malformed("link entry is not a message".into()))?;
            let hash = link
                .get_str("Hash")
                .ok_or_else(|| DagError::Malformed("link without hash".into()))?;
            links.push(LinkRecord {
                name: link.get_str("Name").unwrap_or_default().to_string(),
                hash: ContentHash::parse(hash)?,
                size: link.get_uint("Size").unwrap_or(0),
            });
        }
        Ok(Self {
            data: record.get_bytes("Data").cloned().unwrap_or_default(),
            links,
        })
    }

    /// Hash this object would be stored under by a content-hashing store.
    pub fn compute_hash(&self) -> DagResult<ContentHash> {
        Ok(ContentHash::compute(&self.encode()?))
    }
}

/// Result of storing an [`ObjectRecord`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutResult {
    pub hash: ContentHash,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub links: Vec<LinkRecord>,
}

/// Daemons send `"Links": null` for nodes without links.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<LinkRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<LinkRecord>>::deserialize(deserializer)?.unwrap_or_default())
}

fn merkledag_schema() -> DagResult<&'static SchemaRegistry> {
    static SCHEMA: OnceLock<SchemaResult<SchemaRegistry>> = OnceLock::new();
    SCHEMA
        .get_or_init(merkledag::schema)
        .as_ref()
        .map_err(|e| DagError::Codec(CodecError::Schema(e.clone())))
}
