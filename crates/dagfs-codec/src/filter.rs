//! Per-field value transforms applied around the wire representation.

use std::fmt;

use bytes::Bytes;
use dagfs_types::ContentHash;

use crate::value::Value;

/// A pair of transforms between a field's wire value and its domain value.
///
/// `decode` runs after the wire value has been interpreted according to the
/// field's declared type; `encode` runs before it is written, and must
/// produce a value of the declared type.
pub trait FieldFilter: fmt::Debug + Send + Sync {
    fn decode(&self, value: Value) -> Result<Value, String>;
    fn encode(&self, value: &Value) -> Result<Value, String>;
}

/// Binary multihash on the wire, base58 text in the domain.
#[derive(Clone, Copy, Debug, Default)]
pub struct Base58Filter;

impl FieldFilter for Base58Filter {
    fn decode(&self, value: Value) -> Result<Value, String> {
        match value {
            Value::Bytes(raw) => ContentHash::from_digest_bytes(&raw)
                .map(|hash| Value::String(hash.into()))
                .map_err(|e| e.to_string()),
            other => Err(format!("expected bytes, got {}", other.kind_name())),
        }
    }

    fn encode(&self, value: &Value) -> Result<Value, String> {
        match value {
            Value::String(text) => ContentHash::parse(text)
                .map(|hash| Value::Bytes(Bytes::from(hash.to_digest_bytes())))
                .map_err(|e| e.to_string()),
            other => Err(format!("expected string, got {}", other.kind_name())),
        }
    }
}
