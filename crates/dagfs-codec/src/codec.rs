use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

use crate::error::{CodecResult, SchemaError, SchemaResult};
use crate::message::MessageCodec;
use crate::schema::SchemaRegistry;
use crate::value::Value;

/// Turns a node's raw payload into a structured value and back.
///
/// A DAG configured with a codec hands every fetched payload through
/// [`Codec::decode`]; without one, node values are the raw bytes.
pub trait Codec: fmt::Debug + Send + Sync {
    /// Short identifier, for logs.
    fn name(&self) -> String;

    fn decode(&self, data: Bytes) -> CodecResult<Value>;

    fn encode(&self, value: &Value) -> CodecResult<Vec<u8>>;
}

/// Decodes payloads as one fixed message of a schema registry.
#[derive(Clone, Debug)]
pub struct ProtobufCodec {
    registry: Arc<SchemaRegistry>,
    message: String,
}

impl ProtobufCodec {
    /// Fails if `message` is not defined in `registry`.
    pub fn new(registry: Arc<SchemaRegistry>, message: impl Into<String>) -> SchemaResult<Self> {
        let message = message.into();
        registry.message(&message)?;
        Ok(Self { registry, message })
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ProtobufCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "protobuf/{}", self.message)
    }
}

impl Codec for ProtobufCodec {
    fn name(&self) -> String {
        self.to_string()
    }

    fn decode(&self, data: Bytes) -> CodecResult<Value> {
        let record = MessageCodec::new(&self.registry).decode(&self.message, data)?;
        Ok(Value::Message(record))
    }

    fn encode(&self, value: &Value) -> CodecResult<Vec<u8>> {
        let record = value.as_message().ok_or_else(|| SchemaError::ValueTypeMismatch {
            message: self.message.clone(),
            field: String::new(),
            expected: "message",
        })?;
        MessageCodec::new(&self.registry).encode(&self.message, record)
    }
}
