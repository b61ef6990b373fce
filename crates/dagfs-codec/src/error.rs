use thiserror::Error;

use crate::wire::WireType;

/// Malformed bytes on the wire. Always fatal to the current decode.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum WireError {
    #[error("unexpected end of stream at offset {offset}")]
    UnexpectedEof { offset: usize },

    #[error("unknown wire type {wire_type} at offset {offset}")]
    UnknownWireType { wire_type: u8, offset: usize },

    #[error("varint longer than 64 bits at offset {offset}")]
    VarintOverflow { offset: usize },

    #[error("invalid field number {0}")]
    InvalidFieldNumber(u64),
}

/// Schema definition or schema/value mismatch.
///
/// These indicate a programming error or incompatible peer, never a
/// transient condition.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("duplicate {kind} {name:?} in {scope}")]
    DuplicateDefinition {
        kind: &'static str,
        scope: String,
        name: String,
    },

    #[error("invalid field number {number} for {message}.{field}")]
    InvalidFieldNumber {
        message: String,
        field: String,
        number: u32,
    },

    #[error("unknown field {field:?} in {message}")]
    UnknownField { message: String, field: String },

    #[error("unknown type {type_name:?} for field {message}.{field}")]
    UnknownFieldType {
        message: String,
        field: String,
        type_name: String,
    },

    #[error("unknown message type {0:?}")]
    UnknownMessage(String),

    #[error("unknown enum type {0:?}")]
    UnknownEnum(String),

    #[error("required field {message}.{field} not present")]
    MissingRequiredField { message: String, field: String },

    #[error("value {code} doesn't match any constant in enum {enum_name}")]
    UnknownEnumValue { enum_name: String, code: u64 },

    #[error("{name:?} doesn't match any constant in enum {enum_name}")]
    UnknownEnumName { enum_name: String, name: String },

    #[error("field {message}.{field} expects wire type {expected}, got {actual}")]
    WireTypeMismatch {
        message: String,
        field: String,
        expected: WireType,
        actual: WireType,
    },

    #[error("field {message}.{field} expects a {expected} value")]
    ValueTypeMismatch {
        message: String,
        field: String,
        expected: &'static str,
    },
}

/// Errors from encoding or decoding a message.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("wire format error: {0}")]
    Wire(#[from] WireError),

    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("field {field} is not valid UTF-8")]
    InvalidUtf8 { field: String },

    #[error("filter on field {field} failed: {reason}")]
    Filter { field: String, reason: String },
}

pub type WireResult<T> = Result<T, WireError>;
pub type SchemaResult<T> = Result<T, SchemaError>;
pub type CodecResult<T> = Result<T, CodecError>;
