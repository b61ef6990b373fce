//! Schema-driven binary wire codec for dagfs.
//!
//! Implements a protobuf-compatible tag-length-value wire format without
//! generated code: message and enum schemas are registered at runtime in a
//! [`SchemaRegistry`] and [`MessageCodec`] maps wire records onto structured
//! [`Value`]s.
//!
//! # Layers
//!
//! - [`wire`]: varints, fixed-width integers, length-delimited bytes, tags
//! - [`schema`]: message/enum definitions, builders, type resolution
//! - [`message`]: recursive encode/decode of [`Record`]s against a schema
//! - [`codec`]: the [`Codec`] trait used by the DAG to decode node payloads
//! - [`proto`]: bundled merkledag and unixfs schemas

pub mod codec;
pub mod error;
pub mod filter;
pub mod message;
pub mod proto;
pub mod schema;
pub mod value;
pub mod wire;

pub use codec::{Codec, ProtobufCodec};
pub use error::{CodecError, CodecResult, SchemaError, SchemaResult, WireError, WireResult};
pub use filter::{Base58Filter, FieldFilter};
pub use message::MessageCodec;
pub use schema::{
    EnumBuilder, EnumDef, FieldDef, FieldType, Label, MessageBuilder, MessageDef, ScalarKind,
    SchemaBuilder, SchemaRegistry,
};
pub use value::{Record, Value};
pub use wire::{WireReader, WireRecord, WireType, WireValue, WireWriter};
