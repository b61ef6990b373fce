//! Recursive schema-driven encode and decode.

use std::borrow::Cow;

use bytes::Bytes;
use tracing::trace;

use crate::error::{CodecError, CodecResult, SchemaError};
use crate::schema::{FieldDef, FieldType, Label, MessageDef, ScalarKind, SchemaRegistry};
use crate::value::{Record, Value};
use crate::wire::{WireReader, WireType, WireValue, WireWriter};

/// Encodes and decodes [`Record`]s against the messages of a registry.
#[derive(Clone, Copy, Debug)]
pub struct MessageCodec<'r> {
    registry: &'r SchemaRegistry,
}

impl<'r> MessageCodec<'r> {
    pub fn new(registry: &'r SchemaRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'r SchemaRegistry {
        self.registry
    }

    /// Decode `data` as an instance of the named message.
    pub fn decode(&self, message: &str, data: impl Into<Bytes>) -> CodecResult<Record> {
        let def = self.registry.message(message)?;
        self.decode_message(def, data.into())
    }

    /// Encode `record` as an instance of the named message.
    pub fn encode(&self, message: &str, record: &Record) -> CodecResult<Vec<u8>> {
        let def = self.registry.message(message)?;
        self.encode_message(def, record)
    }

    /// Unknown field numbers are skipped. A non-repeated field seen more than
    /// once keeps the last value; repeated fields accumulate in arrival order.
    pub fn decode_message(&self, def: &MessageDef, data: Bytes) -> CodecResult<Record> {
        let mut record = Record::new();
        for wire in WireReader::new(data) {
            let wire = wire?;
            let Some(field) = def.field_by_number(wire.field_number) else {
                trace!(
                    message = def.name(),
                    field_number = wire.field_number,
                    "skipping unknown field"
                );
                continue;
            };

            let expected = field.field_type.wire_type();
            let actual = wire.wire_type();
            if field.label == Label::Repeated && field.field_type.is_packable() {
                if let WireValue::Bytes(payload) = &wire.value {
                    let mut packed = WireReader::new(payload.clone());
                    while !packed.is_eof() {
                        let item = read_packed_item(&mut packed, expected)?;
                        let value = self.decode_value(def, field, item)?;
                        record.push(&field.name, value);
                    }
                    continue;
                }
            }
            if actual != expected {
                return Err(SchemaError::WireTypeMismatch {
                    message: def.name().to_string(),
                    field: field.name.clone(),
                    expected,
                    actual,
                }
                .into());
            }

            let value = self.decode_value(def, field, wire.value)?;
            if field.label == Label::Repeated {
                record.push(&field.name, value);
            } else {
                record.insert(field.name.clone(), value);
            }
        }

        for field in def.fields() {
            if field.label == Label::Required && !record.contains(&field.name) {
                return Err(missing_required(def, field).into());
            }
        }
        Ok(record)
    }

    fn decode_value(&self, def: &MessageDef, field: &FieldDef, wire: WireValue) -> CodecResult<Value> {
        let value = match (&field.field_type, wire) {
            (FieldType::Scalar(ScalarKind::Bool), WireValue::Varint(v)) => Value::Bool(v != 0),
            (FieldType::Scalar(ScalarKind::UInt32), WireValue::Varint(v)) => {
                Value::UInt(u64::from(v as u32))
            }
            (FieldType::Scalar(ScalarKind::UInt64), WireValue::Varint(v)) => Value::UInt(v),
            (FieldType::Scalar(ScalarKind::Fixed32), WireValue::Fixed32(v)) => {
                Value::UInt(u64::from(v))
            }
            (FieldType::Scalar(ScalarKind::Fixed64), WireValue::Fixed64(v)) => Value::UInt(v),
            (FieldType::Scalar(ScalarKind::String), WireValue::Bytes(raw)) => {
                let text = String::from_utf8(raw.to_vec()).map_err(|_| CodecError::InvalidUtf8 {
                    field: format!("{}.{}", def.name(), field.name),
                })?;
                Value::String(text)
            }
            (FieldType::Scalar(ScalarKind::Bytes), WireValue::Bytes(raw)) => Value::Bytes(raw),
            (FieldType::Message(name), WireValue::Bytes(raw)) => {
                let nested = self.registry.message(name)?;
                Value::Message(self.decode_message(nested, raw)?)
            }
            (FieldType::Enum(name), WireValue::Varint(code)) => {
                let enum_def = self.registry.enumeration(name)?;
                let constant = enum_def.name_of(code).ok_or_else(|| SchemaError::UnknownEnumValue {
                    enum_name: name.clone(),
                    code,
                })?;
                Value::Enum(constant.to_string())
            }
            (field_type, wire) => {
                return Err(SchemaError::WireTypeMismatch {
                    message: def.name().to_string(),
                    field: field.name.clone(),
                    expected: field_type.wire_type(),
                    actual: wire.wire_type(),
                }
                .into())
            }
        };

        match &field.filter {
            Some(filter) => filter.decode(value).map_err(|reason| CodecError::Filter {
                field: format!("{}.{}", def.name(), field.name),
                reason,
            }),
            None => Ok(value),
        }
    }

    /// Fields are written in declaration order; repeated fields as one record
    /// per item.
    pub fn encode_message(&self, def: &MessageDef, record: &Record) -> CodecResult<Vec<u8>> {
        for field in def.fields() {
            if field.label == Label::Required && !record.contains(&field.name) {
                return Err(missing_required(def, field).into());
            }
        }
        if let Some(unknown) = record.names().find(|name| def.field_by_name(name).is_none()) {
            return Err(SchemaError::UnknownField {
                message: def.name().to_string(),
                field: unknown.to_string(),
            }
            .into());
        }

        let mut writer = WireWriter::new();
        for field in def.fields() {
            let Some(value) = record.get(&field.name) else {
                continue;
            };
            if field.label == Label::Repeated {
                let items = value
                    .as_list()
                    .ok_or_else(|| value_mismatch(def, field, "list"))?;
                for item in items {
                    self.encode_field(&mut writer, def, field, item)?;
                }
            } else {
                self.encode_field(&mut writer, def, field, value)?;
            }
        }
        Ok(writer.into_bytes())
    }

    fn encode_field(
        &self,
        writer: &mut WireWriter,
        def: &MessageDef,
        field: &FieldDef,
        value: &Value,
    ) -> CodecResult<()> {
        let value: Cow<'_, Value> = match &field.filter {
            Some(filter) => Cow::Owned(filter.encode(value).map_err(|reason| CodecError::Filter {
                field: format!("{}.{}", def.name(), field.name),
                reason,
            })?),
            None => Cow::Borrowed(value),
        };

        writer.write_tag(field.number, field.field_type.wire_type());
        match (&field.field_type, value.as_ref()) {
            (FieldType::Scalar(ScalarKind::Bool), Value::Bool(b)) => {
                writer.write_varint(u64::from(*b))
            }
            (FieldType::Scalar(ScalarKind::UInt32), Value::UInt(v)) => {
                let v = u32::try_from(*v).map_err(|_| value_mismatch(def, field, "uint32"))?;
                writer.write_varint(u64::from(v))
            }
            (FieldType::Scalar(ScalarKind::UInt64), Value::UInt(v)) => writer.write_varint(*v),
            (FieldType::Scalar(ScalarKind::Fixed32), Value::UInt(v)) => {
                let v = u32::try_from(*v).map_err(|_| value_mismatch(def, field, "fixed32"))?;
                writer.write_fixed32(v)
            }
            (FieldType::Scalar(ScalarKind::Fixed64), Value::UInt(v)) => writer.write_fixed64(*v),
            (FieldType::Scalar(ScalarKind::String), Value::String(s)) => {
                writer.write_length_delimited(s.as_bytes())
            }
            (FieldType::Scalar(ScalarKind::Bytes), Value::Bytes(b)) => {
                writer.write_length_delimited(b)
            }
            (FieldType::Message(name), Value::Message(nested)) => {
                let nested_def = self.registry.message(name)?;
                let payload = self.encode_message(nested_def, nested)?;
                writer.write_length_delimited(&payload)
            }
            (FieldType::Enum(name), Value::Enum(constant)) => {
                let enum_def = self.registry.enumeration(name)?;
                let code = enum_def
                    .code_of(constant)
                    .ok_or_else(|| SchemaError::UnknownEnumName {
                        enum_name: name.clone(),
                        name: constant.clone(),
                    })?;
                writer.write_varint(code)
            }
            (field_type, _) => return Err(value_mismatch(def, field, field_type.kind_name())),
        }
        Ok(())
    }
}

fn read_packed_item(reader: &mut WireReader, wire_type: WireType) -> CodecResult<WireValue> {
    let value = match wire_type {
        WireType::Varint => WireValue::Varint(reader.read_varint()?),
        WireType::Fixed32 => WireValue::Fixed32(reader.read_fixed32()?),
        WireType::Fixed64 => WireValue::Fixed64(reader.read_fixed64()?),
        WireType::LengthDelimited => WireValue::Bytes(reader.read_length_delimited()?),
    };
    Ok(value)
}

fn missing_required(def: &MessageDef, field: &FieldDef) -> SchemaError {
    SchemaError::MissingRequiredField {
        message: def.name().to_string(),
        field: field.name.clone(),
    }
}

fn value_mismatch(def: &MessageDef, field: &FieldDef, expected: &'static str) -> CodecError {
    SchemaError::ValueTypeMismatch {
        message: def.name().to_string(),
        field: field.name.clone(),
        expected,
    }
    .into()
}
