//! Message and enum schemas.
//!
//! Definitions are assembled with owned builders ([`MessageBuilder`],
//! [`EnumBuilder`]) and finalized by [`SchemaBuilder::build`], which resolves
//! every field's type name to a [`FieldType`] once. A built
//! [`SchemaRegistry`] is immutable.
//!
//! ```text
//! let registry = SchemaRegistry::builder()
//!     .message(
//!         SchemaRegistry::define_message("Point")
//!             .field(Label::Required, "uint32", "x", 1)?
//!             .field(Label::Required, "uint32", "y", 2)?,
//!     )?
//!     .build()?;
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::error::{SchemaError, SchemaResult};
use crate::filter::FieldFilter;
use crate::wire::{WireType, MAX_FIELD_NUMBER};

/// Field cardinality.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Label {
    Required,
    Optional,
    Repeated,
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => write!(f, "required"),
            Self::Optional => write!(f, "optional"),
            Self::Repeated => write!(f, "repeated"),
        }
    }
}

/// Built-in scalar types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    UInt32,
    UInt64,
    Fixed32,
    Fixed64,
    String,
    Bytes,
}

impl ScalarKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "bool" => Some(Self::Bool),
            "uint32" => Some(Self::UInt32),
            "uint64" => Some(Self::UInt64),
            "fixed32" => Some(Self::Fixed32),
            "fixed64" => Some(Self::Fixed64),
            "string" => Some(Self::String),
            "bytes" => Some(Self::Bytes),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::UInt32 => "uint32",
            Self::UInt64 => "uint64",
            Self::Fixed32 => "fixed32",
            Self::Fixed64 => "fixed64",
            Self::String => "string",
            Self::Bytes => "bytes",
        }
    }

    pub fn wire_type(&self) -> WireType {
        match self {
            Self::Bool | Self::UInt32 | Self::UInt64 => WireType::Varint,
            Self::Fixed32 => WireType::Fixed32,
            Self::Fixed64 => WireType::Fixed64,
            Self::String | Self::Bytes => WireType::LengthDelimited,
        }
    }

    /// Numeric kinds may arrive packed into one length-delimited record.
    pub fn is_packable(&self) -> bool {
        !matches!(self, Self::String | Self::Bytes)
    }
}

/// A field's type, resolved against the registry at build time.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FieldType {
    Scalar(ScalarKind),
    Message(String),
    Enum(String),
}

impl FieldType {
    pub fn wire_type(&self) -> WireType {
        match self {
            Self::Scalar(kind) => kind.wire_type(),
            Self::Message(_) => WireType::LengthDelimited,
            Self::Enum(_) => WireType::Varint,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Scalar(kind) => kind.name(),
            Self::Message(name) | Self::Enum(name) => name,
        }
    }

    /// Static description of the expected value kind.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Scalar(kind) => kind.name(),
            Self::Message(_) => "message",
            Self::Enum(_) => "enum",
        }
    }

    pub fn is_packable(&self) -> bool {
        match self {
            Self::Scalar(kind) => kind.is_packable(),
            Self::Enum(_) => true,
            Self::Message(_) => false,
        }
    }
}

/// One field of a message.
#[derive(Clone, Debug)]
pub struct FieldDef {
    pub label: Label,
    pub field_type: FieldType,
    pub name: String,
    pub number: u32,
    pub filter: Option<Arc<dyn FieldFilter>>,
}

/// A finalized message definition.
#[derive(Clone, Debug)]
pub struct MessageDef {
    name: String,
    fields: Vec<FieldDef>,
    by_name: HashMap<String, usize>,
    by_number: HashMap<u32, usize>,
}

impl MessageDef {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn field_by_name(&self, name: &str) -> Option<&FieldDef> {
        self.by_name.get(name).map(|&i| &self.fields[i])
    }

    pub fn field_by_number(&self, number: u32) -> Option<&FieldDef> {
        self.by_number.get(&number).map(|&i| &self.fields[i])
    }
}

impl fmt::Display for MessageDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "message {} {{", self.name)?;
        for field in &self.fields {
            writeln!(
                f,
                "  {} {} {} = {};",
                field.label,
                field.field_type.name(),
                field.name,
                field.number
            )?;
        }
        write!(f, "}}")
    }
}

/// A finalized enum definition.
#[derive(Clone, Debug)]
pub struct EnumDef {
    name: String,
    values: Vec<(String, u64)>,
    by_name: HashMap<String, u64>,
    by_code: HashMap<u64, String>,
}

impl EnumDef {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `(name, code)` pairs in declaration order.
    pub fn values(&self) -> &[(String, u64)] {
        &self.values
    }

    pub fn code_of(&self, name: &str) -> Option<u64> {
        self.by_name.get(name).copied()
    }

    pub fn name_of(&self, code: u64) -> Option<&str> {
        self.by_code.get(&code).map(String::as_str)
    }
}

impl fmt::Display for EnumDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "enum {} {{", self.name)?;
        for (name, code) in &self.values {
            writeln!(f, "  {name} = {code};")?;
        }
        write!(f, "}}")
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
struct PendingField {
    label: Label,
    type_name: String,
    name: String,
    number: u32,
    filter: Option<Arc<dyn FieldFilter>>,
}

/// Accumulates fields for one message. Field types stay unresolved names
/// until the owning [`SchemaBuilder`] is built.
#[derive(Clone, Debug)]
pub struct MessageBuilder {
    name: String,
    fields: Vec<PendingField>,
}

impl MessageBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field(
        self,
        label: Label,
        type_name: &str,
        name: &str,
        number: u32,
    ) -> SchemaResult<Self> {
        self.push_field(label, type_name, name, number, None)
    }

    /// Add a field whose values pass through `filter` on encode and decode.
    pub fn filtered_field(
        self,
        label: Label,
        type_name: &str,
        name: &str,
        number: u32,
        filter: Arc<dyn FieldFilter>,
    ) -> SchemaResult<Self> {
        self.push_field(label, type_name, name, number, Some(filter))
    }

    fn push_field(
        mut self,
        label: Label,
        type_name: &str,
        name: &str,
        number: u32,
        filter: Option<Arc<dyn FieldFilter>>,
    ) -> SchemaResult<Self> {
        if number == 0 || number > MAX_FIELD_NUMBER {
            return Err(SchemaError::InvalidFieldNumber {
                message: self.name,
                field: name.to_string(),
                number,
            });
        }
        if self.fields.iter().any(|f| f.name == name) {
            return Err(SchemaError::DuplicateDefinition {
                kind: "field name",
                scope: self.name,
                name: name.to_string(),
            });
        }
        if self.fields.iter().any(|f| f.number == number) {
            return Err(SchemaError::DuplicateDefinition {
                kind: "field number",
                scope: self.name,
                name: number.to_string(),
            });
        }
        self.fields.push(PendingField {
            label,
            type_name: type_name.to_string(),
            name: name.to_string(),
            number,
            filter,
        });
        Ok(self)
    }

    fn resolve(self, messages: &HashSet<String>, enums: &HashSet<String>) -> SchemaResult<MessageDef> {
        let mut fields = Vec::with_capacity(self.fields.len());
        let mut by_name = HashMap::new();
        let mut by_number = HashMap::new();
        for (i, pending) in self.fields.into_iter().enumerate() {
            let field_type = if let Some(kind) = ScalarKind::from_name(&pending.type_name) {
                FieldType::Scalar(kind)
            } else if messages.contains(&pending.type_name) {
                FieldType::Message(pending.type_name)
            } else if enums.contains(&pending.type_name) {
                FieldType::Enum(pending.type_name)
            } else {
                return Err(SchemaError::UnknownFieldType {
                    message: self.name,
                    field: pending.name,
                    type_name: pending.type_name,
                });
            };
            by_name.insert(pending.name.clone(), i);
            by_number.insert(pending.number, i);
            fields.push(FieldDef {
                label: pending.label,
                field_type,
                name: pending.name,
                number: pending.number,
                filter: pending.filter,
            });
        }
        Ok(MessageDef {
            name: self.name,
            fields,
            by_name,
            by_number,
        })
    }
}

/// Accumulates constants for one enum.
#[derive(Clone, Debug)]
pub struct EnumBuilder {
    name: String,
    values: Vec<(String, u64)>,
}

impl EnumBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(mut self, name: &str, code: u64) -> SchemaResult<Self> {
        if self.values.iter().any(|(n, _)| n == name) {
            return Err(SchemaError::DuplicateDefinition {
                kind: "enum constant",
                scope: self.name,
                name: name.to_string(),
            });
        }
        if self.values.iter().any(|(_, c)| *c == code) {
            return Err(SchemaError::DuplicateDefinition {
                kind: "enum code",
                scope: self.name,
                name: code.to_string(),
            });
        }
        self.values.push((name.to_string(), code));
        Ok(self)
    }

    fn finish(self) -> EnumDef {
        let by_name = self.values.iter().cloned().collect();
        let by_code = self.values.iter().map(|(n, c)| (*c, n.clone())).collect();
        EnumDef {
            name: self.name,
            values: self.values,
            by_name,
            by_code,
        }
    }
}

/// Collects message and enum builders and resolves them into a registry.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    messages: Vec<MessageBuilder>,
    enums: Vec<EnumBuilder>,
}

impl SchemaBuilder {
    pub fn message(mut self, message: MessageBuilder) -> SchemaResult<Self> {
        self.check_unique(message.name())?;
        self.messages.push(message);
        Ok(self)
    }

    pub fn enumeration(mut self, definition: EnumBuilder) -> SchemaResult<Self> {
        self.check_unique(definition.name())?;
        self.enums.push(definition);
        Ok(self)
    }

    fn check_unique(&self, name: &str) -> SchemaResult<()> {
        let taken = self.messages.iter().any(|m| m.name() == name)
            || self.enums.iter().any(|e| e.name() == name);
        if taken {
            return Err(SchemaError::DuplicateDefinition {
                kind: "type",
                scope: "schema".into(),
                name: name.to_string(),
            });
        }
        Ok(())
    }

    /// Resolve every field type and freeze the registry.
    pub fn build(self) -> SchemaResult<SchemaRegistry> {
        let message_names: HashSet<String> =
            self.messages.iter().map(|m| m.name().to_string()).collect();
        let enum_names: HashSet<String> = self.enums.iter().map(|e| e.name().to_string()).collect();

        let mut messages = HashMap::new();
        for builder in self.messages {
            let def = builder.resolve(&message_names, &enum_names)?;
            messages.insert(def.name.clone(), Arc::new(def));
        }
        let enums = self
            .enums
            .into_iter()
            .map(|builder| {
                let def = builder.finish();
                (def.name.clone(), Arc::new(def))
            })
            .collect();
        Ok(SchemaRegistry { messages, enums })
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// An immutable set of resolved message and enum definitions.
#[derive(Clone, Debug, Default)]
pub struct SchemaRegistry {
    messages: HashMap<String, Arc<MessageDef>>,
    enums: HashMap<String, Arc<EnumDef>>,
}

impl SchemaRegistry {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    pub fn define_message(name: impl Into<String>) -> MessageBuilder {
        MessageBuilder::new(name)
    }

    pub fn define_enum(name: impl Into<String>) -> EnumBuilder {
        EnumBuilder::new(name)
    }

    pub fn message(&self, name: &str) -> SchemaResult<&MessageDef> {
        self.messages
            .get(name)
            .map(Arc::as_ref)
            .ok_or_else(|| SchemaError::UnknownMessage(name.to_string()))
    }

    pub fn enumeration(&self, name: &str) -> SchemaResult<&EnumDef> {
        self.enums
            .get(name)
            .map(Arc::as_ref)
            .ok_or_else(|| SchemaError::UnknownEnum(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.messages.contains_key(name) || self.enums.contains_key(name)
    }

    /// Sorted names of all message definitions.
    pub fn message_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.messages.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Union of two registries. A type name present in both is an error.
    pub fn merge(&self, other: &SchemaRegistry) -> SchemaResult<SchemaRegistry> {
        let mut merged = self.clone();
        for (name, def) in &other.messages {
            if merged.contains(name) {
                return Err(duplicate_type(name));
            }
            merged.messages.insert(name.clone(), Arc::clone(def));
        }
        for (name, def) in &other.enums {
            if merged.contains(name) {
                return Err(duplicate_type(name));
            }
            merged.enums.insert(name.clone(), Arc::clone(def));
        }
        Ok(merged)
    }
}

fn duplicate_type(name: &str) -> SchemaError {
    SchemaError::DuplicateDefinition {
        kind: "type",
        scope: "merged schema".into(),
        name: name.to_string(),
    }
}
