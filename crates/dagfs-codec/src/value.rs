//! Structured values produced and consumed by [`MessageCodec`](crate::MessageCodec).

use std::collections::BTreeMap;

use bytes::Bytes;

/// A decoded field value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Bool(bool),
    /// Any unsigned integer kind (`uint32`, `uint64`, `fixed32`, `fixed64`).
    UInt(u64),
    String(String),
    Bytes(Bytes),
    /// Symbolic name of an enum constant.
    Enum(String),
    Message(Record),
    /// Values of a `repeated` field, in wire-arrival order.
    List(Vec<Value>),
}

impl Value {
    /// Short name of the variant, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::UInt(_) => "uint",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Enum(_) => "enum",
            Self::Message(_) => "message",
            Self::List(_) => "list",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_uint(&self) -> Option<u64> {
        match self {
            Self::UInt(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&str> {
        match self {
            Self::Enum(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_message(&self) -> Option<&Record> {
        match self {
            Self::Message(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::UInt(u64::from(v))
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::UInt(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<Bytes> for Value {
    fn from(v: Bytes) -> Self {
        Self::Bytes(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(v))
    }
}

impl From<Record> for Value {
    fn from(v: Record) -> Self {
        Self::Message(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::List(v)
    }
}

/// A decoded message: field name to value.
///
/// Absent optional fields are simply missing from the map. Repeated fields
/// hold a [`Value::List`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Set a field, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(name.into(), value.into())
    }

    /// Append to a repeated field, creating the list on first use.
    pub fn push(&mut self, name: &str, value: Value) {
        match self.fields.get_mut(name) {
            Some(Value::List(items)) => items.push(value),
            _ => {
                self.fields.insert(name.to_string(), Value::List(vec![value]));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn get_uint(&self, name: &str) -> Option<u64> {
        self.get(name).and_then(Value::as_uint)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn get_bytes(&self, name: &str) -> Option<&Bytes> {
        self.get(name).and_then(Value::as_bytes)
    }

    pub fn get_enum(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_enum)
    }

    pub fn get_message(&self, name: &str) -> Option<&Record> {
        self.get(name).and_then(Value::as_message)
    }

    /// Items of a repeated field; empty when the field is absent.
    pub fn get_list(&self, name: &str) -> &[Value] {
        self.get(name).and_then(Value::as_list).unwrap_or(&[])
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_creates_and_appends() {
        let mut r = Record::new();
        r.push("sizes", Value::UInt(1));
        r.push("sizes", Value::UInt(2));
        assert_eq!(r.get_list("sizes"), &[Value::UInt(1), Value::UInt(2)]);
    }

    #[test]
    fn absent_list_is_empty() {
        let r = Record::new();
        assert!(r.get_list("missing").is_empty());
    }

    #[test]
    fn typed_getters() {
        let r = Record::new()
            .with("n", 7u64)
            .with("s", "text")
            .with("b", vec![1u8, 2])
            .with("e", Value::Enum("File".into()))
            .with("m", Record::new().with("x", 1u32));
        assert_eq!(r.get_uint("n"), Some(7));
        assert_eq!(r.get_str("s"), Some("text"));
        assert_eq!(r.get_bytes("b").map(|b| b.as_ref()), Some(&[1u8, 2][..]));
        assert_eq!(r.get_enum("e"), Some("File"));
        assert_eq!(r.get_message("m").and_then(|m| m.get_uint("x")), Some(1));
        // Wrong kind yields None rather than a panic.
        assert_eq!(r.get_uint("s"), None);
    }

    #[test]
    fn insert_replaces() {
        let mut r = Record::new();
        assert!(r.insert("x", 1u32).is_none());
        assert_eq!(r.insert("x", 2u32), Some(Value::UInt(1)));
        assert_eq!(r.len(), 1);
    }
}
