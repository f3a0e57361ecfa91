//! Typed argument values and argument records

use super::block::Reference;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Abstract type of a field, as declared by the target schema.
///
/// Override rules dispatch on this tag. Two fields sharing a name but
/// declaring different types are never confused with each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Bool,
    Int,
    String,
    /// Credential material (tokens, passwords)
    Secret,
    Duration,
    StringList,
    StringMap,
    /// Ordered sequence of discovered targets
    Targets,
    /// Relabel rule set
    RelabelRules,
    /// Receivers that log entries are forwarded to
    LogsReceivers,
    /// Nested record, or a sequence of nested records
    Block,
    /// Free-form value carried through untouched
    Any,
}

/// A single argument value.
///
/// A value is either a literal, a nested structure of literals, or a
/// [`Reference`] that the executing engine resolves later.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    #[serde(serialize_with = "serialize_duration")]
    Duration(Duration),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Record(Arguments),
    Reference(Reference),
}

impl Value {
    /// An empty ordered sequence
    pub fn empty_list() -> Self {
        Value::List(Vec::new())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Value::Reference(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&Reference> {
        match self {
            Value::Reference(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Arguments> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    /// A list of strings
    pub fn strings<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::List(items.into_iter().map(|s| Value::String(s.into())).collect())
    }

    /// A list of references
    pub fn references(refs: &[Reference]) -> Self {
        Value::List(refs.iter().cloned().map(Value::Reference).collect())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<Duration> for Value {
    fn from(d: Duration) -> Self {
        Value::Duration(d)
    }
}

impl From<Reference> for Value {
    fn from(r: Reference) -> Self {
        Value::Reference(r)
    }
}

impl From<Arguments> for Value {
    fn from(r: Arguments) -> Self {
        Value::Record(r)
    }
}

/// Render a duration the way pipeline configs spell them (`5s`, `1m`, `2h`).
pub fn format_duration(d: &Duration) -> String {
    let millis = d.as_millis();
    if millis % 1000 != 0 {
        return format!("{}ms", millis);
    }
    let secs = d.as_secs();
    if secs == 0 {
        "0s".to_string()
    } else if secs % 3600 == 0 {
        format!("{}h", secs / 3600)
    } else if secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else {
        format!("{}s", secs)
    }
}

fn serialize_duration<S: Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_duration(d))
}

/// A named, typed field of an argument record
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    /// Declared abstract type (what override rules match on)
    pub ty: FieldType,
    pub value: Value,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: FieldType, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            ty,
            value: value.into(),
        }
    }
}

/// An argument record: an ordered set of typed fields.
///
/// Field order is the schema's declaration order and is kept on
/// serialization. `Null` fields are omitted when serialized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    fields: Vec<Field>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field
    pub fn with(mut self, name: impl Into<String>, ty: FieldType, value: impl Into<Value>) -> Self {
        self.push(Field::new(name, ty, value));
        self
    }

    /// Append a field only when a value is present
    pub fn with_opt<V: Into<Value>>(self, name: &str, ty: FieldType, value: Option<V>) -> Self {
        match value {
            Some(v) => self.with(name, ty, v),
            None => self,
        }
    }

    /// Append a field, replacing any existing field of the same name
    pub fn push(&mut self, field: Field) {
        match self.fields.iter_mut().find(|f| f.name == field.name) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.field(name).map(|f| &f.value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    pub fn into_fields(self) -> Vec<Field> {
        self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<Field> for Arguments {
    fn from_iter<T: IntoIterator<Item = Field>>(iter: T) -> Self {
        let mut args = Arguments::new();
        for field in iter {
            args.push(field);
        }
        args
    }
}

impl Serialize for Arguments {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let present: Vec<&Field> = self.fields.iter().filter(|f| !f.value.is_null()).collect();
        let mut map = serializer.serialize_map(Some(present.len()))?;
        for field in present {
            map.serialize_entry(&field.name, &field.value)?;
        }
        map.end()
    }
}
