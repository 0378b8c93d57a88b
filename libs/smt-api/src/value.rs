use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::PluginError;
use crate::schema::{Field, FieldType, ScalarType, Schema};

/// Canonical payload value.
///
/// - Schemaless payloads are `Map` (keyed by field name, iterated in name order).
/// - Schema-carrying payloads are `Struct`, bound to their schema.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Float64(f64),
    String(String),
    /// Opaque binary data.
    Bytes(Vec<u8>),
    Array(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Struct(Struct),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Short type label for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int32(_) => "int32",
            Value::Int64(_) => "int64",
            Value::Float64(_) => "float64",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Struct(_) => "struct",
        }
    }

    /// Whether this value can be stored in a field of type `ty`.
    ///
    /// `Null` conforms to every type; nullability is the field's business.
    pub fn conforms(&self, ty: &FieldType) -> bool {
        match (self, ty) {
            (Value::Null, _) => true,
            (Value::Bool(_), FieldType::Scalar(ScalarType::Bool))
            | (Value::Int32(_), FieldType::Scalar(ScalarType::Int32))
            | (Value::Int64(_), FieldType::Scalar(ScalarType::Int64))
            | (Value::Float64(_), FieldType::Scalar(ScalarType::Float64))
            | (Value::String(_), FieldType::Scalar(ScalarType::String))
            | (Value::Bytes(_), FieldType::Scalar(ScalarType::Bytes)) => true,
            (Value::Array(items), FieldType::Array(element)) => {
                items.iter().all(|item| item.conforms(element))
            }
            (Value::Struct(s), FieldType::Struct(schema)) => s.schema.as_ref() == schema.as_ref(),
            _ => false,
        }
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

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<Struct> for Value {
    fn from(s: Struct) -> Self {
        Value::Struct(s)
    }
}

/// String form used for digests and logs.
///
/// Strings are written raw, bytes as lowercase hex, containers in a
/// `name=value` notation.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int32(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::Float64(v) => write!(f, "{v}"),
            Value::String(s) => f.write_str(s),
            Value::Bytes(b) => f.write_str(&hex::encode(b)),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Map(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}={v}")?;
                }
                f.write_str("}")
            }
            Value::Struct(s) => write!(f, "{s}"),
        }
    }
}

/// Ordered value container whose field set is exactly its schema's field set.
///
/// `put` is the only way in, and it checks the name, the type and nullability,
/// so a `Struct` never holds a value its schema would reject.
#[derive(Debug, Clone, PartialEq)]
pub struct Struct {
    schema: Arc<Schema>,
    values: Vec<Value>,
}

impl Struct {
    /// Empty struct: every field starts as `Null`.
    pub fn new(schema: Arc<Schema>) -> Self {
        let values = vec![Value::Null; schema.fields.len()];
        Self { schema, values }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn put(&mut self, name: &str, value: Value) -> Result<(), PluginError> {
        let index = self.schema.index_of(name).ok_or_else(|| {
            PluginError::schema(format!("'{name}' is not a valid field name"))
        })?;
        check_field(&self.schema.fields[index], &value)?;
        self.values[index] = value;
        Ok(())
    }

    /// Builder-style `put`.
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Result<Self, PluginError> {
        self.put(name, value.into())?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.schema.index_of(name).map(|i| &self.values[i])
    }

    /// Fields paired with their values, in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&Field, &Value)> {
        self.schema.fields.iter().zip(self.values.iter())
    }

    /// Check every non-optional field has been set.
    pub fn validate(&self) -> Result<(), PluginError> {
        for (field, value) in self.iter() {
            if value.is_null() && !field.optional {
                return Err(PluginError::schema(format!(
                    "missing value for required field '{}'",
                    field.name
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Display for Struct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Struct{")?;
        for (i, (field, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}={value}", field.name)?;
        }
        f.write_str("}")
    }
}

fn check_field(field: &Field, value: &Value) -> Result<(), PluginError> {
    if value.is_null() {
        if field.optional {
            return Ok(());
        }
        return Err(PluginError::schema(format!(
            "field '{}' is not optional",
            field.name
        )));
    }
    if !value.conforms(&field.field_type) {
        return Err(PluginError::schema(format!(
            "field '{}' expects {}, got {}",
            field.name,
            field.field_type,
            value.type_name()
        )));
    }
    Ok(())
}
