use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Scalar types a field can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarType {
    Bool,
    Int32,
    Int64,
    Float64,
    String,
    Bytes,
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarType::Bool => write!(f, "bool"),
            ScalarType::Int32 => write!(f, "int32"),
            ScalarType::Int64 => write!(f, "int64"),
            ScalarType::Float64 => write!(f, "float64"),
            ScalarType::String => write!(f, "string"),
            ScalarType::Bytes => write!(f, "bytes"),
        }
    }
}

/// Field type: scalar, nested struct, or array of any field type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Scalar(ScalarType),
    Struct(Box<Schema>),
    Array(Box<FieldType>),
}

impl FieldType {
    pub fn string() -> Self {
        FieldType::Scalar(ScalarType::String)
    }

    pub fn array_of(element: FieldType) -> Self {
        FieldType::Array(Box::new(element))
    }

    pub fn struct_of(schema: Schema) -> Self {
        FieldType::Struct(Box::new(schema))
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Scalar(s) => write!(f, "{s}"),
            FieldType::Struct(s) => match &s.name {
                Some(name) => write!(f, "struct<{name}>"),
                None => write!(f, "struct"),
            },
            FieldType::Array(e) => write!(f, "array<{e}>"),
        }
    }
}

/// A single field in a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
    /// Whether the field may hold `Value::Null`.
    #[serde(default)]
    pub optional: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType, optional: bool) -> Self {
        Self {
            name: name.into(),
            field_type,
            optional,
        }
    }

    /// Shortcut: non-optional field.
    pub fn required(name: impl Into<String>, field_type: FieldType) -> Self {
        Self::new(name, field_type, false)
    }

    /// Shortcut: non-optional scalar field.
    pub fn scalar(name: impl Into<String>, scalar: ScalarType) -> Self {
        Self::new(name, FieldType::Scalar(scalar), false)
    }

    /// Shortcut: optional scalar field.
    pub fn scalar_optional(name: impl Into<String>, scalar: ScalarType) -> Self {
        Self::new(name, FieldType::Scalar(scalar), true)
    }
}

/// Struct schema: an ordered field list plus identity metadata.
///
/// Field position in `fields` is the position of the value inside a
/// [`Struct`](crate::value::Struct). Identity metadata (`name`, `version`,
/// `doc`, `parameters`) is copied verbatim by every derived schema.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, String>,
    pub fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self {
            fields,
            ..Self::default()
        }
    }

    pub fn named(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            name: Some(name.into()),
            fields,
            ..Self::default()
        }
    }

    pub fn with_version(mut self, version: i32) -> Self {
        self.version = Some(version);
        self
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Copy identity metadata into a schema with a new field list.
    pub fn with_fields(&self, fields: Vec<Field>) -> Self {
        Self {
            name: self.name.clone(),
            version: self.version,
            doc: self.doc.clone(),
            parameters: self.parameters.clone(),
            fields,
        }
    }

    /// Identity metadata equality, ignoring fields.
    pub fn same_identity(&self, other: &Schema) -> bool {
        self.name == other.name
            && self.version == other.version
            && self.doc == other.doc
            && self.parameters == other.parameters
    }
}
