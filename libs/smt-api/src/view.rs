use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::PluginError;
use crate::schema::{FieldType, Schema};
use crate::value::{Struct, Value};

/// One `(name, value, type?)` entry of a payload projection.
///
/// `field_type` is known on the schema path and `None` for schemaless payloads.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedField {
    pub name: String,
    pub value: Value,
    pub field_type: Option<FieldType>,
}

/// Ordered projection of a payload's fields. Every mutation is written
/// against this type, never against `Map` or `Struct` directly.
///
/// Field names are unique: `push` refuses a name that is already present.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OrderedFields {
    fields: Vec<OrderedField>,
}

impl OrderedFields {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OrderedField> {
        self.fields.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&OrderedField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.get(name).map(|f| &f.value)
    }

    /// Remove a field, keeping the order of the rest.
    pub fn remove(&mut self, name: &str) -> Option<OrderedField> {
        let index = self.fields.iter().position(|f| f.name == name)?;
        Some(self.fields.remove(index))
    }

    /// Append a field at the end.
    pub fn push(
        &mut self,
        name: impl Into<String>,
        value: Value,
        field_type: Option<FieldType>,
    ) -> Result<(), PluginError> {
        let name = name.into();
        if self.contains(&name) {
            return Err(PluginError::schema(format!("duplicate field '{name}'")));
        }
        self.fields.push(OrderedField {
            name,
            value,
            field_type,
        });
        Ok(())
    }

    /// Replace a field's value (and type) in place.
    pub fn replace(
        &mut self,
        name: &str,
        value: Value,
        field_type: Option<FieldType>,
    ) -> Result<(), PluginError> {
        let field = self
            .fields
            .iter_mut()
            .find(|f| f.name == name)
            .ok_or_else(|| PluginError::schema(format!("no field named '{name}'")))?;
        field.value = value;
        field.field_type = field_type;
        Ok(())
    }

    /// Write the fields back as a payload.
    ///
    /// - `None` → schemaless `Value::Map`.
    /// - `Some(schema)` → `Value::Struct`; field names must match the schema
    ///   exactly and every value must satisfy its field.
    pub fn write(self, target: Option<&Arc<Schema>>) -> Result<Value, PluginError> {
        let Some(schema) = target else {
            let map: BTreeMap<String, Value> =
                self.fields.into_iter().map(|f| (f.name, f.value)).collect();
            return Ok(Value::Map(map));
        };

        if self.fields.len() != schema.fields.len() {
            let missing: Vec<&str> = schema
                .fields
                .iter()
                .map(|f| f.name.as_str())
                .filter(|name| !self.contains(name))
                .collect();
            return Err(PluginError::schema(format!(
                "{} field(s) written against a {}-field schema, missing: [{}]",
                self.fields.len(),
                schema.fields.len(),
                missing.join(", ")
            )));
        }

        let mut out = Struct::new(schema.clone());
        for field in self.fields {
            out.put(&field.name, field.value)?;
        }
        Ok(Value::Struct(out))
    }
}

impl FromIterator<OrderedField> for OrderedFields {
    fn from_iter<I: IntoIterator<Item = OrderedField>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// A payload seen through its representation.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordView {
    Schemaless(OrderedFields),
    Structured {
        fields: OrderedFields,
        schema: Arc<Schema>,
    },
}

impl RecordView {
    /// Project a payload. `purpose` names the caller in error messages.
    ///
    /// A schema demands a `Struct`; no schema demands a `Map`.
    pub fn read(
        payload: &Value,
        schema: Option<&Arc<Schema>>,
        purpose: &str,
    ) -> Result<Self, PluginError> {
        match (payload, schema) {
            (Value::Map(map), None) => Ok(RecordView::Schemaless(
                map.iter()
                    .map(|(name, value)| OrderedField {
                        name: name.clone(),
                        value: value.clone(),
                        field_type: None,
                    })
                    .collect(),
            )),
            (Value::Struct(s), Some(schema)) => Ok(RecordView::Structured {
                fields: s
                    .iter()
                    .map(|(field, value)| OrderedField {
                        name: field.name.clone(),
                        value: value.clone(),
                        field_type: Some(field.field_type.clone()),
                    })
                    .collect(),
                schema: schema.clone(),
            }),
            (other, None) => Err(PluginError::type_mismatch(format!(
                "only map objects supported in absence of schema for [{purpose}], found: {}",
                other.type_name()
            ))),
            (other, Some(_)) => Err(PluginError::type_mismatch(format!(
                "only struct objects supported for [{purpose}], found: {}",
                other.type_name()
            ))),
        }
    }

    pub fn fields(&self) -> &OrderedFields {
        match self {
            RecordView::Schemaless(fields) => fields,
            RecordView::Structured { fields, .. } => fields,
        }
    }

    pub fn schema(&self) -> Option<&Arc<Schema>> {
        match self {
            RecordView::Schemaless(_) => None,
            RecordView::Structured { schema, .. } => Some(schema),
        }
    }

    pub fn into_parts(self) -> (OrderedFields, Option<Arc<Schema>>) {
        match self {
            RecordView::Schemaless(fields) => (fields, None),
            RecordView::Structured { fields, schema } => (fields, Some(schema)),
        }
    }
}
