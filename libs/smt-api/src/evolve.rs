//! Schema evolution by edit list.
//!
//! A derived schema is never built field by field; it is the result of
//! [`evolve`] over the input schema and a list of [`Edit`]s. Identity
//! metadata is carried over verbatim.

use std::collections::HashSet;

use crate::error::PluginError;
use crate::schema::{Field, FieldType, Schema};

/// One step of a field-edit plan.
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    /// Keep the field unchanged. Same as not mentioning it.
    Keep(String),
    /// Remove the field.
    Drop(String),
    /// Rename in place, optionally changing the type.
    Rename {
        from: String,
        to: String,
        field_type: Option<FieldType>,
    },
    /// Change a field's type in place.
    Retype { name: String, field_type: FieldType },
    /// Add a field after all original fields.
    Append(Field),
}

impl Edit {
    /// Append a non-optional field.
    pub fn append(name: impl Into<String>, field_type: FieldType) -> Self {
        Edit::Append(Field::required(name, field_type))
    }

    fn target(&self) -> Option<&str> {
        match self {
            Edit::Keep(name) | Edit::Drop(name) => Some(name),
            Edit::Rename { from, .. } => Some(from),
            Edit::Retype { name, .. } => Some(name),
            Edit::Append(_) => None,
        }
    }
}

/// Apply `edits` to `schema`.
///
/// Original fields are visited in order and the edit naming each one is
/// applied (no edit = keep); appends follow in edit order.
///
/// Fails with a schema error when an edit names a field the schema does not
/// have, when two edits name the same field, or when the result would
/// contain a duplicate field name.
pub fn evolve(schema: &Schema, edits: &[Edit]) -> Result<Schema, PluginError> {
    let mut targeted = HashSet::new();
    for edit in edits {
        let Some(name) = edit.target() else { continue };
        if schema.field(name).is_none() {
            return Err(PluginError::schema(format!(
                "edit refers to unknown field '{name}'"
            )));
        }
        if !targeted.insert(name) {
            return Err(PluginError::schema(format!(
                "conflicting edits for field '{name}'"
            )));
        }
    }

    let mut fields = Vec::with_capacity(schema.fields.len() + edits.len());
    for field in &schema.fields {
        let edit = edits.iter().find(|e| e.target() == Some(field.name.as_str()));
        match edit {
            None | Some(Edit::Keep(_)) | Some(Edit::Append(_)) => fields.push(field.clone()),
            Some(Edit::Drop(_)) => {}
            Some(Edit::Rename { to, field_type, .. }) => fields.push(Field {
                name: to.clone(),
                field_type: field_type.clone().unwrap_or_else(|| field.field_type.clone()),
                optional: field.optional,
            }),
            Some(Edit::Retype { field_type, .. }) => fields.push(Field {
                name: field.name.clone(),
                field_type: field_type.clone(),
                optional: field.optional,
            }),
        }
    }
    for edit in edits {
        if let Edit::Append(field) = edit {
            fields.push(field.clone());
        }
    }

    let mut seen = HashSet::with_capacity(fields.len());
    for field in &fields {
        if !seen.insert(field.name.as_str()) {
            return Err(PluginError::schema(format!(
                "duplicate field '{}' in derived schema",
                field.name
            )));
        }
    }

    Ok(schema.with_fields(fields))
}
