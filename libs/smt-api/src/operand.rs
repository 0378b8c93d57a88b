use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use crate::record::Record;
use crate::schema::Schema;
use crate::value::Value;

/// Which side of a record a transform instance operates on.
///
/// Chosen once at construction; the transform logic itself is side-agnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operand {
    Key,
    #[default]
    Value,
}

impl Operand {
    pub fn schema<'a>(&self, record: &'a Record) -> Option<&'a Arc<Schema>> {
        match self {
            Operand::Key => record.key_schema.as_ref(),
            Operand::Value => record.value_schema.as_ref(),
        }
    }

    pub fn payload<'a>(&self, record: &'a Record) -> Option<&'a Value> {
        match self {
            Operand::Key => record.key.as_ref(),
            Operand::Value => record.value.as_ref(),
        }
    }

    /// Successor record with this side replaced; the other side is moved over as-is.
    pub fn rebuild(&self, record: Record, schema: Option<Arc<Schema>>, payload: Value) -> Record {
        match self {
            Operand::Key => Record {
                key: Some(payload),
                key_schema: schema,
                ..record
            },
            Operand::Value => Record {
                value: Some(payload),
                value_schema: schema,
                ..record
            },
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Key => f.write_str("key"),
            Operand::Value => f.write_str("value"),
        }
    }
}
