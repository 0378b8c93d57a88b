use std::sync::Arc;

use crate::schema::Schema;
use crate::value::Value;

/// One pipeline event. Transforms never mutate a record in place; they build
/// a successor that shares the untouched side (schemas are `Arc`-shared).
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub topic: String,
    pub partition: Option<i32>,
    /// Timestamp in milliseconds.
    pub timestamp: Option<i64>,
    pub key: Option<Value>,
    pub key_schema: Option<Arc<Schema>>,
    pub value: Option<Value>,
    pub value_schema: Option<Arc<Schema>>,
}

impl Record {
    /// Record with a value payload only.
    pub fn new(topic: impl Into<String>, value: Option<Value>, value_schema: Option<Arc<Schema>>) -> Self {
        Self {
            topic: topic.into(),
            partition: None,
            timestamp: None,
            key: None,
            key_schema: None,
            value,
            value_schema,
        }
    }

    pub fn with_key(mut self, key: Option<Value>, key_schema: Option<Arc<Schema>>) -> Self {
        self.key = key;
        self.key_schema = key_schema;
        self
    }
}
