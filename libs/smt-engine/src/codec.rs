//! JSON-lines record envelope.
//!
//! A payload with a schema is decoded into a `Struct` guided by that schema;
//! a payload without one becomes a dynamic value (objects become maps).

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use smt_api::record::Record;
use smt_api::schema::{FieldType, ScalarType, Schema};
use smt_api::value::{Struct, Value};

use crate::error::EngineError;

/// Wire shape of one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordEnvelope {
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub key: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_schema: Option<Schema>,
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_schema: Option<Schema>,
}

impl RecordEnvelope {
    pub fn into_record(self) -> Result<Record, EngineError> {
        let key_schema = self.key_schema.map(Arc::new);
        let value_schema = self.value_schema.map(Arc::new);
        let key = decode_payload(self.key, key_schema.as_ref()).map_err(|e| e.with_context("key"))?;
        let value =
            decode_payload(self.value, value_schema.as_ref()).map_err(|e| e.with_context("value"))?;
        Ok(Record {
            topic: self.topic,
            partition: self.partition,
            timestamp: self.timestamp,
            key,
            key_schema,
            value,
            value_schema,
        })
    }

    pub fn from_record(record: &Record) -> Self {
        Self {
            topic: record.topic.clone(),
            partition: record.partition,
            timestamp: record.timestamp,
            key: record.key.as_ref().map_or(serde_json::Value::Null, to_json),
            key_schema: record.key_schema.as_deref().cloned(),
            value: record.value.as_ref().map_or(serde_json::Value::Null, to_json),
            value_schema: record.value_schema.as_deref().cloned(),
        }
    }
}

/// Parse one JSON line into a record.
pub fn decode_line(line: &str) -> Result<Record, EngineError> {
    let envelope: RecordEnvelope =
        serde_json::from_str(line).map_err(|e| EngineError::Codec(e.to_string()))?;
    envelope.into_record()
}

/// Serialize a record as one JSON line (no trailing newline).
pub fn encode_line(record: &Record) -> Result<String, EngineError> {
    serde_json::to_string(&RecordEnvelope::from_record(record))
        .map_err(|e| EngineError::Codec(e.to_string()))
}

fn decode_payload(
    json: serde_json::Value,
    schema: Option<&Arc<Schema>>,
) -> Result<Option<Value>, EngineError> {
    if json.is_null() {
        return Ok(None);
    }
    match schema {
        Some(schema) => decode_struct(&json, schema).map(|s| Some(Value::Struct(s))),
        None => Ok(Some(from_json(json))),
    }
}

/// Schemaless conversion: objects become maps, integers prefer `Int64`.
pub fn from_json(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int64(i),
            None => Value::Float64(n.as_f64().unwrap_or(f64::NAN)),
        },
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(items) => Value::Array(items.into_iter().map(from_json).collect()),
        serde_json::Value::Object(map) => Value::Map(
            map.into_iter()
                .map(|(k, v)| (k, from_json(v)))
                .collect::<BTreeMap<_, _>>(),
        ),
    }
}

fn decode_struct(json: &serde_json::Value, schema: &Arc<Schema>) -> Result<Struct, EngineError> {
    let serde_json::Value::Object(obj) = json else {
        return Err(EngineError::Codec(format!(
            "expected object for struct '{}', found {json}",
            schema.name.as_deref().unwrap_or("<anonymous>")
        )));
    };
    if let Some(unknown) = obj.keys().find(|k| schema.field(k).is_none()) {
        return Err(EngineError::Codec(format!("unknown field '{unknown}'")));
    }

    let mut out = Struct::new(schema.clone());
    for field in &schema.fields {
        let value = match obj.get(&field.name) {
            Some(v) => decode_typed(v, &field.field_type).map_err(|e| e.with_context(&field.name))?,
            None => Value::Null,
        };
        out.put(&field.name, value)
            .map_err(|e| EngineError::Codec(e.message))?;
    }
    out.validate().map_err(|e| EngineError::Codec(e.message))?;
    Ok(out)
}

fn decode_typed(json: &serde_json::Value, ty: &FieldType) -> Result<Value, EngineError> {
    if json.is_null() {
        return Ok(Value::Null);
    }
    let mismatch = || EngineError::Codec(format!("expected {ty}, found {json}"));
    match ty {
        FieldType::Scalar(scalar) => match scalar {
            ScalarType::Bool => json.as_bool().map(Value::Bool).ok_or_else(mismatch),
            ScalarType::Int32 => json
                .as_i64()
                .and_then(|i| i32::try_from(i).ok())
                .map(Value::Int32)
                .ok_or_else(mismatch),
            ScalarType::Int64 => json.as_i64().map(Value::Int64).ok_or_else(mismatch),
            ScalarType::Float64 => json.as_f64().map(Value::Float64).ok_or_else(mismatch),
            ScalarType::String => json
                .as_str()
                .map(|s| Value::String(s.to_string()))
                .ok_or_else(mismatch),
            ScalarType::Bytes => json
                .as_str()
                .and_then(|s| hex::decode(s).ok())
                .map(Value::Bytes)
                .ok_or_else(mismatch),
        },
        FieldType::Struct(schema) => {
            decode_struct(json, &Arc::new((**schema).clone())).map(Value::Struct)
        }
        FieldType::Array(element) => {
            let items = json.as_array().ok_or_else(mismatch)?;
            items
                .iter()
                .map(|item| decode_typed(item, element))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
    }
}

/// Convert a value to JSON. Structs become objects, bytes become hex strings.
pub fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int32(i) => serde_json::Value::from(*i),
        Value::Int64(i) => serde_json::Value::from(*i),
        Value::Float64(f) => serde_json::Number::from_f64(*f)
            .map_or(serde_json::Value::Null, serde_json::Value::Number),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Bytes(b) => serde_json::Value::String(hex::encode(b)),
        Value::Array(items) => serde_json::Value::Array(items.iter().map(to_json).collect()),
        Value::Map(map) => serde_json::Value::Object(
            map.iter().map(|(k, v)| (k.clone(), to_json(v))).collect(),
        ),
        Value::Struct(s) => serde_json::Value::Object(
            s.iter()
                .map(|(field, v)| (field.name.clone(), to_json(v)))
                .collect(),
        ),
    }
}
