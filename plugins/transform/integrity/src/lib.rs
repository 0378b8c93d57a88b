use sha2::{Digest, Sha256};

use smt_api::ConfigParams;
use smt_api::config::{ConfigParam, ConfigValues};
use smt_api::dispatch::{Dispatcher, FieldMutation, Path};
use smt_api::error::PluginError;
use smt_api::evolve::Edit;
use smt_api::operand::Operand;
use smt_api::schema::{FieldType, Schema};
use smt_api::transform::{Transform, TransformDescriptor};
use smt_api::value::Value;
use smt_api::view::OrderedFields;

#[derive(Debug, Default, ConfigParams)]
pub struct IntegrityConfig {
    #[param(required, importance = "high", description = "Integrity field name to add")]
    pub field: String,
}

/// Appends a SHA-256 fingerprint of the payload's field values.
///
/// Values are stringified and concatenated in field order: schema order on
/// the schema path, field-name order for schemaless maps. The digest field
/// itself is not part of the input.
#[derive(Debug, Clone)]
pub struct IntegrityCheck {
    field: String,
}

impl IntegrityCheck {
    pub fn new(field: impl Into<String>) -> Self {
        Self { field: field.into() }
    }

    pub fn field(&self) -> &str {
        &self.field
    }
}

/// Lowercase hex SHA-256 over the concatenated string forms of the values.
pub fn digest(fields: &OrderedFields) -> String {
    let mut hasher = Sha256::new();
    for field in fields.iter() {
        hasher.update(field.value.to_string().as_bytes());
    }
    hex::encode(hasher.finalize())
}

impl FieldMutation for IntegrityCheck {
    fn purpose(&self) -> &str {
        "integrity field addition"
    }

    fn edits(&self, _schema: &Schema) -> Result<Vec<Edit>, PluginError> {
        Ok(vec![Edit::append(self.field.clone(), FieldType::string())])
    }

    fn mutate(&self, fields: &mut OrderedFields, path: Path) -> Result<(), PluginError> {
        let sha = digest(fields);
        let field_type = match path {
            Path::SchemaPresent => Some(FieldType::string()),
            Path::Schemaless => None,
        };
        fields.push(self.field.clone(), Value::String(sha), field_type)
    }
}

pub fn config_params() -> Vec<ConfigParam> {
    IntegrityConfig::config_params()
}

pub fn configure(
    config: &ConfigValues,
    operand: Operand,
) -> Result<Dispatcher<IntegrityCheck>, PluginError> {
    let config = IntegrityConfig::from_config(config)?;
    if config.field.is_empty() {
        return Err(PluginError::config("parameter 'field' must not be empty"));
    }
    Ok(Dispatcher::new(operand, IntegrityCheck::new(config.field)))
}

fn create(config: &ConfigValues, operand: Operand) -> Result<Box<dyn Transform>, PluginError> {
    Ok(Box::new(configure(config, operand)?))
}

pub fn descriptor() -> TransformDescriptor {
    TransformDescriptor {
        alias: "integrity",
        description: "Append a SHA-256 digest of the field values",
        config_params,
        create,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use smt_api::error::ErrorKind;
    use smt_api::record::Record;
    use smt_api::schema::{Field, ScalarType};
    use smt_api::transform::Outcome;
    use smt_api::value::Struct;

    use super::*;

    fn config(field: &str) -> ConfigValues {
        ConfigValues::new().with("field", field)
    }

    fn schema() -> Arc<Schema> {
        Arc::new(
            Schema::named(
                "purchase",
                vec![
                    Field::scalar("id", ScalarType::Int32),
                    Field::scalar("customer", ScalarType::String),
                ],
            )
            .with_version(1),
        )
    }

    fn structured() -> Record {
        let value = Struct::new(schema())
            .with("id", 42)
            .unwrap()
            .with("customer", "ada")
            .unwrap();
        Record::new("purchases", Some(Value::Struct(value)), Some(schema()))
    }

    fn hex_sha256(input: &str) -> String {
        hex::encode(Sha256::digest(input.as_bytes()))
    }

    #[test]
    fn schema_path_appends_digest_of_values() {
        let transform = configure(&config("digest"), Operand::Value).unwrap();
        let out = transform.apply(structured()).unwrap().into_record();

        let out_schema = out.value_schema.clone().unwrap();
        let names: Vec<&str> = out_schema.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["id", "customer", "digest"]);
        assert!(out_schema.same_identity(&schema()));

        let Some(Value::Struct(s)) = &out.value else { panic!("expected struct") };
        assert_eq!(s.get("digest"), Some(&Value::String(hex_sha256("42ada"))));
        assert_eq!(s.get("id"), Some(&Value::Int32(42)));
    }

    #[test]
    fn digest_is_64_lowercase_hex_and_reproducible() {
        let transform = configure(&config("digest"), Operand::Value).unwrap();
        let first = transform.apply(structured()).unwrap().into_record();
        let second = transform.apply(structured()).unwrap().into_record();
        assert_eq!(first, second);

        let Some(Value::Struct(s)) = &first.value else { panic!("expected struct") };
        let sha = s.get("digest").and_then(Value::as_str).unwrap();
        assert_eq!(sha.len(), 64);
        assert!(sha.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn schemaless_digest_is_insertion_order_independent() {
        let mut a = BTreeMap::new();
        a.insert("b".to_string(), Value::from("2"));
        a.insert("a".to_string(), Value::from("1"));
        let mut b = BTreeMap::new();
        b.insert("a".to_string(), Value::from("1"));
        b.insert("b".to_string(), Value::from("2"));

        let transform = configure(&config("sha"), Operand::Value).unwrap();
        let out_a = transform.apply(Record::new("t", Some(Value::Map(a)), None)).unwrap().into_record();
        let out_b = transform.apply(Record::new("t", Some(Value::Map(b)), None)).unwrap().into_record();
        assert_eq!(out_a, out_b);

        let Some(Value::Map(map)) = out_a.value else { panic!("expected map") };
        assert_eq!(map.get("sha"), Some(&Value::String(hex_sha256("12"))));
        assert!(out_a.value_schema.is_none());
    }

    #[test]
    fn null_payload_passes_through() {
        let transform = configure(&config("digest"), Operand::Value).unwrap();
        let record = Record::new("t", None, None);
        assert_eq!(
            transform.apply(record.clone()).unwrap(),
            Outcome::PassThrough(record)
        );
    }

    #[test]
    fn key_mode_leaves_value_alone() {
        let mut key = BTreeMap::new();
        key.insert("id".to_string(), Value::Int64(7));
        let record = structured().with_key(Some(Value::Map(key)), None);

        let transform = configure(&config("digest"), Operand::Key).unwrap();
        let out = transform.apply(record.clone()).unwrap().into_record();
        assert_eq!(out.value, record.value);
        assert_eq!(out.value_schema, record.value_schema);
        let Some(Value::Map(key)) = out.key else { panic!("expected map") };
        assert_eq!(key.get("digest"), Some(&Value::String(hex_sha256("7"))));
    }

    #[test]
    fn existing_field_name_is_a_schema_error() {
        let transform = configure(&config("customer"), Operand::Value).unwrap();
        let err = transform.apply(structured()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Schema);
    }

    #[test]
    fn missing_field_option_fails_configure() {
        let err = configure(&ConfigValues::new(), Operand::Value).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Config);
        assert!(err.message.contains("\"field\""));

        let err = configure(&config(""), Operand::Value).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Config);
    }

    #[test]
    fn describes_required_field_param() {
        let params = config_params();
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].name, "field");
        assert!(params[0].is_required());
    }
}
