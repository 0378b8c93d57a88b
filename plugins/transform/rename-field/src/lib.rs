use smt_api::ConfigParams;
use smt_api::config::{ConfigParam, ConfigValues};
use smt_api::dispatch::{Dispatcher, FieldMutation, Path};
use smt_api::error::PluginError;
use smt_api::evolve::Edit;
use smt_api::operand::Operand;
use smt_api::schema::{Field, Schema};
use smt_api::transform::{Transform, TransformDescriptor};
use smt_api::value::Value;
use smt_api::view::OrderedFields;

#[derive(Debug, Default, ConfigParams)]
pub struct RenameConfig {
    #[param(
        name = "field.current",
        required,
        importance = "high",
        description = "Current field name"
    )]
    pub current: String,
    #[param(
        name = "field.new",
        required,
        importance = "high",
        description = "New field name"
    )]
    pub new: String,
}

/// Moves a field's value to a new name at the end of the payload.
///
/// The appended field is not declared as a string: it keeps the type and
/// optionality of the current field, so a renamed `int32` stays `int32`.
#[derive(Debug, Clone)]
pub struct FieldRename {
    current: String,
    new: String,
}

impl FieldRename {
    pub fn new(current: impl Into<String>, new: impl Into<String>) -> Self {
        Self {
            current: current.into(),
            new: new.into(),
        }
    }
}

impl FieldMutation for FieldRename {
    fn purpose(&self) -> &str {
        "rename a field"
    }

    fn edits(&self, schema: &Schema) -> Result<Vec<Edit>, PluginError> {
        let current = schema.field(&self.current).ok_or_else(|| {
            PluginError::schema(format!("schema has no field '{}'", self.current))
        })?;
        Ok(vec![
            Edit::Drop(self.current.clone()),
            Edit::Append(Field::new(
                self.new.clone(),
                current.field_type.clone(),
                current.optional,
            )),
        ])
    }

    fn mutate(&self, fields: &mut OrderedFields, path: Path) -> Result<(), PluginError> {
        match fields.remove(&self.current) {
            Some(field) => fields.push(self.new.clone(), field.value, field.field_type),
            None if path == Path::Schemaless => {
                tracing::debug!(field = %self.current, "field absent, renaming to null");
                fields.push(self.new.clone(), Value::Null, None)
            }
            None => Err(PluginError::schema(format!(
                "payload has no field '{}'",
                self.current
            ))),
        }
    }
}

pub fn config_params() -> Vec<ConfigParam> {
    RenameConfig::config_params()
}

pub fn configure(config: &ConfigValues, operand: Operand) -> Result<Dispatcher<FieldRename>, PluginError> {
    let config = RenameConfig::from_config(config)?;
    if config.current.is_empty() || config.new.is_empty() {
        return Err(PluginError::config(
            "parameters 'field.current' and 'field.new' must not be empty",
        ));
    }
    Ok(Dispatcher::new(operand, FieldRename::new(config.current, config.new)))
}

fn create(config: &ConfigValues, operand: Operand) -> Result<Box<dyn Transform>, PluginError> {
    Ok(Box::new(configure(config, operand)?))
}

pub fn descriptor() -> TransformDescriptor {
    TransformDescriptor {
        alias: "rename-field",
        description: "Rename a field, moving it to the end",
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
    use smt_api::schema::{FieldType, ScalarType};
    use smt_api::value::Struct;

    use super::*;

    fn config(current: &str, new: &str) -> ConfigValues {
        ConfigValues::new()
            .with("field.current", current)
            .with("field.new", new)
    }

    fn schema() -> Arc<Schema> {
        let mut schema = Schema::named(
            "row",
            vec![
                Field::scalar("a", ScalarType::Int32),
                Field::scalar_optional("c", ScalarType::String),
                Field::scalar("d", ScalarType::Bool),
            ],
        )
        .with_version(2);
        schema.doc = Some("rows".into());
        Arc::new(schema)
    }

    fn structured() -> Record {
        let value = Struct::new(schema())
            .with("a", 5)
            .unwrap()
            .with("c", "x")
            .unwrap()
            .with("d", true)
            .unwrap();
        Record::new("t", Some(Value::Struct(value)), Some(schema()))
    }

    #[test]
    fn renamed_field_moves_to_the_end() {
        let transform = configure(&config("a", "b"), Operand::Value).unwrap();
        let out = transform.apply(structured()).unwrap().into_record();

        let out_schema = out.value_schema.clone().unwrap();
        assert!(out_schema.same_identity(&schema()));
        let fields: Vec<(&str, &FieldType, bool)> = out_schema
            .fields
            .iter()
            .map(|f| (f.name.as_str(), &f.field_type, f.optional))
            .collect();
        assert_eq!(
            fields,
            [
                ("c", &FieldType::Scalar(ScalarType::String), true),
                ("d", &FieldType::Scalar(ScalarType::Bool), false),
                ("b", &FieldType::Scalar(ScalarType::Int32), false),
            ]
        );

        let Some(Value::Struct(s)) = out.value else { panic!("expected struct") };
        assert_eq!(s.get("b"), Some(&Value::Int32(5)));
        assert_eq!(s.get("c"), Some(&Value::from("x")));
        assert_eq!(s.get("d"), Some(&Value::Bool(true)));
        assert_eq!(s.get("a"), None);
    }

    #[test]
    fn schemaless_rename_drops_old_key() {
        let mut map = BTreeMap::new();
        map.insert("a".to_string(), Value::Int64(5));
        map.insert("z".to_string(), Value::from("keep"));
        let transform = configure(&config("a", "b"), Operand::Value).unwrap();
        let out = transform
            .apply(Record::new("t", Some(Value::Map(map)), None))
            .unwrap()
            .into_record();

        let Some(Value::Map(map)) = out.value else { panic!("expected map") };
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("b"), Some(&Value::Int64(5)));
        assert_eq!(map.get("z"), Some(&Value::from("keep")));
        assert!(!map.contains_key("a"));
    }

    #[test]
    fn schemaless_absent_field_becomes_null() {
        let mut map = BTreeMap::new();
        map.insert("z".to_string(), Value::Int64(1));
        let transform = configure(&config("a", "b"), Operand::Value).unwrap();
        let out = transform
            .apply(Record::new("t", Some(Value::Map(map)), None))
            .unwrap()
            .into_record();

        let Some(Value::Map(map)) = out.value else { panic!("expected map") };
        assert_eq!(map.get("b"), Some(&Value::Null));
    }

    #[test]
    fn schema_without_field_is_a_schema_error() {
        let transform = configure(&config("missing", "b"), Operand::Value).unwrap();
        let err = transform.apply(structured()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Schema);
        assert!(err.message.starts_with("rename a field: "));
    }

    #[test]
    fn renaming_onto_existing_field_is_a_schema_error() {
        let transform = configure(&config("a", "c"), Operand::Value).unwrap();
        assert_eq!(transform.apply(structured()).unwrap_err().kind, ErrorKind::Schema);
    }

    #[test]
    fn both_names_are_required() {
        let only_current = ConfigValues::new().with("field.current", "a");
        let err = configure(&only_current, Operand::Value).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Config);
        assert!(err.message.contains("\"field.new\""));

        let names: Vec<String> = config_params().into_iter().map(|p| p.name).collect();
        assert_eq!(names, ["field.current", "field.new"]);
    }
}
