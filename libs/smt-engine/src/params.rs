//! Resolution of a transform's options against its declared parameters.

use smt_api::config::{ConfigParam, ConfigValues};

use crate::error::EngineError;

/// Build the option set a transform is constructed with.
///
/// `options` is the instance's `config` table, already converted from TOML.
/// Each declared parameter is looked up once: a given value must be a string,
/// a missing one takes its default, and a missing one without a default is an
/// error. Keys no parameter declares are rejected.
pub fn resolve(
    options: Option<&serde_json::Value>,
    params: &[ConfigParam],
) -> Result<ConfigValues, EngineError> {
    let empty = serde_json::Map::new();
    let given = match options {
        None => &empty,
        Some(serde_json::Value::Object(map)) => map,
        Some(other) => {
            return Err(EngineError::Config(format!(
                "options must be a table, found {other}"
            )));
        }
    };

    if let Some(unknown) = given
        .keys()
        .find(|key| !params.iter().any(|p| &p.name == *key))
    {
        return Err(EngineError::Config(format!(
            "Unknown configuration \"{unknown}\""
        )));
    }

    let mut values = ConfigValues::new();
    for param in params {
        let value = match (given.get(&param.name), &param.default) {
            (Some(serde_json::Value::String(s)), _) => s.clone(),
            (Some(other), _) => {
                return Err(EngineError::Config(format!(
                    "Invalid value {other} for configuration \"{}\": expected a string",
                    param.name
                )));
            }
            (None, Some(default)) => default.clone(),
            (None, None) => {
                return Err(EngineError::Config(format!(
                    "Missing required configuration \"{}\" which has no default value.",
                    param.name
                )));
            }
        };
        values.set(param.name.as_str(), value);
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use smt_api::config::Importance;

    use super::*;

    fn params() -> Vec<ConfigParam> {
        vec![
            ConfigParam {
                name: "field".into(),
                importance: Importance::High,
                default: None,
                description: "target field".into(),
            },
            ConfigParam {
                name: "separator".into(),
                importance: Importance::Low,
                default: Some(",".into()),
                description: "list separator".into(),
            },
        ]
    }

    #[test]
    fn given_values_win_and_defaults_fill_in() {
        let values = resolve(Some(&json!({"field": "digest"})), &params()).unwrap();
        assert_eq!(values.get("field"), Some("digest"));
        assert_eq!(values.get("separator"), Some(","));

        let values = resolve(Some(&json!({"field": "d", "separator": ";"})), &params()).unwrap();
        assert_eq!(values.get("separator"), Some(";"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = resolve(Some(&json!({"field": "a", "fieldd": "b"})), &params()).unwrap_err();
        assert_eq!(err.to_string(), "config error: Unknown configuration \"fieldd\"");
    }

    #[test]
    fn non_string_values_are_invalid() {
        for options in [json!({"field": 5}), json!({"field": true}), json!({"field": ["a"]})] {
            let err = resolve(Some(&options), &params()).unwrap_err();
            assert!(err.to_string().contains("Invalid value"), "{options}");
        }
    }

    #[test]
    fn missing_required_is_reported_by_name() {
        let err = resolve(None, &params()).unwrap_err();
        assert!(err.to_string().contains("Missing required configuration \"field\""));
    }

    #[test]
    fn options_must_be_a_table() {
        let err = resolve(Some(&json!("field")), &params()).unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }
}
