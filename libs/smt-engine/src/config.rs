use std::collections::HashSet;

use serde::Deserialize;

use smt_api::operand::Operand;

use crate::error::EngineError;

/// Root configuration: an ordered transform chain, parsed from TOML.
///
/// ```toml
/// [[transforms]]
/// name = "checksum"
/// type = "integrity"
/// operand = "value"
/// [transforms.config]
/// field = "digest"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChainConfig {
    /// Transforms in application order.
    #[serde(default)]
    pub transforms: Vec<TransformConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransformConfig {
    /// Instance name, used in logs and error context.
    pub name: String,
    /// Registry alias of the transform, e.g. `"rename-field"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Record side the instance operates on.
    #[serde(default)]
    pub operand: Operand,
    #[serde(default)]
    pub config: Option<toml::Value>,
}

impl TransformConfig {
    /// The `config` table as a format-independent value for parameter parsing.
    pub fn config_json(&self) -> Result<Option<serde_json::Value>, EngineError> {
        self.config
            .as_ref()
            .map(|v| {
                serde_json::to_value(v).map_err(|e| {
                    EngineError::Config(format!("transform '{}': {e}", self.name))
                })
            })
            .transpose()
    }
}

impl ChainConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self, EngineError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| EngineError::Config(format!("{path}: {e}")))?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, EngineError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), EngineError> {
        let mut names = HashSet::new();
        for transform in &self.transforms {
            if transform.name.is_empty() {
                return Err(EngineError::Config("transform name must not be empty".into()));
            }
            if !names.insert(transform.name.as_str()) {
                return Err(EngineError::Config(format!(
                    "duplicate transform name '{}'",
                    transform.name
                )));
            }
        }
        Ok(())
    }
}
