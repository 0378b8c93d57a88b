use std::collections::BTreeMap;

use smt_api::config::ConfigParam;
use smt_api::operand::Operand;
use smt_api::transform::{Transform, TransformDescriptor};

use crate::error::EngineError;
use crate::params::resolve;

/// Transforms known to the host, keyed by alias.
#[derive(Debug, Default)]
pub struct TransformRegistry {
    descriptors: BTreeMap<&'static str, TransformDescriptor>,
}

impl TransformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, descriptor: TransformDescriptor) -> Result<(), EngineError> {
        if self.descriptors.contains_key(descriptor.alias) {
            return Err(EngineError::Config(format!(
                "transform type '{}' registered twice",
                descriptor.alias
            )));
        }
        tracing::debug!(alias = descriptor.alias, "registered transform type");
        self.descriptors.insert(descriptor.alias, descriptor);
        Ok(())
    }

    pub fn get(&self, alias: &str) -> Option<&TransformDescriptor> {
        self.descriptors.get(alias)
    }

    /// Registered aliases in name order.
    pub fn aliases(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.descriptors.keys().copied()
    }

    /// Declared parameters of a transform type.
    pub fn describe(&self, alias: &str) -> Result<Vec<ConfigParam>, EngineError> {
        let descriptor = self
            .get(alias)
            .ok_or_else(|| EngineError::UnknownTransform(alias.to_string()))?;
        Ok((descriptor.config_params)())
    }

    /// Validate `config` against the transform's declared parameters and build it.
    ///
    pub fn create(
        &self,
        alias: &str,
        config: Option<&serde_json::Value>,
        operand: Operand,
    ) -> Result<Box<dyn Transform>, EngineError> {
        let descriptor = self
            .get(alias)
            .ok_or_else(|| EngineError::UnknownTransform(alias.to_string()))?;
        let values = resolve(config, &(descriptor.config_params)())?;
        Ok((descriptor.create)(&values, operand)?)
    }
}
