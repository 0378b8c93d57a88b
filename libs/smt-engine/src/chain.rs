use smt_api::operand::Operand;
use smt_api::record::Record;
use smt_api::transform::{Outcome, Transform};

use crate::config::ChainConfig;
use crate::error::EngineError;
use crate::registry::TransformRegistry;

/// One configured transform instance in a chain.
pub struct Stage {
    name: String,
    kind: String,
    operand: Operand,
    transform: Box<dyn Transform>,
}

impl std::fmt::Debug for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stage")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("operand", &self.operand)
            .finish()
    }
}

impl Stage {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn operand(&self) -> Operand {
        self.operand
    }
}

/// Transforms applied in configuration order, each to the output of the last.
#[derive(Debug, Default)]
pub struct TransformChain {
    stages: Vec<Stage>,
}

impl TransformChain {
    /// Create every configured transform. Fails on the first bad entry.
    pub fn build(config: &ChainConfig, registry: &TransformRegistry) -> Result<Self, EngineError> {
        let mut stages = Vec::with_capacity(config.transforms.len());
        for entry in &config.transforms {
            let ctx = format!("transform '{}'", entry.name);
            let options = entry.config_json().map_err(|e| e.with_context(&ctx))?;
            let transform = registry
                .create(&entry.kind, options.as_ref(), entry.operand)
                .map_err(|e| e.with_context(&ctx))?;
            tracing::info!(
                transform = %entry.name,
                kind = %entry.kind,
                operand = %entry.operand,
                "configured transform"
            );
            stages.push(Stage {
                name: entry.name.clone(),
                kind: entry.kind.clone(),
                operand: entry.operand,
                transform,
            });
        }
        Ok(Self { stages })
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run a record through every stage.
    ///
    /// A stage that cannot parse embedded data hands the record on unchanged
    /// and the failure is logged; any other error stops the chain.
    pub fn apply(&self, record: Record) -> Result<Record, EngineError> {
        let mut record = record;
        for stage in &self.stages {
            let outcome = stage
                .transform
                .apply(record)
                .map_err(|e| EngineError::from(e).with_context(format!("transform '{}'", stage.name)))?;
            record = match outcome {
                Outcome::Transformed(r) => r,
                Outcome::PassThrough(r) => {
                    tracing::trace!(transform = %stage.name, topic = %r.topic, "no payload, passed through");
                    r
                }
                Outcome::ParseFailed { record, error } => {
                    tracing::warn!(
                        transform = %stage.name,
                        topic = %record.topic,
                        error = %error,
                        "parse failed, record passed on unchanged"
                    );
                    record
                }
            };
        }
        Ok(record)
    }

    /// Close every transform, in chain order.
    pub fn close(&self) {
        for stage in &self.stages {
            stage.transform.close();
            tracing::debug!(transform = %stage.name, "closed transform");
        }
    }
}
