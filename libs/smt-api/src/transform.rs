use crate::config::{ConfigParam, ConfigValues};
use crate::error::PluginError;
use crate::operand::Operand;
use crate::record::Record;

/// Result of one `apply` call.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A successor record was built.
    Transformed(Record),
    /// The operated-on payload was absent; the input is returned as-is.
    PassThrough(Record),
    /// Embedded data could not be parsed. The input is returned unchanged
    /// together with the reason, so the host can log the degraded path.
    ParseFailed { record: Record, error: PluginError },
}

impl Outcome {
    pub fn into_record(self) -> Record {
        match self {
            Outcome::Transformed(r) | Outcome::PassThrough(r) => r,
            Outcome::ParseFailed { record, .. } => record,
        }
    }
}

/// A configured, pure function from record to record.
///
/// Configuration happens in the constructor (see [`TransformDescriptor`]),
/// so an instance is immutable and `apply` may run on many threads at once.
pub trait Transform: Send + Sync {
    fn apply(&self, record: Record) -> Result<Outcome, PluginError>;

    /// Release resources. Transforms here hold none.
    fn close(&self) {}
}

/// Reads validated config and builds a transform bound to one side of the record.
pub type CreateTransformFn = fn(&ConfigValues, Operand) -> Result<Box<dyn Transform>, PluginError>;

/// Declares the transform's parameters.
pub type ConfigParamsFn = fn() -> Vec<ConfigParam>;

/// Everything the host needs to offer a transform by name.
#[derive(Clone, Copy)]
pub struct TransformDescriptor {
    /// Name used in chain configuration, e.g. `"rename-field"`.
    pub alias: &'static str,
    pub description: &'static str,
    pub config_params: ConfigParamsFn,
    pub create: CreateTransformFn,
}

impl std::fmt::Debug for TransformDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformDescriptor")
            .field("alias", &self.alias)
            .field("description", &self.description)
            .finish()
    }
}
