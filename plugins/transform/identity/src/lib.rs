use smt_api::config::{ConfigParam, ConfigValues};
use smt_api::dispatch::{Dispatcher, FieldMutation, Path};
use smt_api::error::PluginError;
use smt_api::evolve::Edit;
use smt_api::operand::Operand;
use smt_api::schema::Schema;
use smt_api::transform::{Transform, TransformDescriptor};
use smt_api::view::OrderedFields;

/// Identity: rebuilds the payload (and schema) without changing anything.
///
/// The baseline every other transform is measured against: its output is
/// structurally equal to its input.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl FieldMutation for Identity {
    fn purpose(&self) -> &str {
        "identity transformation"
    }

    fn edits(&self, _schema: &Schema) -> Result<Vec<Edit>, PluginError> {
        Ok(Vec::new())
    }

    fn mutate(&self, _fields: &mut OrderedFields, _path: Path) -> Result<(), PluginError> {
        Ok(())
    }
}

pub fn config_params() -> Vec<ConfigParam> {
    Vec::new()
}

pub fn configure(_config: &ConfigValues, operand: Operand) -> Result<Dispatcher<Identity>, PluginError> {
    Ok(Dispatcher::new(operand, Identity))
}

fn create(config: &ConfigValues, operand: Operand) -> Result<Box<dyn Transform>, PluginError> {
    Ok(Box::new(configure(config, operand)?))
}

pub fn descriptor() -> TransformDescriptor {
    TransformDescriptor {
        alias: "identity",
        description: "Copy the key or value unchanged",
        config_params,
        create,
    }
}
