use std::sync::Arc;

use crate::error::{ErrorKind, PluginError};
use crate::evolve::{Edit, evolve};
use crate::operand::Operand;
use crate::record::Record;
use crate::schema::Schema;
use crate::transform::{Outcome, Transform};
use crate::value::Value;
use crate::view::{OrderedFields, RecordView};

/// Which representation the current payload uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Path {
    Schemaless,
    SchemaPresent,
}

/// The algorithm half of a transform, written once against [`OrderedFields`].
pub trait FieldMutation: Send + Sync {
    /// Short description used in error messages, e.g. `"rename a field"`.
    fn purpose(&self) -> &str;

    /// Edit plan for the schema path. Called before `mutate`; a `Format`
    /// error here is handled the same way.
    fn edits(&self, schema: &Schema) -> Result<Vec<Edit>, PluginError>;

    /// Rewrite the payload's fields.
    ///
    /// A `Format` error means embedded data is malformed; the dispatcher then
    /// returns the record unchanged as [`Outcome::ParseFailed`].
    fn mutate(&self, fields: &mut OrderedFields, path: Path) -> Result<(), PluginError>;
}

/// Per-transform entry point: picks the path, evolves the schema, runs the
/// mutation and rebuilds the record on the configured side.
#[derive(Debug, Clone)]
pub struct Dispatcher<M> {
    operand: Operand,
    mutation: M,
}

impl<M: FieldMutation> Dispatcher<M> {
    pub fn new(operand: Operand, mutation: M) -> Self {
        Self { operand, mutation }
    }

    pub fn dispatch(&self, record: Record) -> Result<Outcome, PluginError> {
        let payload = match self.operand.payload(&record) {
            None | Some(Value::Null) => return Ok(Outcome::PassThrough(record)),
            Some(payload) => payload,
        };
        let schema = self.operand.schema(&record);
        let path = match schema {
            Some(_) => Path::SchemaPresent,
            None => Path::Schemaless,
        };
        tracing::trace!(
            purpose = self.mutation.purpose(),
            operand = %self.operand,
            ?path,
            topic = %record.topic,
            "applying transform"
        );

        match self.rewrite(payload, schema, path) {
            Ok((schema, payload)) => Ok(Outcome::Transformed(
                self.operand.rebuild(record, schema, payload),
            )),
            Err(error) if error.kind == ErrorKind::Format => Ok(Outcome::ParseFailed {
                record,
                error: error.with_context(self.mutation.purpose()),
            }),
            Err(error) => Err(error.with_context(self.mutation.purpose())),
        }
    }

    fn rewrite(
        &self,
        payload: &Value,
        schema: Option<&Arc<Schema>>,
        path: Path,
    ) -> Result<(Option<Arc<Schema>>, Value), PluginError> {
        let (mut fields, schema) =
            RecordView::read(payload, schema, self.mutation.purpose())?.into_parts();
        let target = match schema {
            Some(schema) => {
                let edits = self.mutation.edits(&schema)?;
                Some(Arc::new(evolve(&schema, &edits)?))
            }
            None => None,
        };
        self.mutation.mutate(&mut fields, path)?;
        let payload = fields.write(target.as_ref())?;
        Ok((target, payload))
    }
}

impl<M: FieldMutation> Transform for Dispatcher<M> {
    fn apply(&self, record: Record) -> Result<Outcome, PluginError> {
        self.dispatch(record)
    }
}
