//! Record transform SDK: the record/schema/value model, the schemaless and
//! schema-carrying views over a payload, schema evolution, and the dispatcher
//! every transform plugin is built on.

pub mod config;

pub use smt_api_derive::ConfigParams;
pub mod dispatch;
pub mod error;
pub mod evolve;
pub mod operand;
pub mod record;
pub mod schema;
pub mod transform;
pub mod value;
pub mod view;
