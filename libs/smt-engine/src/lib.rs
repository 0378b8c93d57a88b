//! Host side of the record transforms: chain configuration, parameter
//! validation, the transform registry and the JSON-lines record codec.

pub mod chain;
pub mod codec;
pub mod config;
pub mod error;
pub mod params;
pub mod registry;
