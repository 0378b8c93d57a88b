//! Transform options. Every option is a string; a transform that needs
//! something richer parses it in its constructor.

use std::collections::BTreeMap;
use std::fmt;

/// How much a parameter matters to the user, shown when listing transforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Importance {
    High,
    Medium,
    Low,
}

impl fmt::Display for Importance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Importance::High => f.write_str("high"),
            Importance::Medium => f.write_str("medium"),
            Importance::Low => f.write_str("low"),
        }
    }
}

/// One declared option of a transform.
///
/// A parameter without a default must be given.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigParam {
    pub name: String,
    pub importance: Importance,
    pub default: Option<String>,
    pub description: String,
}

impl ConfigParam {
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// Resolved options handed to a transform constructor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigValues {
    entries: BTreeMap<String, String>,
}

impl ConfigValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(name.into(), value.into());
    }

    /// Builder-style `set`.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
