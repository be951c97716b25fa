//! Sample type returned by live variable reads

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Value;

/// Result of reading one variable from the buffer replicas.
///
/// `Unknown` means every replica held an all-zero slice for the variable.
/// That is a normal transient state while the producer refreshes its
/// buffers, and is distinct from a decoded zero such as `Value(Int32(0))`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum Sample {
    /// A decoded value from the first non-zero replica.
    Value(Value),
    /// No replica currently holds a non-zero slice.
    Unknown,
}

impl Sample {
    /// The decoded value, if any.
    pub fn value(&self) -> Option<Value> {
        match self {
            Sample::Value(v) => Some(*v),
            Sample::Unknown => None,
        }
    }

    /// Whether no replica held a usable sample.
    pub fn is_unknown(&self) -> bool {
        matches!(self, Sample::Unknown)
    }
}

impl From<Value> for Sample {
    fn from(value: Value) -> Self {
        Sample::Value(value)
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sample::Value(v) => v.fmt(f),
            Sample::Unknown => f.write_str("<unknown>"),
        }
    }
}
