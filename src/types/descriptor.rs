//! Variable descriptor parsed from the descriptor table

use serde::{Deserialize, Serialize};

use super::VariableType;

/// Information about one telemetry variable, as declared by its descriptor record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct VariableDescriptor {
    /// Variable name, unique within a session
    pub name: String,
    /// Data type of the variable
    pub var_type: VariableType,
    /// Position in the descriptor table
    pub index: usize,
    /// Human-readable description
    pub description: String,
    /// Units of measurement (e.g., "m/s", "C", "N*m")
    pub units: String,
}
