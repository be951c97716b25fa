//! Core types for telemetry data representation.
//!
//! - [`VariableType`] is the closed set of type codes a descriptor may carry,
//!   with the byte width used when decoding
//! - [`Value`] is a decoded scalar
//! - [`Sample`] is the outcome of a live read: a value, or `Unknown` when every
//!   buffer replica was zero-filled
//! - [`VariableDescriptor`] describes one variable from the descriptor table
//!
//! ## Usage Example
//!
//! ```rust
//! use simview::types::{Value, VariableType};
//!
//! let bytes = 44.5f32.to_le_bytes();
//! let value = Value::decode(VariableType::Float32, &bytes).unwrap();
//! assert_eq!(value, Value::Float32(44.5));
//! ```

mod descriptor;
mod sample;
mod variable_type;

pub use descriptor::VariableDescriptor;
pub use sample::Sample;
pub use variable_type::{Value, VariableType};
