//! Telemetry variable type definitions

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Result, TelemetryError};

/// Supported telemetry data types.
///
/// The discriminant order matches the type code stored in each descriptor
/// record, so code `0` is `Char` and code `5` is `Float64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum VariableType {
    /// 8-bit character
    Char,
    /// Boolean stored as one byte
    Bool,
    /// 32-bit signed integer
    Int32,
    /// 32-bit unsigned integer (bitfields are published with this code)
    UInt32,
    /// 32-bit IEEE-754 floating point
    Float32,
    /// 64-bit IEEE-754 floating point
    Float64,
}

impl VariableType {
    /// All types in type-code order.
    pub const ALL: [VariableType; 6] = [
        VariableType::Char,
        VariableType::Bool,
        VariableType::Int32,
        VariableType::UInt32,
        VariableType::Float32,
        VariableType::Float64,
    ];

    /// Map a raw descriptor type code to a type, `None` when out of range.
    pub fn from_code(code: i32) -> Option<Self> {
        usize::try_from(code).ok().and_then(|i| Self::ALL.get(i).copied())
    }

    /// The raw type code written by the producer.
    pub const fn code(&self) -> i32 {
        match self {
            VariableType::Char => 0,
            VariableType::Bool => 1,
            VariableType::Int32 => 2,
            VariableType::UInt32 => 3,
            VariableType::Float32 => 4,
            VariableType::Float64 => 5,
        }
    }

    /// Returns the size in bytes of this data type.
    pub const fn size(&self) -> usize {
        match self {
            VariableType::Char | VariableType::Bool => 1,
            VariableType::Int32 | VariableType::UInt32 | VariableType::Float32 => 4,
            VariableType::Float64 => 8,
        }
    }
}

/// Runtime value decoded from a buffer replica.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum Value {
    Char(u8),
    Bool(bool),
    Int32(i32),
    UInt32(u32),
    Float32(f32),
    Float64(f64),
}

impl Value {
    /// Decode little-endian bytes as `var_type`.
    ///
    /// `bytes` must be exactly [`VariableType::size`] long.
    pub fn decode(var_type: VariableType, bytes: &[u8]) -> Result<Self> {
        if bytes.len() != var_type.size() {
            return Err(TelemetryError::TypeConversion {
                details: format!(
                    "Expected {} bytes for {:?}, got {}",
                    var_type.size(),
                    var_type,
                    bytes.len()
                ),
            });
        }

        let value = match var_type {
            VariableType::Char => Value::Char(bytes[0]),
            VariableType::Bool => Value::Bool(bytes[0] != 0),
            VariableType::Int32 => Value::Int32(i32::from_le_bytes(word(bytes))),
            VariableType::UInt32 => Value::UInt32(u32::from_le_bytes(word(bytes))),
            VariableType::Float32 => Value::Float32(f32::from_le_bytes(word(bytes))),
            VariableType::Float64 => Value::Float64(f64::from_le_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
            ])),
        };

        Ok(value)
    }

    /// The little-endian encoding of this value, as the producer writes it.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        match *self {
            Value::Char(c) => vec![c],
            Value::Bool(b) => vec![u8::from(b)],
            Value::Int32(v) => v.to_le_bytes().to_vec(),
            Value::UInt32(v) => v.to_le_bytes().to_vec(),
            Value::Float32(v) => v.to_le_bytes().to_vec(),
            Value::Float64(v) => v.to_le_bytes().to_vec(),
        }
    }

    /// The type tag of this value.
    pub fn var_type(&self) -> VariableType {
        match self {
            Value::Char(_) => VariableType::Char,
            Value::Bool(_) => VariableType::Bool,
            Value::Int32(_) => VariableType::Int32,
            Value::UInt32(_) => VariableType::UInt32,
            Value::Float32(_) => VariableType::Float32,
            Value::Float64(_) => VariableType::Float64,
        }
    }

    /// Widen any numeric value to `f64`.
    pub fn as_f64(&self) -> f64 {
        match *self {
            Value::Char(c) => f64::from(c),
            Value::Bool(b) => f64::from(u8::from(b)),
            Value::Int32(v) => f64::from(v),
            Value::UInt32(v) => f64::from(v),
            Value::Float32(v) => f64::from(v),
            Value::Float64(v) => v,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Char(c) => write!(f, "{}", char::from(*c)),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int32(v) => write!(f, "{}", v),
            Value::UInt32(v) => write!(f, "{}", v),
            Value::Float32(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
        }
    }
}

fn word(bytes: &[u8]) -> [u8; 4] {
    [bytes[0], bytes[1], bytes[2], bytes[3]]
}
