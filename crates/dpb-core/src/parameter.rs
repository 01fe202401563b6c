//! Scalar parameters carried by bundle and mechanism specs.

use serde::{Deserialize, Serialize};

/// Element type of a scalar parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    F32,
    F64,
    I32,
    I64,
    U64,
    String,
}

impl DataType {
    /// Whether values of this type can be read as a number.
    pub fn is_numeric(self) -> bool {
        !matches!(self, DataType::String)
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataType::F32 => write!(f, "f32"),
            DataType::F64 => write!(f, "f64"),
            DataType::I32 => write!(f, "i32"),
            DataType::I64 => write!(f, "i64"),
            DataType::U64 => write!(f, "u64"),
            DataType::String => write!(f, "string"),
        }
    }
}

/// A typed scalar.
///
/// Serializes as `{"dtype": "f64", "value": 1.0}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dtype", content = "value", rename_all = "snake_case")]
pub enum Parameter {
    F32(f32),
    F64(f64),
    I32(i32),
    I64(i64),
    U64(u64),
    String(String),
}

impl Parameter {
    pub fn dtype(&self) -> DataType {
        match self {
            Parameter::F32(_) => DataType::F32,
            Parameter::F64(_) => DataType::F64,
            Parameter::I32(_) => DataType::I32,
            Parameter::I64(_) => DataType::I64,
            Parameter::U64(_) => DataType::U64,
            Parameter::String(_) => DataType::String,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.dtype().is_numeric()
    }

    /// Read the value as `f64`, or `None` for non-numeric parameters.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Parameter::F32(v) => Some(f64::from(*v)),
            Parameter::F64(v) => Some(*v),
            Parameter::I32(v) => Some(f64::from(*v)),
            Parameter::I64(v) => Some(*v as f64),
            Parameter::U64(v) => Some(*v as f64),
            Parameter::String(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Parameter::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f32> for Parameter {
    fn from(v: f32) -> Self {
        Parameter::F32(v)
    }
}

impl From<f64> for Parameter {
    fn from(v: f64) -> Self {
        Parameter::F64(v)
    }
}

impl From<i32> for Parameter {
    fn from(v: i32) -> Self {
        Parameter::I32(v)
    }
}

impl From<i64> for Parameter {
    fn from(v: i64) -> Self {
        Parameter::I64(v)
    }
}

impl From<u64> for Parameter {
    fn from(v: u64) -> Self {
        Parameter::U64(v)
    }
}

impl From<&str> for Parameter {
    fn from(v: &str) -> Self {
        Parameter::String(v.to_string())
    }
}

impl From<String> for Parameter {
    fn from(v: String) -> Self {
        Parameter::String(v)
    }
}
