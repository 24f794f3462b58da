//! Scalar element types a tensor descriptor can carry.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Numeric representation selected for a tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DataType {
    /// Not decided yet. Also requests the inherited type policy.
    #[default]
    Unknown,
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float16,
    Bfloat16,
    Float32,
    Float64,
}

impl DataType {
    pub const ALL: [DataType; 14] = [
        DataType::Unknown,
        DataType::Bool,
        DataType::Int8,
        DataType::Int16,
        DataType::Int32,
        DataType::Int64,
        DataType::Uint8,
        DataType::Uint16,
        DataType::Uint32,
        DataType::Uint64,
        DataType::Float16,
        DataType::Bfloat16,
        DataType::Float32,
        DataType::Float64,
    ];

    pub fn is_float(self) -> bool {
        matches!(
            self,
            DataType::Float16 | DataType::Bfloat16 | DataType::Float32 | DataType::Float64
        )
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            DataType::Int8
                | DataType::Int16
                | DataType::Int32
                | DataType::Int64
                | DataType::Uint8
                | DataType::Uint16
                | DataType::Uint32
                | DataType::Uint64
        )
    }

    /// Stable tag written into serialized containers.
    pub fn tag(self) -> u32 {
        match self {
            DataType::Unknown => 0,
            DataType::Bool => 1,
            DataType::Int8 => 2,
            DataType::Int16 => 3,
            DataType::Int32 => 4,
            DataType::Int64 => 5,
            DataType::Uint8 => 6,
            DataType::Uint16 => 7,
            DataType::Uint32 => 8,
            DataType::Uint64 => 9,
            DataType::Float16 => 10,
            DataType::Bfloat16 => 11,
            DataType::Float32 => 12,
            DataType::Float64 => 13,
        }
    }

    pub fn from_tag(tag: u32) -> Option<Self> {
        DataType::ALL.into_iter().find(|dtype| dtype.tag() == tag)
    }

    /// Maps an ONNX `TensorProto.DataType` value, as found in the `to` attribute of Cast.
    pub fn from_onnx(value: i64) -> Option<Self> {
        match value {
            0 => Some(DataType::Unknown),
            1 => Some(DataType::Float32),
            2 => Some(DataType::Uint8),
            3 => Some(DataType::Int8),
            4 => Some(DataType::Uint16),
            5 => Some(DataType::Int16),
            6 => Some(DataType::Int32),
            7 => Some(DataType::Int64),
            9 => Some(DataType::Bool),
            10 => Some(DataType::Float16),
            11 => Some(DataType::Float64),
            12 => Some(DataType::Uint32),
            13 => Some(DataType::Uint64),
            16 => Some(DataType::Bfloat16),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DataType::Unknown => "unknown",
            DataType::Bool => "bool",
            DataType::Int8 => "int8",
            DataType::Int16 => "int16",
            DataType::Int32 => "int32",
            DataType::Int64 => "int64",
            DataType::Uint8 => "uint8",
            DataType::Uint16 => "uint16",
            DataType::Uint32 => "uint32",
            DataType::Uint64 => "uint64",
            DataType::Float16 => "float16",
            DataType::Bfloat16 => "bfloat16",
            DataType::Float32 => "float32",
            DataType::Float64 => "float64",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let alias = match normalized.as_str() {
            "fp16" | "f16" | "half" => "float16",
            "bf16" => "bfloat16",
            "fp32" | "f32" | "float" => "float32",
            "fp64" | "f64" | "double" => "float64",
            "i8" => "int8",
            "i32" => "int32",
            "i64" => "int64",
            other => other,
        };
        DataType::ALL
            .into_iter()
            .find(|dtype| dtype.as_str() == alias)
            .ok_or_else(|| format!("unknown data type '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_unique_and_reversible() {
        for dtype in DataType::ALL {
            assert_eq!(DataType::from_tag(dtype.tag()), Some(dtype));
        }
        assert_eq!(DataType::from_tag(99), None);
    }

    #[test]
    fn parses_common_aliases() {
        assert_eq!("fp16".parse::<DataType>(), Ok(DataType::Float16));
        assert_eq!("Float32".parse::<DataType>(), Ok(DataType::Float32));
        assert!("complex64".parse::<DataType>().is_err());
    }

    #[test]
    fn onnx_codes_follow_tensor_proto() {
        assert_eq!(DataType::from_onnx(1), Some(DataType::Float32));
        assert_eq!(DataType::from_onnx(7), Some(DataType::Int64));
        assert_eq!(DataType::from_onnx(8), None);
    }
}
