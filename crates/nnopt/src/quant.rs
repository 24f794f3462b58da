//! Global quantization table consulted by the quantized type policy.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{OptError, OptResult};
use crate::ir::EdgeId;
use crate::tensor::{DataType, TensorTable};

/// Quantization parameters of one tensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TensorQuant {
    #[serde(default = "default_quant_type")]
    pub data_type: DataType,
    #[serde(default = "default_bit_width")]
    pub bit_width: u8,
    #[serde(default)]
    pub per_channel: bool,
    pub scale: Vec<f32>,
    pub zero_point: Vec<f32>,
}

fn default_quant_type() -> DataType {
    DataType::Int8
}

fn default_bit_width() -> u8 {
    8
}

impl TensorQuant {
    pub fn per_tensor(scale: f32, zero_point: f32) -> Self {
        Self {
            data_type: DataType::Int8,
            bit_width: 8,
            per_channel: false,
            scale: vec![scale],
            zero_point: vec![zero_point],
        }
    }
}

/// Quantization parameters keyed by tensor identity.
#[derive(Debug, Clone, Default)]
pub struct QuantTable {
    entries: HashMap<EdgeId, TensorQuant>,
}

impl QuantTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, edge: EdgeId, quant: TensorQuant) {
        self.entries.insert(edge, quant);
    }

    pub fn get(&self, edge: EdgeId) -> Option<&TensorQuant> {
        self.entries.get(&edge)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parses a JSON object mapping tensor names to [`TensorQuant`] records.
    ///
    /// Names are resolved against `tensors`; an unknown name is an error.
    pub fn from_json_str(src: &str, tensors: &TensorTable) -> OptResult<Self> {
        let raw: BTreeMap<String, TensorQuant> = serde_json::from_str(src)
            .map_err(|err| OptError::serialization(format!("invalid quant table: {err}")))?;
        let mut table = QuantTable::new();
        for (name, quant) in raw {
            let edge = tensors.find(&name).ok_or_else(|| {
                OptError::serialization(format!("quant table names unknown tensor '{name}'"))
            })?;
            table.insert(edge, quant);
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::TensorDescriptor;

    #[test]
    fn json_table_resolves_tensor_names() {
        let mut tensors = TensorTable::new();
        let _x = tensors.add(TensorDescriptor::unresolved("x"));
        let y = tensors.add(TensorDescriptor::unresolved("y"));
        let table = QuantTable::from_json_str(r#"{"y": {"scale": [0.5], "zero_point": [0.0]}}"#, &tensors)
            .unwrap_or_else(|err| panic!("unexpected error: {err}"));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(y), Some(&TensorQuant::per_tensor(0.5, 0.0)));
    }

    #[test]
    fn json_table_rejects_unknown_tensor() {
        let tensors = TensorTable::new();
        let err = QuantTable::from_json_str(r#"{"ghost": {"scale": [1.0], "zero_point": [0.0]}}"#, &tensors)
            .expect_err("unknown tensor");
        assert!(err.to_string().contains("ghost"));
    }
}
