use std::collections::HashMap;

use super::{DataFormat, DataType, TensorShape};
use crate::error::{OptError, OptResult};
use crate::ir::EdgeId;
use crate::quant::TensorQuant;

/// Per-tensor record: shape, selected type/format and, for compile-time constants,
/// the materialized host buffer.
#[derive(Debug, Clone, Default)]
pub struct TensorDescriptor {
    name: String,
    shape: TensorShape,
    buffer: Option<Vec<u8>>,
    quant: Option<TensorQuant>,
}

impl TensorDescriptor {
    pub fn new(name: impl Into<String>, shape: TensorShape) -> Self {
        Self {
            name: name.into(),
            shape,
            buffer: None,
            quant: None,
        }
    }

    /// Descriptor for a tensor whose shape is not known yet.
    pub fn unresolved(name: impl Into<String>) -> Self {
        Self::new(name, TensorShape::default())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape(&self) -> &TensorShape {
        &self.shape
    }

    pub fn shape_mut(&mut self) -> &mut TensorShape {
        &mut self.shape
    }

    pub fn data_type(&self) -> DataType {
        self.shape.data_type()
    }

    pub fn data_format(&self) -> DataFormat {
        self.shape.data_format()
    }

    pub fn is_materialized(&self) -> bool {
        self.buffer.is_some()
    }

    pub fn buffer(&self) -> Option<&[u8]> {
        self.buffer.as_deref()
    }

    pub fn set_buffer(&mut self, bytes: Vec<u8>) {
        self.buffer = Some(bytes);
    }

    pub fn quant(&self) -> Option<&TensorQuant> {
        self.quant.as_ref()
    }

    pub fn set_quant(&mut self, quant: TensorQuant) {
        self.quant = Some(quant);
    }

    /// Copies the first element of a materialized integer buffer to the host as `i64`.
    ///
    /// The element width follows the descriptor's data type (`Int32` or `Int64`). Without a
    /// buffer this is `NotYetAvailable` with `input: 0`; callers that know the position go
    /// through [`crate::InputOutputInfo::input_scalar`].
    pub fn copy_scalar_to_host(&self) -> OptResult<i64> {
        let bytes = self.buffer.as_deref().ok_or_else(|| OptError::NotYetAvailable {
            input: 0,
            tensor: self.name.clone(),
        })?;
        match self.data_type() {
            DataType::Int64 => {
                let raw: [u8; 8] = bytes
                    .get(..8)
                    .and_then(|chunk| chunk.try_into().ok())
                    .ok_or_else(|| short_buffer(&self.name, bytes.len(), 8))?;
                Ok(i64::from_le_bytes(raw))
            }
            DataType::Int32 => {
                let raw: [u8; 4] = bytes
                    .get(..4)
                    .and_then(|chunk| chunk.try_into().ok())
                    .ok_or_else(|| short_buffer(&self.name, bytes.len(), 4))?;
                Ok(i64::from(i32::from_le_bytes(raw)))
            }
            other => Err(OptError::unsupported(format!(
                "cannot copy {other} tensor '{}' as an integer scalar",
                self.name
            ))),
        }
    }
}

fn short_buffer(name: &str, len: usize, needed: usize) -> OptError {
    OptError::invalid_shape(format!(
        "buffer of '{name}' holds {len} bytes, need at least {needed}"
    ))
}

/// Owner of every tensor descriptor in a graph, addressed by [`EdgeId`].
#[derive(Debug, Clone, Default)]
pub struct TensorTable {
    tensors: Vec<TensorDescriptor>,
    by_name: HashMap<String, EdgeId>,
}

impl TensorTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, descriptor: TensorDescriptor) -> EdgeId {
        let id = EdgeId(self.tensors.len() as u32);
        self.by_name.insert(descriptor.name.clone(), id);
        self.tensors.push(descriptor);
        id
    }

    /// Panics when `id` does not belong to this table.
    pub fn get(&self, id: EdgeId) -> &TensorDescriptor {
        &self.tensors[id.index()]
    }

    /// Panics when `id` does not belong to this table.
    pub fn get_mut(&mut self, id: EdgeId) -> &mut TensorDescriptor {
        &mut self.tensors[id.index()]
    }

    pub fn find(&self, name: &str) -> Option<EdgeId> {
        self.by_name.get(name).copied()
    }

    /// Attaches host data to a tensor, e.g. after constant folding or an earlier execution pass.
    pub fn materialize(&mut self, id: EdgeId, bytes: Vec<u8>) {
        self.get_mut(id).set_buffer(bytes);
    }

    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EdgeId, &TensorDescriptor)> {
        self.tensors
            .iter()
            .enumerate()
            .map(|(idx, desc)| (EdgeId(idx as u32), desc))
    }
}
