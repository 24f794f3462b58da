//! Positional view over one node's input and output descriptors.

use crate::error::{OptError, OptResult};
use crate::ir::{EdgeId, Node};
use crate::tensor::{TensorDescriptor, TensorTable};

/// Addresses a node's tensors by position. The view borrows the registry; it never owns
/// descriptors.
///
/// Indexing past [`input_count`](Self::input_count) or [`output_count`](Self::output_count)
/// is a caller bug and panics.
pub struct InputOutputInfo<'a> {
    inputs: &'a [EdgeId],
    outputs: &'a [EdgeId],
    tensors: &'a mut TensorTable,
}

impl<'a> InputOutputInfo<'a> {
    pub fn new(inputs: &'a [EdgeId], outputs: &'a [EdgeId], tensors: &'a mut TensorTable) -> Self {
        Self {
            inputs,
            outputs,
            tensors,
        }
    }

    pub fn for_node(node: &'a Node, tensors: &'a mut TensorTable) -> Self {
        Self::new(&node.inputs, &node.outputs, tensors)
    }

    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    pub fn input_id(&self, idx: usize) -> EdgeId {
        self.inputs[idx]
    }

    pub fn output_id(&self, idx: usize) -> EdgeId {
        self.outputs[idx]
    }

    pub fn input(&self, idx: usize) -> &TensorDescriptor {
        self.tensors.get(self.inputs[idx])
    }

    pub fn input_mut(&mut self, idx: usize) -> &mut TensorDescriptor {
        self.tensors.get_mut(self.inputs[idx])
    }

    /// Reads the scalar held by input `idx`. A missing buffer is reported against `idx`.
    pub fn input_scalar(&self, idx: usize) -> OptResult<i64> {
        self.input(idx)
            .copy_scalar_to_host()
            .map_err(|err| match err {
                OptError::NotYetAvailable { tensor, .. } => {
                    OptError::NotYetAvailable { input: idx, tensor }
                }
                other => other,
            })
    }

    pub fn output(&self, idx: usize) -> &TensorDescriptor {
        self.tensors.get(self.outputs[idx])
    }

    pub fn output_mut(&mut self, idx: usize) -> &mut TensorDescriptor {
        self.tensors.get_mut(self.outputs[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::{DataFormat, DataType, TensorShape};

    #[test]
    fn missing_scalar_names_its_input_position() {
        let mut tensors = TensorTable::new();
        let x = tensors.add(TensorDescriptor::unresolved("x"));
        let shape = TensorShape::new(&[1], DataType::Int64, DataFormat::Ndarray)
            .unwrap_or_else(|err| panic!("unexpected error: {err}"));
        let k = tensors.add(TensorDescriptor::new("k", shape));
        let y = tensors.add(TensorDescriptor::unresolved("y"));
        let (inputs, outputs) = (vec![x, k], vec![y]);

        let info = InputOutputInfo::new(&inputs, &outputs, &mut tensors);
        match info.input_scalar(1) {
            Err(OptError::NotYetAvailable { input, tensor }) => {
                assert_eq!(input, 1);
                assert_eq!(tensor, "k");
            }
            other => panic!("expected a pending input, got {other:?}"),
        }

        tensors.materialize(k, 4i64.to_le_bytes().to_vec());
        let info = InputOutputInfo::new(&inputs, &outputs, &mut tensors);
        assert_eq!(info.input_scalar(1).ok(), Some(4));
    }
}
