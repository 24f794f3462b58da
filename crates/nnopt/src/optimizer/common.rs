use crate::ir::Node;
use crate::tensor::{DataFormat, DataType, TensorTable};

/// Backend-side decisions that are not part of the portable parameter: the data type and
/// data format selected for every output, as parallel sequences.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommonParam {
    pub output_types: Vec<DataType>,
    pub output_formats: Vec<DataFormat>,
}

impl CommonParam {
    /// Snapshots the selected types and formats of `node`'s outputs.
    pub fn from_outputs(node: &Node, tensors: &TensorTable) -> Self {
        let (output_types, output_formats) = node
            .outputs
            .iter()
            .map(|&edge| {
                let desc = tensors.get(edge);
                (desc.data_type(), desc.data_format())
            })
            .unzip();
        Self {
            output_types,
            output_formats,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.output_types.is_empty() && self.output_formats.is_empty()
    }
}
