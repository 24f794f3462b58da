use crate::ir::EdgeId;
use crate::tensor::{DataFormat, DataType};
use crate::view::InputOutputInfo;

/// What a node asked for on an input whose descriptor was already decided upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    Type { from: DataType, to: DataType },
    Format { from: DataFormat, to: DataFormat },
}

/// An input selection that was not written back. The producer's decision stays in the
/// registry and the runtime converts the tensor in front of the consuming node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputConversion {
    pub input: usize,
    pub tensor: EdgeId,
    pub conversion: Conversion,
}

/// Data types chosen for each input and output position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSelection {
    pub inputs: Vec<DataType>,
    pub outputs: Vec<DataType>,
}

impl TypeSelection {
    /// Writes the selection into the node's outputs and into inputs that carry no type yet.
    /// Inputs already typed by their producer are left alone; a differing choice is returned
    /// as an [`InputConversion`].
    pub fn apply(&self, info: &mut InputOutputInfo<'_>) -> Vec<InputConversion> {
        let mut conversions = Vec::new();
        for (idx, &dtype) in self.inputs.iter().enumerate() {
            let current = info.input(idx).data_type();
            if current == DataType::Unknown {
                info.input_mut(idx).shape_mut().set_data_type(dtype);
            } else if current != dtype {
                conversions.push(InputConversion {
                    input: idx,
                    tensor: info.input_id(idx),
                    conversion: Conversion::Type {
                        from: current,
                        to: dtype,
                    },
                });
            }
        }
        for (idx, dtype) in self.outputs.iter().enumerate() {
            info.output_mut(idx).shape_mut().set_data_type(*dtype);
        }
        conversions
    }
}

/// Floating types become `preferred_fp`; integer, bool and undecided types are kept.
pub fn generic_select_data_type(info: &InputOutputInfo<'_>, preferred_fp: DataType) -> TypeSelection {
    let pick = |dtype: DataType| if dtype.is_float() { preferred_fp } else { dtype };
    TypeSelection {
        inputs: (0..info.input_count())
            .map(|idx| pick(info.input(idx).data_type()))
            .collect(),
        outputs: (0..info.output_count())
            .map(|idx| pick(info.output(idx).data_type()))
            .collect(),
    }
}

/// Data formats chosen for each input and output position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSelection {
    pub inputs: Vec<DataFormat>,
    pub outputs: Vec<DataFormat>,
}

impl FormatSelection {
    /// Keeps whatever format each descriptor already carries. Outputs without a format take
    /// the format of input 0.
    pub fn pass_through(info: &InputOutputInfo<'_>) -> Self {
        let fallback = if info.input_count() > 0 {
            info.input(0).data_format()
        } else {
            DataFormat::Unknown
        };
        Self {
            inputs: (0..info.input_count())
                .map(|idx| info.input(idx).data_format())
                .collect(),
            outputs: (0..info.output_count())
                .map(|idx| match info.output(idx).data_format() {
                    DataFormat::Unknown => fallback,
                    format => format,
                })
                .collect(),
        }
    }

    /// Same contract as [`TypeSelection::apply`], for layouts.
    pub fn apply(&self, info: &mut InputOutputInfo<'_>) -> Vec<InputConversion> {
        let mut conversions = Vec::new();
        for (idx, &format) in self.inputs.iter().enumerate() {
            let current = info.input(idx).data_format();
            if current == DataFormat::Unknown {
                info.input_mut(idx).shape_mut().set_data_format(format);
            } else if current != format {
                conversions.push(InputConversion {
                    input: idx,
                    tensor: info.input_id(idx),
                    conversion: Conversion::Format {
                        from: current,
                        to: format,
                    },
                });
            }
        }
        for (idx, format) in self.outputs.iter().enumerate() {
            info.output_mut(idx).shape_mut().set_data_format(*format);
        }
        conversions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::{TensorDescriptor, TensorShape, TensorTable};

    #[test]
    fn generic_selection_keeps_integers_and_fills_output_formats() {
        let mut tensors = TensorTable::new();
        let x = tensors.add(TensorDescriptor::new(
            "x",
            TensorShape::new(&[1, 8], DataType::Float16, DataFormat::N8cx)
                .unwrap_or_else(|err| panic!("unexpected error: {err}")),
        ));
        let ids = tensors.add(TensorDescriptor::new(
            "ids",
            TensorShape::new(&[1], DataType::Int64, DataFormat::Ndarray)
                .unwrap_or_else(|err| panic!("unexpected error: {err}")),
        ));
        let y = tensors.add(TensorDescriptor::unresolved("y"));
        let (inputs, outputs) = (vec![x, ids], vec![y]);
        let info = InputOutputInfo::new(&inputs, &outputs, &mut tensors);

        let types = generic_select_data_type(&info, DataType::Float32);
        assert_eq!(types.inputs, vec![DataType::Float32, DataType::Int64]);
        assert_eq!(types.outputs, vec![DataType::Unknown]);

        let formats = FormatSelection::pass_through(&info);
        assert_eq!(formats.inputs, vec![DataFormat::N8cx, DataFormat::Ndarray]);
        assert_eq!(formats.outputs, vec![DataFormat::N8cx]);
    }

    #[test]
    fn decided_inputs_are_reported_not_overwritten() {
        let mut tensors = TensorTable::new();
        let x = tensors.add(TensorDescriptor::new(
            "x",
            TensorShape::new(&[2, 8], DataType::Float16, DataFormat::N8cx)
                .unwrap_or_else(|err| panic!("unexpected error: {err}")),
        ));
        let k = tensors.add(TensorDescriptor::unresolved("k"));
        let y = tensors.add(TensorDescriptor::unresolved("y"));
        let (inputs, outputs) = (vec![x, k], vec![y]);
        let mut info = InputOutputInfo::new(&inputs, &outputs, &mut tensors);

        let types = TypeSelection {
            inputs: vec![DataType::Float32, DataType::Int64],
            outputs: vec![DataType::Float32],
        };
        let conversions = types.apply(&mut info);
        assert_eq!(
            conversions,
            vec![InputConversion {
                input: 0,
                tensor: x,
                conversion: Conversion::Type {
                    from: DataType::Float16,
                    to: DataType::Float32,
                },
            }]
        );
        assert_eq!(info.input(0).data_type(), DataType::Float16);
        assert_eq!(info.input(1).data_type(), DataType::Int64);
        assert_eq!(info.output(0).data_type(), DataType::Float32);

        let formats = FormatSelection {
            inputs: vec![DataFormat::Ndarray, DataFormat::Ndarray],
            outputs: vec![DataFormat::Ndarray],
        };
        let conversions = formats.apply(&mut info);
        assert_eq!(conversions.len(), 1);
        assert_eq!(
            conversions[0].conversion,
            Conversion::Format {
                from: DataFormat::N8cx,
                to: DataFormat::Ndarray,
            }
        );
        assert_eq!(info.input(0).data_format(), DataFormat::N8cx);
        assert_eq!(info.input(1).data_format(), DataFormat::Ndarray);
    }
}
