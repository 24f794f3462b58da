use crate::error::{OptError, OptResult};
use crate::quant::QuantTable;
use crate::tensor::DataType;
use crate::view::InputOutputInfo;

/// Inputs to type inference that come from the pipeline rather than from the node.
#[derive(Clone, Copy)]
pub struct TypeContext<'a> {
    /// Requested output type; selects the [`TypePolicy`].
    pub requested: DataType,
    pub quant: &'a QuantTable,
}

/// How an output's type is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypePolicy {
    /// Same type as input 0.
    Inherited,
    /// Copied verbatim from the quantization table.
    Quantized,
    /// Forced to an explicitly requested type.
    Explicit(DataType),
}

impl TypePolicy {
    pub fn for_requested(requested: DataType) -> Self {
        match requested {
            DataType::Unknown => TypePolicy::Inherited,
            DataType::Int8 => TypePolicy::Quantized,
            other => TypePolicy::Explicit(other),
        }
    }

    /// Applies the policy to every output.
    pub fn apply(self, info: &mut InputOutputInfo<'_>, quant: &QuantTable) -> OptResult<()> {
        for idx in 0..info.output_count() {
            self.apply_output(info, idx, quant)?;
        }
        Ok(())
    }

    pub fn apply_output(
        self,
        info: &mut InputOutputInfo<'_>,
        idx: usize,
        quant: &QuantTable,
    ) -> OptResult<()> {
        match self {
            TypePolicy::Inherited => infer_inherited_type(info, idx),
            TypePolicy::Quantized => copy_quant_type(info, idx, quant),
            TypePolicy::Explicit(dtype) => {
                info.output_mut(idx).shape_mut().set_data_type(dtype);
                Ok(())
            }
        }
    }
}

pub fn infer_inherited_type(info: &mut InputOutputInfo<'_>, idx: usize) -> OptResult<()> {
    if info.input_count() == 0 {
        return Err(OptError::invalid_shape(
            "inherited type needs at least one input",
        ));
    }
    let dtype = info.input(0).data_type();
    info.output_mut(idx).shape_mut().set_data_type(dtype);
    Ok(())
}

/// Copies the table entry of output `idx` into its descriptor. A missing entry is
/// [`OptError::Unsupported`]; nothing is recomputed or defaulted.
pub fn copy_quant_type(
    info: &mut InputOutputInfo<'_>,
    idx: usize,
    quant: &QuantTable,
) -> OptResult<()> {
    let edge = info.output_id(idx);
    let entry = quant.get(edge).cloned().ok_or_else(|| {
        OptError::unsupported(format!(
            "no quantization entry for output '{}'",
            info.output(idx).name()
        ))
    })?;
    let out = info.output_mut(idx);
    out.shape_mut().set_data_type(entry.data_type);
    out.set_quant(entry);
    Ok(())
}

/// TopK: the policy decides the values output and indices are always `Int32`. An untyped `k`
/// input becomes `Int64`; a `k` typed upstream must be an integer and is kept. A TopK without
/// its `k` input is `Unsupported`.
pub fn infer_topk_type(
    info: &mut InputOutputInfo<'_>,
    policy: TypePolicy,
    quant: &QuantTable,
) -> OptResult<()> {
    policy.apply_output(info, 0, quant)?;
    if info.output_count() > 1 {
        info.output_mut(1).shape_mut().set_data_type(DataType::Int32);
    }
    if info.input_count() != 2 {
        return Err(OptError::unsupported(format!(
            "TopK needs a k input, got {} input(s)",
            info.input_count()
        )));
    }
    match info.input(1).data_type() {
        DataType::Unknown => info.input_mut(1).shape_mut().set_data_type(DataType::Int64),
        dtype if dtype.is_integer() => {}
        dtype => {
            return Err(OptError::unsupported(format!(
                "TopK k input '{}' must be an integer tensor, got {dtype}",
                info.input(1).name()
            )))
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::EdgeId;
    use crate::quant::TensorQuant;
    use crate::tensor::{DataFormat, TensorDescriptor, TensorShape, TensorTable};

    fn setup() -> (TensorTable, Vec<EdgeId>, Vec<EdgeId>) {
        let mut tensors = TensorTable::new();
        let shape = TensorShape::new(&[4, 8], DataType::Float16, DataFormat::Ndarray)
            .unwrap_or_else(|err| panic!("unexpected error: {err}"));
        let x = tensors.add(TensorDescriptor::new("x", shape));
        let y = tensors.add(TensorDescriptor::unresolved("y"));
        (tensors, vec![x], vec![y])
    }

    #[test]
    fn policy_follows_requested_type() {
        assert_eq!(TypePolicy::for_requested(DataType::Unknown), TypePolicy::Inherited);
        assert_eq!(TypePolicy::for_requested(DataType::Int8), TypePolicy::Quantized);
        assert_eq!(
            TypePolicy::for_requested(DataType::Float16),
            TypePolicy::Explicit(DataType::Float16)
        );
    }

    #[test]
    fn explicit_forces_type() {
        let (mut tensors, inputs, outputs) = setup();
        let quant = QuantTable::new();
        let mut info = InputOutputInfo::new(&inputs, &outputs, &mut tensors);
        TypePolicy::Explicit(DataType::Float32)
            .apply(&mut info, &quant)
            .unwrap_or_else(|err| panic!("unexpected error: {err}"));
        assert_eq!(info.output(0).data_type(), DataType::Float32);
    }

    #[test]
    fn quantized_without_entry_is_unsupported() {
        let (mut tensors, inputs, outputs) = setup();
        let quant = QuantTable::new();
        let mut info = InputOutputInfo::new(&inputs, &outputs, &mut tensors);
        let err = TypePolicy::Quantized
            .apply(&mut info, &quant)
            .expect_err("missing entry");
        assert!(matches!(err, OptError::Unsupported(_)));
    }

    #[test]
    fn quantized_copies_entry_verbatim() {
        let (mut tensors, inputs, outputs) = setup();
        let mut quant = QuantTable::new();
        let entry = TensorQuant {
            data_type: DataType::Int8,
            bit_width: 8,
            per_channel: true,
            scale: vec![0.25, 0.125],
            zero_point: vec![1.0, -1.0],
        };
        quant.insert(outputs[0], entry.clone());
        let mut info = InputOutputInfo::new(&inputs, &outputs, &mut tensors);
        copy_quant_type(&mut info, 0, &quant).unwrap_or_else(|err| panic!("unexpected error: {err}"));
        assert_eq!(info.output(0).quant(), Some(&entry));
        assert_eq!(info.output(0).data_type(), DataType::Int8);
    }

    #[test]
    fn topk_forces_index_types() {
        let mut tensors = TensorTable::new();
        let shape = TensorShape::new(&[2, 10], DataType::Float16, DataFormat::Ndarray)
            .unwrap_or_else(|err| panic!("unexpected error: {err}"));
        let x = tensors.add(TensorDescriptor::new("x", shape));
        let k = tensors.add(TensorDescriptor::unresolved("k"));
        let values = tensors.add(TensorDescriptor::unresolved("values"));
        let indices = tensors.add(TensorDescriptor::unresolved("indices"));
        let quant = QuantTable::new();

        let (inputs, outputs) = (vec![x, k], vec![values, indices]);
        let mut info = InputOutputInfo::new(&inputs, &outputs, &mut tensors);
        infer_topk_type(&mut info, TypePolicy::Inherited, &quant)
            .unwrap_or_else(|err| panic!("unexpected error: {err}"));
        assert_eq!(info.output(0).data_type(), DataType::Float16);
        assert_eq!(info.output(1).data_type(), DataType::Int32);
        assert_eq!(info.input(1).data_type(), DataType::Int64);

        let inputs = vec![x];
        let mut info = InputOutputInfo::new(&inputs, &outputs, &mut tensors);
        let err = infer_topk_type(&mut info, TypePolicy::Inherited, &quant)
            .expect_err("k input is missing");
        assert!(matches!(err, OptError::Unsupported(_)));
    }

    #[test]
    fn topk_keeps_integer_k_from_producer() {
        let mut tensors = TensorTable::new();
        let shape = TensorShape::new(&[2, 10], DataType::Float32, DataFormat::Ndarray)
            .unwrap_or_else(|err| panic!("unexpected error: {err}"));
        let x = tensors.add(TensorDescriptor::new("x", shape));
        let k_shape = TensorShape::new(&[1], DataType::Int32, DataFormat::Ndarray)
            .unwrap_or_else(|err| panic!("unexpected error: {err}"));
        let k = tensors.add(TensorDescriptor::new("k", k_shape));
        let values = tensors.add(TensorDescriptor::unresolved("values"));
        let indices = tensors.add(TensorDescriptor::unresolved("indices"));
        let quant = QuantTable::new();

        let (inputs, outputs) = (vec![x, k], vec![values, indices]);
        let mut info = InputOutputInfo::new(&inputs, &outputs, &mut tensors);
        infer_topk_type(&mut info, TypePolicy::Inherited, &quant)
            .unwrap_or_else(|err| panic!("unexpected error: {err}"));
        assert_eq!(info.input(1).data_type(), DataType::Int32);

        info.input_mut(1).shape_mut().set_data_type(DataType::Float32);
        let err = infer_topk_type(&mut info, TypePolicy::Inherited, &quant)
            .expect_err("float k");
        assert!(matches!(err, OptError::Unsupported(_)));
    }
}
