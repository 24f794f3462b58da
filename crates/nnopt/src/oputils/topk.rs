use super::expect_arity;
use crate::error::{OptError, OptResult};
use crate::params::TopKParam;
use crate::view::InputOutputInfo;

/// Values and indices both take input 0's dimensions with the reduced axis set to `k`.
pub fn reshape_topk(info: &mut InputOutputInfo<'_>, param: &TopKParam, k: i64) -> OptResult<()> {
    expect_arity(info, "TopK", 2, 2)?;
    let in_shape = info.input(0).shape();
    let axis = in_shape.resolve_axis(i64::from(param.axis))?;
    let extent = in_shape.dim(axis);
    if k < 0 || (extent >= 0 && k > extent) {
        return Err(OptError::invalid_shape(format!(
            "k = {k} is out of range for axis {axis} of extent {extent}"
        )));
    }
    let mut dims = in_shape.dims().to_vec();
    dims[axis] = k;
    for idx in 0..info.output_count() {
        info.output_mut(idx).shape_mut().reshape(&dims)?;
    }
    Ok(())
}

/// Data-dependent shape inference: reads `k` from input 1 and applies [`reshape_topk`].
/// Returns `NotYetAvailable` while the `k` buffer is not materialized.
pub fn infer_topk_dims(info: &mut InputOutputInfo<'_>, param: &TopKParam) -> OptResult<()> {
    expect_arity(info, "TopK", 2, 2)?;
    let k = info.input_scalar(1)?;
    reshape_topk(info, param, k)
}

/// Planning-only estimate used before `k` is known: every output copies input 0's rank and
/// dimensions, and the reduced axis is replaced by `placeholder`.
pub fn speculative_topk(
    info: &mut InputOutputInfo<'_>,
    param: &TopKParam,
    placeholder: i64,
) -> OptResult<()> {
    if info.input_count() == 0 {
        return Err(OptError::invalid_shape("TopK has no data input"));
    }
    let in_shape = info.input(0).shape();
    let mut dims = in_shape.dims().to_vec();
    if !dims.is_empty() {
        let axis = in_shape.resolve_axis(i64::from(param.axis))?;
        dims[axis] = placeholder;
    }
    for idx in 0..info.output_count() {
        info.output_mut(idx).shape_mut().reshape(&dims)?;
    }
    Ok(())
}
