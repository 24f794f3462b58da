//! Shape derivation formulas shared by every backend.

mod cast;
mod softmax;
mod topk;

pub use cast::reshape_cast;
pub use softmax::reshape_softmax;
pub use topk::{infer_topk_dims, reshape_topk, speculative_topk};

use crate::error::{OptError, OptResult};
use crate::view::InputOutputInfo;

/// Every output takes the dimensions of input 0.
pub fn generic_infer_dims(info: &mut InputOutputInfo<'_>) -> OptResult<()> {
    if info.input_count() == 0 {
        return Err(OptError::invalid_shape("node has no inputs"));
    }
    let dims = info.input(0).shape().dims().to_vec();
    for idx in 0..info.output_count() {
        info.output_mut(idx).shape_mut().reshape(&dims)?;
    }
    Ok(())
}

/// Fails with `InvalidGraphShape` unless the node has exactly the given arity.
pub fn expect_arity(
    info: &InputOutputInfo<'_>,
    op: &str,
    inputs: usize,
    outputs: usize,
) -> OptResult<()> {
    if info.input_count() != inputs || info.output_count() != outputs {
        return Err(OptError::invalid_shape(format!(
            "{op} expects {inputs} input(s) and {outputs} output(s), got {} and {}",
            info.input_count(),
            info.output_count()
        )));
    }
    Ok(())
}
