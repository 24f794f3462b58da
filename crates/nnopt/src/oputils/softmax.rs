use super::{expect_arity, generic_infer_dims};
use crate::error::OptResult;
use crate::params::SoftmaxParam;
use crate::view::InputOutputInfo;

pub fn reshape_softmax(info: &mut InputOutputInfo<'_>, param: &SoftmaxParam) -> OptResult<()> {
    expect_arity(info, "Softmax", 1, 1)?;
    info.input(0).shape().resolve_axis(i64::from(param.axis))?;
    generic_infer_dims(info)
}
