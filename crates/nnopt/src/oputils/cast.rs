use super::expect_arity;
use crate::error::OptResult;
use crate::params::CastParam;
use crate::view::InputOutputInfo;

/// Output keeps the input dimensions and takes the target type.
pub fn reshape_cast(info: &mut InputOutputInfo<'_>, param: &CastParam) -> OptResult<()> {
    expect_arity(info, "Cast", 1, 1)?;
    let dims = info.input(0).shape().dims().to_vec();
    let out = info.output_mut(0).shape_mut();
    out.reshape(&dims)?;
    out.set_data_type(param.to);
    Ok(())
}
