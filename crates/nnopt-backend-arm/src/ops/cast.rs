use std::sync::Arc;

use nnopt::ir::Node;
use nnopt::kernel::{create_kernel_impl_with_param, KernelImpl};
use nnopt::optimizer::{
    generic_select_data_type, CommonParam, FormatSelection, KernelState, TypeContext,
    TypeSelection,
};
use nnopt::oputils::{expect_arity, reshape_cast};
use nnopt::params::CastParam;
use nnopt::{DataType, InputOutputInfo, OpKind, OptKernel, OptKernelOptions, OptResult};

use crate::kernels::CastKernel;
use crate::BACKEND_NAME;

pub struct CastOp {
    state: KernelState<CastParam>,
}

impl CastOp {
    pub fn new(node: Arc<Node>) -> Self {
        Self {
            state: KernelState::new(node),
        }
    }

    pub(crate) fn create(node: Arc<Node>) -> Box<dyn OptKernel> {
        Box::new(Self::new(node))
    }
}

impl OptKernel for CastOp {
    fn node(&self) -> &Arc<Node> {
        self.state.node()
    }

    fn kind(&self) -> OpKind {
        OpKind::Cast
    }

    fn backend(&self) -> &'static str {
        BACKEND_NAME
    }

    fn init(&mut self, options: &OptKernelOptions<'_>) -> OptResult<()> {
        self.state.load(options)
    }

    fn select_data_type(
        &self,
        info: &InputOutputInfo<'_>,
        preferred_fp: DataType,
    ) -> OptResult<TypeSelection> {
        expect_arity(info, "Cast", 1, 1)?;
        let mut selection = generic_select_data_type(info, preferred_fp);
        selection.outputs[0] = self.state.param()?.to;
        Ok(selection)
    }

    /// Input and output share the input's layout.
    fn select_format(&self, info: &InputOutputInfo<'_>) -> OptResult<FormatSelection> {
        expect_arity(info, "Cast", 1, 1)?;
        let format = info.input(0).data_format();
        Ok(FormatSelection {
            inputs: vec![format],
            outputs: vec![format],
        })
    }

    fn infer_type(&self, info: &mut InputOutputInfo<'_>, _cx: &TypeContext<'_>) -> OptResult<()> {
        let to = self.state.param()?.to;
        info.output_mut(0).shape_mut().set_data_type(to);
        Ok(())
    }

    fn infer_dims(&self, info: &mut InputOutputInfo<'_>) -> OptResult<()> {
        reshape_cast(info, self.state.param()?)
    }

    fn finalize(&mut self, options: &OptKernelOptions<'_>) -> OptResult<()> {
        self.state.set_common_param(options)
    }

    fn common_param(&self) -> &CommonParam {
        self.state.common_param()
    }

    fn create_kernel_impl(&self) -> OptResult<Box<dyn KernelImpl>> {
        Ok(create_kernel_impl_with_param::<CastKernel, _>(
            self.state.node().id,
            self.state.param()?,
        ))
    }

    nnopt::pmx_accessors!();
}

nnopt::pmx_kernel!(CastOp, crate::ARM_PRIVATE_DATA);
