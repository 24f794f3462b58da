use std::sync::Arc;

use nnopt::ir::Node;
use nnopt::kernel::{create_kernel_impl_with_param, KernelImpl};
use nnopt::optimizer::{
    infer_topk_type, CommonParam, FormatSelection, KernelState, TypeContext, TypePolicy,
};
use nnopt::oputils::{infer_topk_dims, speculative_topk};
use nnopt::params::TopKParam;
use nnopt::{
    DataFormat, InputOutputInfo, OpKind, OptKernel, OptKernelOptions, OptResult, OptimizerConfig,
};
use tracing::debug;

use crate::kernels::TopKKernel;
use crate::BACKEND_NAME;

pub struct TopKOp {
    state: KernelState<TopKParam>,
}

impl TopKOp {
    pub fn new(node: Arc<Node>) -> Self {
        Self {
            state: KernelState::new(node),
        }
    }

    pub(crate) fn create(node: Arc<Node>) -> Box<dyn OptKernel> {
        Box::new(Self::new(node))
    }
}

impl OptKernel for TopKOp {
    fn node(&self) -> &Arc<Node> {
        self.state.node()
    }

    fn kind(&self) -> OpKind {
        OpKind::TopK
    }

    fn backend(&self) -> &'static str {
        BACKEND_NAME
    }

    fn init(&mut self, options: &OptKernelOptions<'_>) -> OptResult<()> {
        self.state.load(options)
    }

    fn select_format(&self, info: &InputOutputInfo<'_>) -> OptResult<FormatSelection> {
        Ok(FormatSelection {
            inputs: vec![DataFormat::Ndarray; info.input_count()],
            outputs: vec![DataFormat::Ndarray; info.output_count()],
        })
    }

    fn infer_type(&self, info: &mut InputOutputInfo<'_>, cx: &TypeContext<'_>) -> OptResult<()> {
        infer_topk_type(info, TypePolicy::for_requested(cx.requested), cx.quant)
    }

    fn infer_dims(&self, info: &mut InputOutputInfo<'_>) -> OptResult<()> {
        infer_topk_dims(info, self.state.param()?)
    }

    fn infer_unsafe_dims(
        &self,
        info: &mut InputOutputInfo<'_>,
        config: &OptimizerConfig,
    ) -> OptResult<()> {
        debug!(
            node = %self.state.node().name,
            placeholder = config.speculative_dim,
            "speculative TopK shapes"
        );
        speculative_topk(info, self.state.param()?, config.speculative_dim)
    }

    fn finalize(&mut self, options: &OptKernelOptions<'_>) -> OptResult<()> {
        self.state.set_common_param(options)
    }

    fn common_param(&self) -> &CommonParam {
        self.state.common_param()
    }

    fn create_kernel_impl(&self) -> OptResult<Box<dyn KernelImpl>> {
        Ok(create_kernel_impl_with_param::<TopKKernel, _>(
            self.state.node().id,
            self.state.param()?,
        ))
    }

    nnopt::pmx_accessors!();
}

nnopt::pmx_kernel!(TopKOp, crate::ARM_PRIVATE_DATA);
