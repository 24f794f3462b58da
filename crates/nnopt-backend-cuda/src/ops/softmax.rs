use std::sync::Arc;

use nnopt::ir::Node;
use nnopt::kernel::{create_kernel_impl_with_param, KernelImpl};
use nnopt::optimizer::{CommonParam, KernelState};
use nnopt::params::SoftmaxParam;
use nnopt::{OpKind, OptKernel, OptKernelOptions, OptResult};

use crate::kernels::SoftmaxKernel;
use crate::BACKEND_NAME;

pub struct SoftmaxOp {
    state: KernelState<SoftmaxParam>,
}

impl SoftmaxOp {
    pub fn new(node: Arc<Node>) -> Self {
        Self {
            state: KernelState::new(node),
        }
    }

    pub(crate) fn create(node: Arc<Node>) -> Box<dyn OptKernel> {
        Box::new(Self::new(node))
    }
}

/// Types follow the requested policy and shapes follow the generic strategy.
impl OptKernel for SoftmaxOp {
    fn node(&self) -> &Arc<Node> {
        self.state.node()
    }

    fn kind(&self) -> OpKind {
        OpKind::Softmax
    }

    fn backend(&self) -> &'static str {
        BACKEND_NAME
    }

    fn init(&mut self, options: &OptKernelOptions<'_>) -> OptResult<()> {
        self.state.load(options)
    }

    fn finalize(&mut self, options: &OptKernelOptions<'_>) -> OptResult<()> {
        self.state.set_common_param(options)
    }

    fn common_param(&self) -> &CommonParam {
        self.state.common_param()
    }

    fn create_kernel_impl(&self) -> OptResult<Box<dyn KernelImpl>> {
        Ok(create_kernel_impl_with_param::<SoftmaxKernel, _>(
            self.state.node().id,
            self.state.param()?,
        ))
    }

    nnopt::pmx_accessors!();
}

nnopt::pmx_kernel!(SoftmaxOp, crate::CUDA_PRIVATE_DATA);
