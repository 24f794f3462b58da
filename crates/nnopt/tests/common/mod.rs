//! Reference kernels registered under the `"reference"` backend for driver and archive tests.

#![allow(dead_code)]

use std::sync::Arc;

use nnopt::ir::{Attributes, EdgeId, Graph, Node, OpType, ONNX_DOMAIN};
use nnopt::kernel::{create_kernel_impl_with_param, KernelImpl};
use nnopt::optimizer::{infer_topk_type, CommonParam, KernelState, TypeContext, TypePolicy};
use nnopt::oputils::{infer_topk_dims, reshape_softmax, speculative_topk};
use nnopt::params::{SoftmaxParam, TopKParam};
use nnopt::registry::{OptKernelRegistration, OPT_KERNEL_CATALOG};
use nnopt::{
    DataFormat, DataType, InputOutputInfo, OpKind, OptKernel, OptKernelOptions, OptResult,
    OptimizerConfig, TensorDescriptor, TensorShape, TensorTable,
};

pub const BACKEND: &str = "reference";

#[cfg(feature = "pmx")]
const SCHEMA: nnopt::pmx::PrivateDataSchema =
    nnopt::pmx::PrivateDataSchema::new(BACKEND, *b"NNRF");

nnopt::param_kernel!(RefSoftmaxKernel, SoftmaxParam, BACKEND);
nnopt::param_kernel!(RefTopKKernel, TopKParam, BACKEND);

#[linkme::distributed_slice(OPT_KERNEL_CATALOG)]
static REF_SOFTMAX: OptKernelRegistration = OptKernelRegistration {
    backend: BACKEND,
    domain: ONNX_DOMAIN,
    kind: OpKind::Softmax,
    min_version: 1,
    max_version: 21,
    create: create_softmax,
};

#[linkme::distributed_slice(OPT_KERNEL_CATALOG)]
static REF_TOPK: OptKernelRegistration = OptKernelRegistration {
    backend: BACKEND,
    domain: ONNX_DOMAIN,
    kind: OpKind::TopK,
    min_version: 10,
    max_version: 21,
    create: create_topk,
};

fn create_softmax(node: Arc<Node>) -> Box<dyn OptKernel> {
    Box::new(RefSoftmax {
        state: KernelState::new(node),
    })
}

fn create_topk(node: Arc<Node>) -> Box<dyn OptKernel> {
    Box::new(RefTopK {
        state: KernelState::new(node),
    })
}

pub struct RefSoftmax {
    state: KernelState<SoftmaxParam>,
}

impl OptKernel for RefSoftmax {
    fn node(&self) -> &Arc<Node> {
        self.state.node()
    }

    fn kind(&self) -> OpKind {
        OpKind::Softmax
    }

    fn backend(&self) -> &'static str {
        BACKEND
    }

    fn init(&mut self, options: &OptKernelOptions<'_>) -> OptResult<()> {
        self.state.load(options)
    }

    fn infer_dims(&self, info: &mut InputOutputInfo<'_>) -> OptResult<()> {
        reshape_softmax(info, self.state.param()?)
    }

    fn finalize(&mut self, options: &OptKernelOptions<'_>) -> OptResult<()> {
        self.state.set_common_param(options)
    }

    fn common_param(&self) -> &CommonParam {
        self.state.common_param()
    }

    fn create_kernel_impl(&self) -> OptResult<Box<dyn KernelImpl>> {
        Ok(create_kernel_impl_with_param::<RefSoftmaxKernel, _>(
            self.state.node().id,
            self.state.param()?,
        ))
    }

    nnopt::pmx_accessors!();
}

nnopt::pmx_kernel!(RefSoftmax, SCHEMA);

pub struct RefTopK {
    state: KernelState<TopKParam>,
}

impl OptKernel for RefTopK {
    fn node(&self) -> &Arc<Node> {
        self.state.node()
    }

    fn kind(&self) -> OpKind {
        OpKind::TopK
    }

    fn backend(&self) -> &'static str {
        BACKEND
    }

    fn init(&mut self, options: &OptKernelOptions<'_>) -> OptResult<()> {
        self.state.load(options)
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
        speculative_topk(info, self.state.param()?, config.speculative_dim)
    }

    fn finalize(&mut self, options: &OptKernelOptions<'_>) -> OptResult<()> {
        self.state.set_common_param(options)
    }

    fn common_param(&self) -> &CommonParam {
        self.state.common_param()
    }

    fn create_kernel_impl(&self) -> OptResult<Box<dyn KernelImpl>> {
        Ok(create_kernel_impl_with_param::<RefTopKKernel, _>(
            self.state.node().id,
            self.state.param()?,
        ))
    }

    nnopt::pmx_accessors!();
}

nnopt::pmx_kernel!(RefTopK, SCHEMA);

/// `x[2,10] -> TopK(axis=-1, k) -> (values, indices)`, then `values -> Softmax -> probs`.
pub struct TopKSoftmaxGraph {
    pub graph: Graph,
    pub tensors: TensorTable,
    pub k: EdgeId,
    pub values: EdgeId,
    pub indices: EdgeId,
    pub probs: EdgeId,
}

pub fn topk_softmax_graph() -> TopKSoftmaxGraph {
    let mut tensors = TensorTable::new();
    let shape = TensorShape::new(&[2, 10], DataType::Float32, DataFormat::Ndarray).unwrap();
    let x = tensors.add(TensorDescriptor::new("x", shape));
    let k = tensors.add(TensorDescriptor::unresolved("k"));
    let values = tensors.add(TensorDescriptor::unresolved("values"));
    let indices = tensors.add(TensorDescriptor::unresolved("indices"));
    let probs = tensors.add(TensorDescriptor::unresolved("probs"));

    let mut graph = Graph::new();
    graph.add_node(
        "topk",
        OpType::onnx("TopK", 11),
        vec![x, k],
        vec![values, indices],
        Attributes::new(),
    );
    graph.add_node(
        "softmax",
        OpType::onnx("Softmax", 13),
        vec![values],
        vec![probs],
        Attributes::new(),
    );
    TopKSoftmaxGraph {
        graph,
        tensors,
        k,
        values,
        indices,
        probs,
    }
}

pub fn reference_config() -> OptimizerConfig {
    OptimizerConfig::for_backend(BACKEND)
}
