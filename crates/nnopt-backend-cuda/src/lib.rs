//! CUDA optimization kernels.
//!
//! Linking this crate registers Cast, Softmax and TopK for the `"cuda"` backend. Softmax
//! and TopK pick their output types through [`nnopt::optimizer::TypePolicy`], so an `Int8`
//! request copies the quantization table entry of each output.

mod kernels;
mod ops;

pub use kernels::{CastKernel, SoftmaxKernel, TopKKernel};
pub use ops::{CastOp, SoftmaxOp, TopKOp};

use nnopt::ir::ONNX_DOMAIN;
#[cfg(feature = "pmx")]
use nnopt::pmx::PrivateDataSchema;
use nnopt::registry::OptKernelRegistration;
use nnopt::OpKind;
use tracing::debug;

pub const BACKEND_NAME: &str = "cuda";

#[cfg(feature = "pmx")]
pub const CUDA_PRIVATE_DATA: PrivateDataSchema = PrivateDataSchema::new(BACKEND_NAME, *b"NNCU");

/// Newest ONNX opset served by this backend.
const MAX_OPSET: u64 = 21;

#[nnopt::linkme::distributed_slice(nnopt::registry::OPT_KERNEL_CATALOG)]
static CUDA_CAST: OptKernelRegistration = OptKernelRegistration {
    backend: BACKEND_NAME,
    domain: ONNX_DOMAIN,
    kind: OpKind::Cast,
    min_version: 6,
    max_version: MAX_OPSET,
    create: CastOp::create,
};

#[nnopt::linkme::distributed_slice(nnopt::registry::OPT_KERNEL_CATALOG)]
static CUDA_SOFTMAX: OptKernelRegistration = OptKernelRegistration {
    backend: BACKEND_NAME,
    domain: ONNX_DOMAIN,
    kind: OpKind::Softmax,
    min_version: 1,
    max_version: MAX_OPSET,
    create: SoftmaxOp::create,
};

// `k` became an input in opset 10.
#[nnopt::linkme::distributed_slice(nnopt::registry::OPT_KERNEL_CATALOG)]
static CUDA_TOPK: OptKernelRegistration = OptKernelRegistration {
    backend: BACKEND_NAME,
    domain: ONNX_DOMAIN,
    kind: OpKind::TopK,
    min_version: 10,
    max_version: MAX_OPSET,
    create: TopKOp::create,
};

/// Keeps this crate's catalog entries in the final binary and logs them.
///
/// Call once from code that depends on this backend. A backend crate that nothing references
/// is not linked, and its entries never reach the catalog.
pub fn register_cuda_backend() {
    for entry in registrations() {
        debug!(backend = entry.backend, op = %entry.kind, "optimization kernel registered");
    }
}

/// Catalog entries contributed by this backend.
pub fn registrations() -> [&'static OptKernelRegistration; 3] {
    [&CUDA_CAST, &CUDA_SOFTMAX, &CUDA_TOPK]
}
