//! ARM (NEON/SVE) optimization kernels.
//!
//! Linking this crate registers Cast, Softmax and TopK for the `"arm"` backend in
//! [`nnopt::registry::OPT_KERNEL_CATALOG`]. Reduction kernels on this backend only read
//! plain `Ndarray` layouts, so Softmax and TopK pin their formats; Cast keeps whatever
//! layout its input arrives in.

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

/// Catalog name of this backend.
pub const BACKEND_NAME: &str = "arm";

/// Inner container holding this backend's private data.
#[cfg(feature = "pmx")]
pub const ARM_PRIVATE_DATA: PrivateDataSchema = PrivateDataSchema::new(BACKEND_NAME, *b"NNAR");

/// Newest ONNX opset served by this backend.
const MAX_OPSET: u64 = 21;

#[nnopt::linkme::distributed_slice(nnopt::registry::OPT_KERNEL_CATALOG)]
static ARM_CAST: OptKernelRegistration = OptKernelRegistration {
    backend: BACKEND_NAME,
    domain: ONNX_DOMAIN,
    kind: OpKind::Cast,
    min_version: 6,
    max_version: MAX_OPSET,
    create: CastOp::create,
};

#[nnopt::linkme::distributed_slice(nnopt::registry::OPT_KERNEL_CATALOG)]
static ARM_SOFTMAX: OptKernelRegistration = OptKernelRegistration {
    backend: BACKEND_NAME,
    domain: ONNX_DOMAIN,
    kind: OpKind::Softmax,
    min_version: 1,
    max_version: MAX_OPSET,
    create: SoftmaxOp::create,
};

// `k` became an input in opset 10.
#[nnopt::linkme::distributed_slice(nnopt::registry::OPT_KERNEL_CATALOG)]
static ARM_TOPK: OptKernelRegistration = OptKernelRegistration {
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
pub fn register_arm_backend() {
    for entry in registrations() {
        debug!(backend = entry.backend, op = %entry.kind, "optimization kernel registered");
    }
}

/// Catalog entries contributed by this backend.
pub fn registrations() -> [&'static OptKernelRegistration; 3] {
    [&ARM_CAST, &ARM_SOFTMAX, &ARM_TOPK]
}
