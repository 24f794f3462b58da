//! Build-time catalog of optimization kernels.
//!
//! Backend crates add one [`OptKernelRegistration`] per operator to [`OPT_KERNEL_CATALOG`]
//! with `#[linkme::distributed_slice]`. Linking a backend crate is what makes its kernels
//! available; nothing is registered at runtime.

use std::sync::Arc;

use crate::ir::{Node, OpType};
use crate::optimizer::{OpKind, OptKernel};

/// Constructs an uninitialized optimization kernel for a node.
pub type OptKernelCreator = fn(Arc<Node>) -> Box<dyn OptKernel>;

pub struct OptKernelRegistration {
    pub backend: &'static str,
    pub domain: &'static str,
    pub kind: OpKind,
    /// Inclusive opset range served by this kernel.
    pub min_version: u64,
    pub max_version: u64,
    pub create: OptKernelCreator,
}

impl OptKernelRegistration {
    pub fn matches(&self, backend: &str, op_type: &OpType) -> bool {
        self.backend == backend
            && self.domain == op_type.domain
            && self.kind.op_type() == op_type.name
            && (self.min_version..=self.max_version).contains(&op_type.version)
    }
}

/// Every registered kernel, across all linked backend crates.
///
/// Entries only exist for crates the linker keeps: depending on a backend in `Cargo.toml`
/// is not enough, some symbol of it must be used. Backend crates export a
/// `register_<name>_backend()` function for that purpose.
#[linkme::distributed_slice]
pub static OPT_KERNEL_CATALOG: [OptKernelRegistration] = [..];

pub fn find_registration(backend: &str, op_type: &OpType) -> Option<&'static OptKernelRegistration> {
    OPT_KERNEL_CATALOG
        .iter()
        .find(|entry| entry.matches(backend, op_type))
}

/// Creates the kernel registered for `node` on `backend`, if any.
pub fn create_opt_kernel(backend: &str, node: Arc<Node>) -> Option<Box<dyn OptKernel>> {
    let entry = find_registration(backend, &node.op_type)?;
    Some((entry.create)(node))
}

/// Backend names that registered at least one kernel, sorted.
pub fn list_backends() -> Vec<&'static str> {
    let mut backends: Vec<&'static str> = OPT_KERNEL_CATALOG.iter().map(|e| e.backend).collect();
    backends.sort_unstable();
    backends.dedup();
    backends
}

pub fn list_kinds(backend: &str) -> Vec<OpKind> {
    OPT_KERNEL_CATALOG
        .iter()
        .filter(|entry| entry.backend == backend)
        .map(|entry| entry.kind)
        .collect()
}
