//! Contract between finalized optimization kernels and the runtime.
//!
//! Execution itself belongs to the runtime; this layer only produces the kernel object
//! with its parameter bound.

use std::any::Any;

use crate::ir::NodeId;

/// Executable kernel produced by [`crate::OptKernel::create_kernel_impl`].
pub trait KernelImpl: Send + Sync {
    fn node_id(&self) -> NodeId;

    /// Kernel name, e.g. `"TopKKernel"`.
    fn name(&self) -> &'static str;

    fn backend(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;
}

/// Kernels that are fully described by a node and a portable parameter.
pub trait KernelWithParam<P>: KernelImpl + Sized + 'static {
    fn with_param(node_id: NodeId, param: P) -> Self;

    fn param(&self) -> &P;
}

/// Instantiates `K` with a copy of the finalized parameter.
pub fn create_kernel_impl_with_param<K, P>(node_id: NodeId, param: &P) -> Box<dyn KernelImpl>
where
    K: KernelWithParam<P>,
    P: Clone,
{
    Box::new(K::with_param(node_id, param.clone()))
}

/// Declares a kernel type that carries one portable parameter.
#[macro_export]
macro_rules! param_kernel {
    ($(#[$meta:meta])* $name:ident, $param:ty, $backend:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name {
            node_id: $crate::ir::NodeId,
            param: $param,
        }

        impl $crate::kernel::KernelImpl for $name {
            fn node_id(&self) -> $crate::ir::NodeId {
                self.node_id
            }

            fn name(&self) -> &'static str {
                stringify!($name)
            }

            fn backend(&self) -> &'static str {
                $backend
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }
        }

        impl $crate::kernel::KernelWithParam<$param> for $name {
            fn with_param(node_id: $crate::ir::NodeId, param: $param) -> Self {
                Self { node_id, param }
            }

            fn param(&self) -> &$param {
                &self.param
            }
        }
    };
}

/// Implements [`crate::pmx::PmxSerializable`] for an op that keeps its decisions in a
/// `state: KernelState<_>` field, framing the private data with `$schema`.
///
/// The impl is gated on the calling crate's own `pmx` feature, which must forward to
/// `nnopt/pmx`.
#[macro_export]
macro_rules! pmx_kernel {
    ($op:ty, $schema:expr) => {
        #[cfg(feature = "pmx")]
        impl $crate::pmx::PmxSerializable for $op {
            fn serialize_data(
                &self,
                ctx: &$crate::pmx::SerializationContext,
                ds: &mut dyn ::std::io::Write,
            ) -> $crate::OptResult<()> {
                self.state.serialize(ctx, &$schema, ds)
            }

            fn deserialize_data(
                &mut self,
                ctx: &$crate::pmx::DeserializationContext,
                data: &[u8],
            ) -> $crate::OptResult<()> {
                self.state.deserialize(ctx, data, &$schema)
            }
        }
    };
}

/// `as_pmx`/`as_pmx_mut` for the `OptKernel` impl of an op declared with [`pmx_kernel!`].
#[macro_export]
macro_rules! pmx_accessors {
    () => {
        #[cfg(feature = "pmx")]
        fn as_pmx(&self) -> Option<&dyn $crate::pmx::PmxSerializable> {
            Some(self)
        }

        #[cfg(feature = "pmx")]
        fn as_pmx_mut(&mut self) -> Option<&mut dyn $crate::pmx::PmxSerializable> {
            Some(self)
        }
    };
}
