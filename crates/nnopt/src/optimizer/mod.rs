//! The per-node optimization kernel contract.
//!
//! An [`OptKernel`] binds one graph node to its operator-specific strategies. The driver
//! calls, in this order and on one thread of control:
//! 1. [`OptKernel::init`] to load the portable parameter,
//! 2. [`OptKernel::select_data_type`] and [`OptKernel::select_format`],
//! 3. [`OptKernel::infer_type`] and [`OptKernel::infer_dims`] (falling back to
//!    [`OptKernel::infer_unsafe_dims`] while a data dependency is pending),
//! 4. [`OptKernel::finalize`] to commit the [`CommonParam`],
//! 5. [`OptKernel::create_kernel_impl`] to build the executable kernel.
//!
//! Each strategy has a generic default; operators override only what differs.

mod common;
mod outcome;
mod select;
mod state;
mod type_infer;

use std::fmt;
use std::sync::Arc;

pub use common::CommonParam;
pub use outcome::{Deferral, ShapeOutcome};
pub use select::{
    generic_select_data_type, Conversion, FormatSelection, InputConversion, TypeSelection,
};
pub use state::KernelState;
pub use type_infer::{
    copy_quant_type, infer_inherited_type, infer_topk_type, TypeContext, TypePolicy,
};

use crate::config::OptimizerConfig;
use crate::error::OptResult;
use crate::ir::{Graph, Node};
use crate::kernel::KernelImpl;
use crate::oputils::generic_infer_dims;
use crate::quant::QuantTable;
use crate::tensor::{DataType, TensorTable};
use crate::view::InputOutputInfo;

#[cfg(feature = "pmx")]
use crate::pmx::PmxSerializable;

/// Operator types with an optimization kernel in this build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Cast,
    Softmax,
    TopK,
}

impl OpKind {
    pub const ALL: [OpKind; 3] = [OpKind::Cast, OpKind::Softmax, OpKind::TopK];

    /// ONNX operator type name.
    pub fn op_type(self) -> &'static str {
        match self {
            OpKind::Cast => "Cast",
            OpKind::Softmax => "Softmax",
            OpKind::TopK => "TopK",
        }
    }

    pub fn from_op_type(name: &str) -> Option<Self> {
        OpKind::ALL.into_iter().find(|kind| kind.op_type() == name)
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.op_type())
    }
}

/// Read-only services handed to [`OptKernel::init`] and [`OptKernel::finalize`].
#[derive(Clone, Copy)]
pub struct OptKernelOptions<'a> {
    pub graph: &'a Graph,
    pub tensors: &'a TensorTable,
    pub quant: &'a QuantTable,
    pub config: &'a OptimizerConfig,
}

/// Compile-time decisions for one node on one backend.
pub trait OptKernel: Send {
    fn node(&self) -> &Arc<Node>;

    fn kind(&self) -> OpKind;

    /// Name of the backend this kernel belongs to.
    fn backend(&self) -> &'static str;

    /// Loads the portable parameter from the node's attribute list.
    fn init(&mut self, options: &OptKernelOptions<'_>) -> OptResult<()>;

    fn select_data_type(
        &self,
        info: &InputOutputInfo<'_>,
        preferred_fp: DataType,
    ) -> OptResult<TypeSelection> {
        Ok(generic_select_data_type(info, preferred_fp))
    }

    fn select_format(&self, info: &InputOutputInfo<'_>) -> OptResult<FormatSelection> {
        Ok(FormatSelection::pass_through(info))
    }

    fn infer_type(&self, info: &mut InputOutputInfo<'_>, cx: &TypeContext<'_>) -> OptResult<()> {
        TypePolicy::for_requested(cx.requested).apply(info, cx.quant)
    }

    /// Authoritative shape inference. Returns [`crate::OptError::NotYetAvailable`] when a
    /// needed input buffer is not materialized.
    fn infer_dims(&self, info: &mut InputOutputInfo<'_>) -> OptResult<()> {
        generic_infer_dims(info)
    }

    /// Best-effort shapes for planning before data dependencies resolve. Never authoritative.
    fn infer_unsafe_dims(
        &self,
        info: &mut InputOutputInfo<'_>,
        _config: &OptimizerConfig,
    ) -> OptResult<()> {
        self.infer_dims(info)
    }

    /// Commits the [`CommonParam`] from the types and formats selected for the outputs.
    fn finalize(&mut self, options: &OptKernelOptions<'_>) -> OptResult<()>;

    fn common_param(&self) -> &CommonParam;

    /// Builds the executable kernel with the parameter bound. Must not mutate `self`.
    fn create_kernel_impl(&self) -> OptResult<Box<dyn KernelImpl>>;

    #[cfg(feature = "pmx")]
    fn as_pmx(&self) -> Option<&dyn PmxSerializable> {
        None
    }

    #[cfg(feature = "pmx")]
    fn as_pmx_mut(&mut self) -> Option<&mut dyn PmxSerializable> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn op_kind_round_trips_through_name() {
        for kind in OpKind::ALL {
            assert_eq!(OpKind::from_op_type(kind.op_type()), Some(kind));
        }
        assert_eq!(OpKind::from_op_type("Relu"), None);
    }
}
