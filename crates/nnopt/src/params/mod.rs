//! Portable operator parameters and the generic attribute loader.

mod cast;
mod softmax;
mod topk;

pub use cast::CastParam;
pub use softmax::SoftmaxParam;
pub use topk::TopKParam;

use tracing::error;

use crate::error::{OptError, OptResult};
use crate::ir::{Attributes, Node, OpType};
use crate::optimizer::OptKernelOptions;

/// Conversion from a node's attribute list into a strongly typed parameter set.
pub trait LoadParam: Sized {
    fn load(op_type: &OpType, attrs: &Attributes) -> Result<Self, String>;
}

/// Loads `P` for `node` from the graph held by `options`.
///
/// Failures are logged and surfaced as [`OptError::ParamLoad`].
pub fn generic_load_param<P: LoadParam>(
    node: &Node,
    options: &OptKernelOptions<'_>,
) -> OptResult<P> {
    let attrs = options
        .graph
        .attributes(node.id)
        .ok_or_else(|| OptError::param_load(&node.name, "node has no attribute list"))?;
    P::load(&node.op_type, attrs).map_err(|message| {
        error!(node = %node.name, op = %node.op_type, "load param failed: {message}");
        OptError::param_load(&node.name, message)
    })
}

fn axis_attr(attrs: &Attributes, default: i64) -> Result<i32, String> {
    let axis = attrs.int_or("axis", default)?;
    i32::try_from(axis).map_err(|_| format!("axis {axis} does not fit in i32"))
}

fn flag_attr(attrs: &Attributes, name: &str, default: bool) -> Result<bool, String> {
    match attrs.int_or(name, i64::from(default))? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(format!("attribute '{name}' must be 0 or 1, found {other}")),
    }
}
