use std::sync::Arc;

use tracing::error;

use super::{CommonParam, OptKernelOptions};
use crate::error::{OptError, OptResult};
use crate::ir::Node;
use crate::params::{generic_load_param, LoadParam};
use crate::tensor::DataType;

#[cfg(feature = "pmx")]
use crate::pmx::{
    deserialize_op, serialize_op, DeserializationContext, PmxParam, PrivateDataSchema,
    SerializationContext,
};

/// The node, the portable parameter and the committed [`CommonParam`] of one kernel.
///
/// The parameter is owned here and only copied out when an executable kernel is built.
#[derive(Debug)]
pub struct KernelState<P> {
    node: Arc<Node>,
    param: Option<P>,
    common: CommonParam,
}

impl<P: LoadParam> KernelState<P> {
    pub fn new(node: Arc<Node>) -> Self {
        Self {
            node,
            param: None,
            common: CommonParam::default(),
        }
    }

    pub fn node(&self) -> &Arc<Node> {
        &self.node
    }

    /// Loads the parameter from the node's attributes, replacing any previous one.
    pub fn load(&mut self, options: &OptKernelOptions<'_>) -> OptResult<()> {
        self.param = Some(generic_load_param(&self.node, options)?);
        Ok(())
    }

    /// The loaded parameter. Calling this before `init` is an `Unsupported` usage.
    pub fn param(&self) -> OptResult<&P> {
        self.param.as_ref().ok_or_else(|| {
            OptError::unsupported(format!(
                "{} ({}) used before its parameter was loaded",
                self.node.name, self.node.op_type
            ))
        })
    }

    pub fn common_param(&self) -> &CommonParam {
        &self.common
    }

    /// Commits the output types and formats currently selected for the node. Every output
    /// must have a decided data type.
    pub fn set_common_param(&mut self, options: &OptKernelOptions<'_>) -> OptResult<()> {
        let common = CommonParam::from_outputs(&self.node, options.tensors);
        if let Some(idx) = common
            .output_types
            .iter()
            .position(|dtype| *dtype == DataType::Unknown)
        {
            error!(node = %self.node.name, output = idx, "load common param failed");
            return Err(OptError::unsupported(format!(
                "output {idx} of {} has no data type",
                self.node.name
            )));
        }
        self.common = common;
        Ok(())
    }
}

#[cfg(feature = "pmx")]
impl<P: LoadParam + PmxParam> KernelState<P> {
    pub fn serialize(
        &self,
        ctx: &SerializationContext,
        schema: &PrivateDataSchema,
        ds: &mut dyn std::io::Write,
    ) -> OptResult<()> {
        serialize_op(ctx, self.param()?, &self.common, schema, ds)
    }

    /// Replaces both the parameter and the common param, or neither.
    pub fn deserialize(
        &mut self,
        ctx: &DeserializationContext,
        data: &[u8],
        schema: &PrivateDataSchema,
    ) -> OptResult<()> {
        let (param, common) = deserialize_op::<P>(ctx, data, schema)?;
        self.param = Some(param);
        self.common = common;
        Ok(())
    }
}
