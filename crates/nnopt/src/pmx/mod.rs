//! Binary container serialization of optimization kernels.
//!
//! A serialized kernel is an outer container tagged with the [`OpParamType`] of its portable
//! parameter. Its payload embeds the finished bytes of an inner, independently tagged
//! container holding backend-private data ([`PrivateDataType`]), today the
//! [`CommonParam`](crate::optimizer::CommonParam). Both containers are length-framed and
//! checksummed; decoding reverses the nesting and rejects unknown tags.

mod archive;
mod container;
mod op_param;
mod private_data;

use std::io::Write;

pub use archive::KernelArchive;
pub use container::{Container, FORMAT_VERSION};
pub use op_param::{deserialize_op, serialize_op, OpParamType, PmxParam};
pub use private_data::{OutputData, PrivateDataSchema, PrivateDataType};

use crate::error::OptResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializationContext {
    pub format_version: u16,
}

impl Default for SerializationContext {
    fn default() -> Self {
        Self {
            format_version: FORMAT_VERSION,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeserializationContext {
    pub format_version: u16,
}

impl Default for DeserializationContext {
    fn default() -> Self {
        Self {
            format_version: FORMAT_VERSION,
        }
    }
}

/// Optional capability of an optimization kernel: freeze and restore its decisions.
pub trait PmxSerializable {
    fn serialize_data(&self, ctx: &SerializationContext, ds: &mut dyn Write) -> OptResult<()>;

    /// Replaces the parameter and common param. On error the kernel is left untouched.
    fn deserialize_data(&mut self, ctx: &DeserializationContext, data: &[u8]) -> OptResult<()>;
}
