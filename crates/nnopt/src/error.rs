//! Error taxonomy shared by every optimization kernel.

use std::io;
use std::sync::Arc;

use thiserror::Error;

use crate::ir::NodeId;

/// Failures raised while optimizing a single node or while (de)serializing its decisions.
///
/// Everything except [`OptError::NotYetAvailable`] is fatal for the node that produced it.
#[derive(Debug, Clone, Error)]
pub enum OptError {
    #[error("load param of node '{node}' failed: {message}")]
    ParamLoad { node: String, message: String },
    #[error("invalid graph shape: {0}")]
    InvalidGraphShape(String),
    #[error("input {input} ('{tensor}') is not materialized yet")]
    NotYetAvailable { input: usize, tensor: String },
    #[error("unsupported: {0}")]
    Unsupported(String),
    #[error("unknown {schema} tag {tag}")]
    UnknownSchemaTag { schema: &'static str, tag: u8 },
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("i/o error: {0}")]
    Io(Arc<io::Error>),
}

impl From<io::Error> for OptError {
    fn from(err: io::Error) -> Self {
        OptError::Io(Arc::new(err))
    }
}

impl OptError {
    pub fn param_load(node: impl Into<String>, message: impl Into<String>) -> Self {
        OptError::ParamLoad {
            node: node.into(),
            message: message.into(),
        }
    }

    pub fn invalid_shape(message: impl Into<String>) -> Self {
        OptError::InvalidGraphShape(message.into())
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        OptError::Unsupported(message.into())
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        OptError::Serialization(message.into())
    }

    /// Returns `true` when the failure only means "try again once the buffer exists".
    pub fn is_retryable(&self) -> bool {
        matches!(self, OptError::NotYetAvailable { .. })
    }
}

#[cfg(feature = "pmx")]
impl From<bincode::Error> for OptError {
    fn from(err: bincode::Error) -> Self {
        OptError::Serialization(err.to_string())
    }
}

/// Convenience alias for results returned by optimization routines.
pub type OptResult<T> = Result<T, OptError>;

/// Error returned by the driver, naming the node that failed.
#[derive(Debug, Clone, Error)]
#[error("node {node} ('{name}'): {source}")]
pub struct NodeError {
    pub node: NodeId,
    pub name: String,
    #[source]
    pub source: OptError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_not_yet_available_is_retryable() {
        let pending = OptError::NotYetAvailable {
            input: 1,
            tensor: "k".to_string(),
        };
        assert!(pending.is_retryable());
        assert!(!OptError::invalid_shape("arity").is_retryable());
        assert!(!OptError::unsupported("missing input").is_retryable());
        assert!(!OptError::UnknownSchemaTag {
            schema: "OpParamType",
            tag: 9
        }
        .is_retryable());
    }
}
