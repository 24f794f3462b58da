use crate::error::{OptError, OptResult};

/// Why shape inference for a node was postponed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deferral {
    /// Input position whose buffer is missing.
    pub input: usize,
    pub tensor: String,
}

/// Result of a shape-inference attempt, separating "try again later" from hard failure.
#[derive(Debug)]
pub enum ShapeOutcome {
    Resolved,
    Deferred(Deferral),
    Failed(OptError),
}

impl ShapeOutcome {
    pub fn from_result(result: OptResult<()>) -> Self {
        match result {
            Ok(()) => ShapeOutcome::Resolved,
            Err(OptError::NotYetAvailable { input, tensor }) => {
                ShapeOutcome::Deferred(Deferral { input, tensor })
            }
            Err(err) => ShapeOutcome::Failed(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_retryable_from_fatal() {
        assert!(matches!(ShapeOutcome::from_result(Ok(())), ShapeOutcome::Resolved));
        let deferred = ShapeOutcome::from_result(Err(OptError::NotYetAvailable {
            input: 1,
            tensor: "k".to_string(),
        }));
        match deferred {
            ShapeOutcome::Deferred(reason) => {
                assert_eq!(reason.input, 1);
                assert_eq!(reason.tensor, "k");
            }
            other => panic!("expected deferral, got {other:?}"),
        }
        let failed = ShapeOutcome::from_result(Err(OptError::invalid_shape("arity")));
        assert!(matches!(failed, ShapeOutcome::Failed(OptError::InvalidGraphShape(_))));
    }
}
