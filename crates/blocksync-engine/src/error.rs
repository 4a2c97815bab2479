//! Error types for the transformation engine.

use blocksync_corr::CorrespondenceError;
use blocksync_model::{ElementId, ModelError};

use crate::aggregator::ResultAggregator;

/// Failures of the interactive-decision port.
#[derive(Debug, thiserror::Error)]
pub enum DecisionError {
    #[error("decision cancelled: {0}")]
    Cancelled(String),

    #[error("selection {index} out of range for {options} options")]
    OutOfRange { index: usize, options: usize },

    #[error("no scripted answer left for prompt '{0}'")]
    Exhausted(String),

    #[error("expected a {expected} answer for prompt '{prompt}'")]
    WrongAnswerKind {
        prompt: String,
        expected: &'static str,
    },

    #[error("decision provider I/O error: {0}")]
    Io(String),
}

/// Errors that abort a rule.
///
/// Missing correspondences and unsupported combinations are recovered
/// inside rules and never surface here.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("structural invariant violated: {0}")]
    StructuralViolation(String),

    #[error("element {0} referenced by a correspondence is missing from its model")]
    DanglingCorrespondence(ElementId),

    #[error(transparent)]
    Decision(#[from] DecisionError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Correspondence(#[from] CorrespondenceError),
}

/// A failed dispatch: the error plus everything merged before it.
#[derive(Debug, thiserror::Error)]
#[error("rule '{rule}' failed: {error}")]
pub struct DispatchFailure {
    /// Name of the rule whose effect failed.
    pub rule: &'static str,
    #[source]
    pub error: SyncError,
    /// Results accumulated by earlier rules of the same dispatch.
    pub partial: ResultAggregator,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = SyncError::StructuralViolation("message outside message component".into());
        assert!(err.to_string().contains("structural invariant"));

        let err: SyncError = DecisionError::Exhausted("pick".into()).into();
        assert!(err.to_string().contains("pick"));
    }

    #[test]
    fn failure_keeps_partial_results() {
        let failure = DispatchFailure {
            rule: "rename",
            error: SyncError::DanglingCorrespondence(ElementId::nil()),
            partial: ResultAggregator::new(),
        };
        assert!(failure.to_string().contains("rename"));
        assert!(failure.partial.is_empty());
    }
}
