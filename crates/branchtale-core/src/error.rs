//! Domain error types.

use thiserror::Error;

/// Errors that escape the orchestrator, the story engine and the play
/// session. Transient "job not yet visible" poll results never become a
/// `DomainError`; they are absorbed by the poll schedule.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DomainError {
    /// The caller supplied unusable input, or called an operation in a phase
    /// that does not allow it.
    #[error("validation error: {0}")]
    Validation(String),

    /// The generation service reported the job as failed.
    #[error("generation failed: {0}")]
    GenerationFailure(String),

    /// Talking to the service failed for a reason other than "not found".
    #[error("transport error: {0}")]
    Transport(String),

    /// A story graph violates its closure invariant, or a choice targets a
    /// node that is not offered from the current node.
    #[error("integrity error: {0}")]
    Integrity(String),

    /// The requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),
}

impl DomainError {
    /// The human-readable reason without the kind prefix.
    #[must_use]
    pub fn reason(&self) -> &str {
        match self {
            Self::Validation(reason)
            | Self::GenerationFailure(reason)
            | Self::Transport(reason)
            | Self::Integrity(reason)
            | Self::NotFound(reason) => reason,
        }
    }
}
