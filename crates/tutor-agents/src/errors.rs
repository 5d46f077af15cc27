//! Pipeline error taxonomy with public error codes.
//!
//! Every failure inside a run is a [`PipelineError`]. The orchestrator never
//! lets one escape: [`PipelineError::code`] maps it onto the four public
//! [`ErrorCode`]s carried by `OrchestratorResult::Failure`.
//!
//! ## Codes
//!
//! | Variant                    | Code                         | Retriable |
//! |----------------------------|------------------------------|-----------|
//! | InvalidInput, MalformedTask | INVALID_INPUT               | no        |
//! | VerificationFailed         | VERIFICATION_FAILED          | no        |
//! | MaxRegenerationsExceeded   | MAX_REGENERATIONS_EXCEEDED   | no        |
//! | Generation (timeout, 5xx)  | ORCHESTRATION_ERROR          | yes       |
//! | Generation (other)         | ORCHESTRATION_ERROR          | no        |
//! | Prompt, Cancelled, Internal | ORCHESTRATION_ERROR         | no        |
//!
//! "Retriable" describes the underlying fault for callers that resubmit a
//! task; the pipeline itself only retries on gate failures.

use std::time::Duration;

use coordination::TaskValidationError;
use thiserror::Error;

use crate::contracts::ErrorCode;

/// Failures from the retrieval collaborator.
///
/// Never surfaced to callers: the planner degrades them to empty evidence.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("retrieval transport error: {0}")]
    Transport(String),

    #[error("retrieval service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("retrieval response could not be decoded: {0}")]
    Decode(String),

    #[error("retrieval timed out after {0:?}")]
    Timeout(Duration),
}

/// Failures from the generation collaborator.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation transport error: {0}")]
    Transport(String),

    #[error("model backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("generation response could not be decoded: {0}")]
    Decode(String),

    #[error("model returned no completion")]
    EmptyCompletion,

    #[error("generation timed out after {0:?}")]
    Timeout(Duration),
}

impl GenerationError {
    /// Transient backend faults worth resubmitting.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Decode(_) | Self::EmptyCompletion => false,
        }
    }
}

/// Unified error type for one pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] TaskValidationError),

    /// Request body did not deserialize into a task.
    #[error("invalid input: malformed task: {0}")]
    MalformedTask(String),

    /// Verification stopped before the regeneration bound with a failing draft.
    #[error("verification failed after {regenerations} regeneration(s): {reason}")]
    VerificationFailed { regenerations: u32, reason: String },

    /// The regeneration bound was reached with a failing draft.
    #[error("max regenerations ({0}) exceeded without an accepted draft")]
    MaxRegenerationsExceeded(u32),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("prompt construction failed: {0}")]
    Prompt(String),

    #[error("cancelled")]
    Cancelled,

    /// A collaborator panicked mid-run.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    /// Public error code for the failure result.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidInput(_) | Self::MalformedTask(_) => ErrorCode::InvalidInput,
            Self::VerificationFailed { .. } => ErrorCode::VerificationFailed,
            Self::MaxRegenerationsExceeded(_) => ErrorCode::MaxRegenerationsExceeded,
            Self::Generation(_) | Self::Prompt(_) | Self::Cancelled | Self::Internal(_) => {
                ErrorCode::OrchestrationError
            }
        }
    }

    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Generation(e) => e.is_transient(),
            _ => false,
        }
    }
}
