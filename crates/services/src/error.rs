//! Shared error types for the services crate.

use thiserror::Error;

use exam_core::model::{OptionId, QuestionId};
use storage::kv::StorageError;

/// Errors emitted by `SyncGateway` implementations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GatewayError {
    #[error("backend returned status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("gateway unavailable: {0}")]
    Unavailable(String),
    #[error("backend reported no attempt for id {0}")]
    UnknownAttempt(String),
}

/// Errors emitted by `AttemptCache`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CacheError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("snapshot serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors emitted by `AttemptStateStore` mutations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AttemptError {
    #[error("attempt has no questions")]
    NoQuestions,
    #[error("attempt already completed")]
    Completed,
    #[error("no option selected")]
    EmptySelection,
    #[error("question {0} is not the current question")]
    NotCurrent(QuestionId),
    #[error("option {option} does not belong to question {question}")]
    UnknownOption {
        question: QuestionId,
        option: OptionId,
    },
    #[error("question index {index} out of bounds (len {len})")]
    IndexOutOfBounds { index: usize, len: usize },
}

/// Errors emitted by `RecoveryCoordinator`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RecoveryError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Errors emitted by `AttemptSession`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error(transparent)]
    Attempt(#[from] AttemptError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error("session state lock poisoned")]
    Poisoned,
}
