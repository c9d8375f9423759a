//! Worker error types.

use thiserror::Error;

use reel_media::MediaError;
use reel_models::{JobTransitionError, ValidationError};
use reel_queue::QueueError;
use reel_repo::RepoError;
use reel_storage::StorageError;
use reel_transcribe::TranscribeError;

pub type WorkerResult<T> = Result<T, WorkerError>;

/// Failure category callers match on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A referenced entity does not exist
    NotFound,
    /// Malformed input: time ranges, fonts, positions, asset sizes
    Validation,
    /// The external transcoder failed a stage
    TransformFailure,
    /// Object storage upload or download failed
    StorageFailure,
    /// The owner cannot pay for the work
    InsufficientCredits,
    /// Anything else: queue, persistence, IO, serialization
    Internal,
}

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Insufficient credits: {0}")]
    InsufficientCredits(String),

    /// The handler already recorded the failure on the job.
    #[error("Job failed: {0}")]
    JobFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid job transition: {0}")]
    Transition(#[from] JobTransitionError),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Transcription error: {0}")]
    Transcribe(#[from] TranscribeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<ValidationError> for WorkerError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e.to_string())
    }
}

impl WorkerError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn job_failed(msg: impl Into<String>) -> Self {
        Self::JobFailed(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            WorkerError::NotFound { .. } => ErrorKind::NotFound,
            WorkerError::Repo(e) if e.is_not_found() => ErrorKind::NotFound,
            WorkerError::Validation(_) => ErrorKind::Validation,
            WorkerError::Media(MediaError::InvalidRequest(_)) => ErrorKind::Validation,
            WorkerError::Media(e) if e.is_transform_failure() => ErrorKind::TransformFailure,
            WorkerError::Storage(_) => ErrorKind::StorageFailure,
            WorkerError::InsufficientCredits(_) => ErrorKind::InsufficientCredits,
            _ => ErrorKind::Internal,
        }
    }

    /// Check if error is retryable.
    ///
    /// Only transient infrastructure failures qualify. Transform failures are
    /// deterministic for a given input.
    pub fn is_retryable(&self) -> bool {
        match self {
            WorkerError::Storage(e) => e.is_retryable(),
            WorkerError::Repo(e) => e.is_retryable(),
            WorkerError::Transcribe(e) => e.is_retryable(),
            WorkerError::Queue(_) | WorkerError::Io(_) => true,
            _ => false,
        }
    }
}
