//! Queue error types.

use thiserror::Error;

pub type QueueResult<T> = Result<T, QueueError>;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Duplicate task: {0}")]
    Duplicate(String),

    #[error("Unknown message: {0}")]
    UnknownMessage(String),

    #[error("Invalid payload for {task_type}: {message}")]
    InvalidPayload { task_type: String, message: String },

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl QueueError {
    pub fn invalid_payload(task_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPayload {
            task_type: task_type.into(),
            message: message.into(),
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, QueueError::Duplicate(_))
    }
}
