//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during media processing.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    /// A transform stage failed. Carries the transcoder's diagnostic output.
    #[error("{stage}: {message}{}", diagnostic_suffix(.stderr))]
    TransformFailed {
        stage: String,
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("{stage}: timed out after {secs} seconds")]
    Timeout { stage: String, secs: u64 },

    #[error("FFprobe command failed: {message}{}", diagnostic_suffix(.stderr))]
    FfprobeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid video file: {0}")]
    InvalidVideo(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

fn diagnostic_suffix(stderr: &Option<String>) -> String {
    match stderr.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => format!(" (output: {})", s),
        _ => String::new(),
    }
}

impl MediaError {
    /// Create a stage failure error.
    pub fn transform_failed(
        stage: impl Into<String>,
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::TransformFailed {
            stage: stage.into(),
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// A stage input that does not exist on disk.
    pub fn missing_input(stage: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self::transform_failed(
            stage,
            format!("input not found: {}", path.display()),
            None,
            None,
        )
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Stage name for stage failures.
    pub fn stage(&self) -> Option<&str> {
        match self {
            Self::TransformFailed { stage, .. } | Self::Timeout { stage, .. } => Some(stage),
            _ => None,
        }
    }

    /// Whether the error came from the external transcoder.
    pub fn is_transform_failure(&self) -> bool {
        matches!(
            self,
            Self::TransformFailed { .. }
                | Self::Timeout { .. }
                | Self::FfmpegNotFound
                | Self::FfprobeNotFound
                | Self::FfprobeFailed { .. }
                | Self::InvalidVideo(_)
        )
    }
}
