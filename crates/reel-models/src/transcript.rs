//! Transcription models.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::id::string_id;
use crate::video::VideoId;

string_id!(
    /// Unique identifier for a transcription.
    TranscriptionId
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptionStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

impl TranscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TranscriptionStatus::Pending => "pending",
            TranscriptionStatus::Processing => "processing",
            TranscriptionStatus::Completed => "completed",
            TranscriptionStatus::Failed => "failed",
        }
    }
}

/// A timed span of recognised speech, in source seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TranscriptSegment {
    pub start_time: f64,
    pub end_time: f64,
    pub text: String,
    #[serde(default)]
    pub sequence_order: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl TranscriptSegment {
    pub fn new(start_time: f64, end_time: f64, text: impl Into<String>) -> Self {
        Self {
            start_time,
            end_time,
            text: text.into(),
            sequence_order: 0,
            confidence: None,
        }
    }

    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// Transcript of a source video in one language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Transcription {
    pub id: TranscriptionId,
    pub video_id: VideoId,
    /// Language code, e.g. "en"
    pub language: String,
    #[serde(default)]
    pub status: TranscriptionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default)]
    pub segments: Vec<TranscriptSegment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transcription {
    pub fn new(video_id: VideoId, language: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: TranscriptionId::new(),
            video_id,
            language: language.into(),
            status: TranscriptionStatus::Pending,
            error_message: None,
            segments: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_segments(mut self, segments: Vec<TranscriptSegment>) -> Self {
        self.segments = segments;
        self.status = TranscriptionStatus::Completed;
        self
    }

    pub fn mark_processing(&mut self) {
        self.status = TranscriptionStatus::Processing;
        self.error_message = None;
        self.updated_at = Utc::now();
    }

    pub fn complete(&mut self, segments: Vec<TranscriptSegment>) {
        self.segments = segments;
        self.status = TranscriptionStatus::Completed;
        self.error_message = None;
        self.updated_at = Utc::now();
    }

    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.status = TranscriptionStatus::Failed;
        self.error_message = Some(error.into());
        self.updated_at = Utc::now();
    }
}
