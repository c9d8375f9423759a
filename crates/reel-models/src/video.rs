//! Source video models.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::id::string_id;

string_id!(
    /// Unique identifier for an uploaded source video.
    VideoId
);

/// Source video processing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum VideoStatus {
    /// Upload in progress
    #[default]
    Uploading,
    /// Metadata extraction running
    Processing,
    /// Ready for clipping
    Ready,
    /// Processing failed
    Failed,
}

impl VideoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::Uploading => "uploading",
            VideoStatus::Processing => "processing",
            VideoStatus::Ready => "ready",
            VideoStatus::Failed => "failed",
        }
    }
}

/// Technical metadata probed from a media file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VideoMetadata {
    pub duration: f64,
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub codec: String,
    /// Bits per second
    pub bitrate: u64,
    /// Bytes
    pub file_size: u64,
}

/// An uploaded source video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Video {
    pub id: VideoId,
    pub user_id: String,
    #[serde(default)]
    pub title: String,
    /// Object storage key of the original upload
    pub storage_path: String,
    /// Object storage key of the generated thumbnail
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<VideoMetadata>,
    #[serde(default)]
    pub status: VideoStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Video {
    pub fn new(user_id: impl Into<String>, storage_path: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: VideoId::new(),
            user_id: user_id.into(),
            title: String::new(),
            storage_path: storage_path.into(),
            thumbnail_path: None,
            metadata: None,
            status: VideoStatus::Uploading,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Duration in seconds, if metadata has been extracted.
    pub fn duration(&self) -> Option<f64> {
        self.metadata.as_ref().map(|m| m.duration)
    }

    pub fn apply_metadata(&mut self, metadata: VideoMetadata) {
        self.metadata = Some(metadata);
        self.status = VideoStatus::Ready;
        self.error_message = None;
        self.updated_at = Utc::now();
    }

    pub fn set_thumbnail(&mut self, key: impl Into<String>) {
        self.thumbnail_path = Some(key.into());
        self.updated_at = Utc::now();
    }

    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.status = VideoStatus::Failed;
        self.error_message = Some(error.into());
        self.updated_at = Utc::now();
    }
}
