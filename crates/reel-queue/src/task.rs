//! Task types for the queue.
//!
//! Payloads carry only entity identifiers. Handlers re-fetch current state
//! when they run.

use serde::{Deserialize, Serialize};

use reel_models::{ClipId, JobId, TranscriptionId, VideoId};

use crate::error::{QueueError, QueueResult};

pub const TYPE_VIDEO_METADATA: &str = "video:metadata";
pub const TYPE_VIDEO_THUMBNAIL: &str = "video:thumbnail";
pub const TYPE_TRANSCRIPTION: &str = "transcription";
pub const TYPE_ANALYSIS: &str = "analysis";
pub const TYPE_RENDER: &str = "render";
pub const TYPE_CLIP_THUMBNAIL: &str = "clip:thumbnail";

/// Probe a source video and store its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadataPayload {
    pub video_id: VideoId,
}

/// Extract and upload a thumbnail for a source video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoThumbnailPayload {
    pub video_id: VideoId,
}

/// Transcribe a source video into an existing transcription record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionPayload {
    pub video_id: VideoId,
    pub transcription_id: TranscriptionId,
}

/// Detect scenes in a source video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisPayload {
    pub video_id: VideoId,
}

/// Extract and upload a preview frame for a clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipThumbnailPayload {
    pub clip_id: ClipId,
}

/// Render a clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderPayload {
    pub clip_id: ClipId,
    pub job_id: JobId,
    /// Export preset id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
}

impl RenderPayload {
    pub fn new(clip_id: ClipId, job_id: JobId) -> Self {
        Self {
            clip_id,
            job_id,
            preset: None,
        }
    }

    pub fn with_preset(mut self, preset: impl Into<String>) -> Self {
        self.preset = Some(preset.into());
        self
    }
}

/// Task wrapper for queue storage.
///
/// Serialized as the payload object with an added `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum QueueTask {
    #[serde(rename = "video:metadata")]
    VideoMetadata(VideoMetadataPayload),
    #[serde(rename = "video:thumbnail")]
    VideoThumbnail(VideoThumbnailPayload),
    #[serde(rename = "transcription")]
    Transcription(TranscriptionPayload),
    #[serde(rename = "analysis")]
    Analysis(AnalysisPayload),
    #[serde(rename = "render")]
    Render(RenderPayload),
    #[serde(rename = "clip:thumbnail")]
    ClipThumbnail(ClipThumbnailPayload),
}

impl QueueTask {
    /// Build a task from a type name and its JSON payload.
    pub fn from_parts(task_type: &str, payload: serde_json::Value) -> QueueResult<Self> {
        let serde_json::Value::Object(mut fields) = payload else {
            return Err(QueueError::invalid_payload(task_type, "payload must be a JSON object"));
        };
        fields.insert("type".to_string(), serde_json::Value::String(task_type.to_string()));
        serde_json::from_value(serde_json::Value::Object(fields))
            .map_err(|e| QueueError::invalid_payload(task_type, e.to_string()))
    }

    pub fn task_type(&self) -> &'static str {
        match self {
            QueueTask::VideoMetadata(_) => TYPE_VIDEO_METADATA,
            QueueTask::VideoThumbnail(_) => TYPE_VIDEO_THUMBNAIL,
            QueueTask::Transcription(_) => TYPE_TRANSCRIPTION,
            QueueTask::Analysis(_) => TYPE_ANALYSIS,
            QueueTask::Render(_) => TYPE_RENDER,
            QueueTask::ClipThumbnail(_) => TYPE_CLIP_THUMBNAIL,
        }
    }

    /// Identifier of the main entity the task refers to.
    pub fn entity_id(&self) -> &str {
        match self {
            QueueTask::VideoMetadata(p) => p.video_id.as_str(),
            QueueTask::VideoThumbnail(p) => p.video_id.as_str(),
            QueueTask::Transcription(p) => p.transcription_id.as_str(),
            QueueTask::Analysis(p) => p.video_id.as_str(),
            QueueTask::Render(p) => p.clip_id.as_str(),
            QueueTask::ClipThumbnail(p) => p.clip_id.as_str(),
        }
    }

    /// Generate idempotency key for deduplication.
    pub fn idempotency_key(&self) -> String {
        match self {
            QueueTask::Render(p) => format!("{}:{}:{}", TYPE_RENDER, p.clip_id, p.job_id),
            other => format!("{}:{}", other.task_type(), other.entity_id()),
        }
    }
}
