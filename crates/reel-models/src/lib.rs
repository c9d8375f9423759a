//! Shared data models for the ReelCut render pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Background jobs and their status state machine
//! - Clips, clip styles and B-roll segments
//! - Source videos, transcriptions and scene analysis
//! - Caption blocks and export presets
//! - Real-time notification messages

pub mod analysis;
pub mod broll;
pub mod caption;
pub mod clip;
pub mod error;
mod id;
pub mod job;
pub mod preset;
pub mod style;
pub mod transcript;
pub mod video;
pub mod ws;

// Re-export common types
pub use analysis::{SceneRange, VideoAnalysis};
pub use broll::{BrollAsset, BrollAssetId, BrollPosition, BrollSegment, BrollSegmentId};
pub use caption::CaptionBlock;
pub use clip::{AspectRatio, AspectRatioParseError, Clip, ClipId, ClipStatus};
pub use error::ValidationError;
pub use job::{EntityType, Job, JobId, JobStatus, JobTransitionError, JobType};
pub use preset::{ExportPreset, PresetCatalog};
pub use style::{CaptionPosition, ClipStyle, ALLOWED_FONTS, DEFAULT_FONT};
pub use transcript::{TranscriptSegment, Transcription, TranscriptionId, TranscriptionStatus};
pub use video::{Video, VideoId, VideoMetadata, VideoStatus};
pub use ws::WsMessage;
