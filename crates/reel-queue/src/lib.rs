//! Durable task queue.
//!
//! This crate provides:
//! - Task types and their JSON payloads
//! - The [`TaskQueue`] trait consumed by the worker pool
//! - A Redis Streams implementation with retry counters and a DLQ
//! - An in-memory implementation with the same delivery semantics

pub mod error;
pub mod memory;
pub mod queue;
pub mod task;

pub use error::{QueueError, QueueResult};
pub use memory::{DeadLetter, MemoryQueue};
pub use queue::{Delivery, QueueConfig, RedisQueue, TaskQueue};
pub use task::{
    AnalysisPayload, ClipThumbnailPayload, QueueTask, RenderPayload, TranscriptionPayload,
    VideoMetadataPayload, VideoThumbnailPayload, TYPE_ANALYSIS, TYPE_CLIP_THUMBNAIL, TYPE_RENDER,
    TYPE_TRANSCRIPTION, TYPE_VIDEO_METADATA, TYPE_VIDEO_THUMBNAIL,
};
