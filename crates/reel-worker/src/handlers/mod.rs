//! Per-task-type handlers.
//!
//! Payloads carry identifiers only; every handler re-reads current state
//! from the repository and is safe to run again on redelivery.

mod analysis;
mod clip;
mod render;
mod transcription;
mod video;

pub use analysis::handle_analysis;
pub use clip::{clip_thumbnail_key, handle_clip_thumbnail};
pub use render::handle_render;
pub use transcription::handle_transcription;
pub use video::{handle_video_metadata, handle_video_thumbnail, thumbnail_key};

use reel_queue::QueueTask;

use crate::context::WorkerContext;
use crate::error::WorkerResult;

/// Route a task to its handler.
pub async fn process_task(ctx: &WorkerContext, task: &QueueTask) -> WorkerResult<()> {
    match task {
        QueueTask::VideoMetadata(p) => handle_video_metadata(ctx, p).await,
        QueueTask::VideoThumbnail(p) => handle_video_thumbnail(ctx, p).await,
        QueueTask::Transcription(p) => handle_transcription(ctx, p).await,
        QueueTask::Analysis(p) => handle_analysis(ctx, p).await,
        QueueTask::Render(p) => handle_render(ctx, p).await,
        QueueTask::ClipThumbnail(p) => handle_clip_thumbnail(ctx, p).await,
    }
}
