//! Clip preview frame handler.

use tracing::Instrument;

use reel_media::thumbnail::clip_frame_offset;
use reel_models::ClipId;
use reel_queue::{ClipThumbnailPayload, TYPE_CLIP_THUMBNAIL};

use crate::context::WorkerContext;
use crate::error::{WorkerError, WorkerResult};
use crate::handlers::video::{load_video, THUMBNAIL_CONTENT_TYPE};
use crate::logging::JobLogger;
use crate::workspace::Workspace;

/// Storage key of a clip's preview frame.
pub fn clip_thumbnail_key(clip_id: &ClipId) -> String {
    format!("thumbnails/clips/{}.jpg", clip_id)
}

/// Grab a frame a tenth of the way into the clip and store it as the
/// clip's thumbnail.
pub async fn handle_clip_thumbnail(
    ctx: &WorkerContext,
    payload: &ClipThumbnailPayload,
) -> WorkerResult<()> {
    let logger = JobLogger::new(TYPE_CLIP_THUMBNAIL, &payload.clip_id);
    let span = logger.create_span();
    async {
        let mut clip = ctx
            .repo
            .get_clip(&payload.clip_id)
            .await?
            .ok_or_else(|| WorkerError::not_found("Clip", payload.clip_id.as_str()))?;
        let video = load_video(ctx, &clip.video_id).await?;
        logger.log_start(&video.storage_path);

        let workspace =
            Workspace::create(&ctx.config.work_dir, &format!("clip-thumb-{}", clip.id)).await?;
        let source = workspace.file("source.mp4");
        ctx.storage.download_file(&video.storage_path, &source).await?;

        let frame = workspace.file("thumbnail.jpg");
        let at = clip_frame_offset(clip.start_time, clip.end_time);
        ctx.tools.extract_frame(&source, &frame, at).await?;

        let key = clip_thumbnail_key(&clip.id);
        ctx.storage
            .upload_file(&frame, &key, THUMBNAIL_CONTENT_TYPE)
            .await?;
        workspace.close();

        clip.set_thumbnail(key.clone());
        ctx.repo.save_clip(&clip).await?;
        logger.log_completion(&format!("uploaded {}", key));
        Ok::<(), WorkerError>(())
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_thumbnail_key() {
        assert_eq!(clip_thumbnail_key(&ClipId::from("c1")), "thumbnails/clips/c1.jpg");
    }
}
