//! Video ingest handlers: metadata probe and thumbnail.

use tracing::Instrument;

use reel_media::thumbnail::thumbnail_offset;
use reel_models::{EntityType, Job, JobStatus, Video, VideoId};
use reel_queue::{
    VideoMetadataPayload, VideoThumbnailPayload, TYPE_VIDEO_METADATA, TYPE_VIDEO_THUMBNAIL,
};

use crate::context::WorkerContext;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::workspace::Workspace;

/// Progress reported once metadata is known.
const METADATA_PROGRESS: u8 = 50;

/// Content type of uploaded thumbnails.
pub(crate) const THUMBNAIL_CONTENT_TYPE: &str = "image/jpeg";

/// Storage key of a video's thumbnail.
pub fn thumbnail_key(video_id: &VideoId) -> String {
    format!("thumbnails/{}.jpg", video_id)
}

/// Probe the source and store its metadata on the video.
pub async fn handle_video_metadata(
    ctx: &WorkerContext,
    payload: &VideoMetadataPayload,
) -> WorkerResult<()> {
    let logger = JobLogger::new(TYPE_VIDEO_METADATA, &payload.video_id);
    let span = logger.create_span();
    async {
        let mut video = load_video(ctx, &payload.video_id).await?;
        logger.log_start(&video.storage_path);

        let workspace =
            Workspace::create(&ctx.config.work_dir, &format!("meta-{}", video.id)).await?;
        let source = workspace.file("source.mp4");
        ctx.storage.download_file(&video.storage_path, &source).await?;

        let metadata = match ctx.tools.probe(&source).await {
            Ok(m) => m,
            Err(e) => {
                let message = e.to_string();
                logger.log_error(&message);
                video.mark_failed(message.clone());
                ctx.repo.save_video(&video).await?;
                update_video_job(ctx, &video.id, |job| job.fail(message).map_err(Into::into))
                    .await?;
                return Err(e.into());
            }
        };
        workspace.close();

        logger.log_progress(&format!(
            "{}x{} {:.2}s {}",
            metadata.width, metadata.height, metadata.duration, metadata.codec
        ));
        video.apply_metadata(metadata);
        ctx.repo.save_video(&video).await?;

        update_video_job(ctx, &video.id, |job| {
            job.set_progress(METADATA_PROGRESS);
            Ok(())
        })
        .await?;
        logger.log_completion("metadata stored");
        Ok::<(), WorkerError>(())
    }
    .instrument(span)
    .await
}

/// Grab a frame, upload it and complete the video's ingest job.
pub async fn handle_video_thumbnail(
    ctx: &WorkerContext,
    payload: &VideoThumbnailPayload,
) -> WorkerResult<()> {
    let logger = JobLogger::new(TYPE_VIDEO_THUMBNAIL, &payload.video_id);
    let span = logger.create_span();
    async {
        let mut video = load_video(ctx, &payload.video_id).await?;
        logger.log_start(&video.storage_path);

        let workspace =
            Workspace::create(&ctx.config.work_dir, &format!("thumb-{}", video.id)).await?;
        let source = workspace.file("source.mp4");
        ctx.storage.download_file(&video.storage_path, &source).await?;

        // The metadata task may not have run yet.
        let duration = match video.duration() {
            Some(d) => d,
            None => match ctx.tools.probe(&source).await {
                Ok(m) => m.duration,
                Err(e) => {
                    logger.log_warning(&format!("probe for thumbnail offset failed: {}", e));
                    0.0
                }
            },
        };

        let frame = workspace.file("thumbnail.jpg");
        ctx.tools
            .extract_frame(&source, &frame, thumbnail_offset(duration))
            .await?;

        let key = thumbnail_key(&video.id);
        ctx.storage
            .upload_file(&frame, &key, THUMBNAIL_CONTENT_TYPE)
            .await?;
        workspace.close();

        video.set_thumbnail(key.clone());
        ctx.repo.save_video(&video).await?;

        update_video_job(ctx, &video.id, |job| job.complete().map_err(Into::into)).await?;
        logger.log_completion(&format!("uploaded {}", key));
        Ok::<(), WorkerError>(())
    }
    .instrument(span)
    .await
}

pub(crate) async fn load_video(ctx: &WorkerContext, id: &VideoId) -> WorkerResult<Video> {
    ctx.repo
        .get_video(id)
        .await?
        .ok_or_else(|| WorkerError::not_found("Video", id.as_str()))
}

/// Apply `update` to the video's latest ingest job, if it is still open,
/// and notify its owner.
async fn update_video_job<F>(
    ctx: &WorkerContext,
    video_id: &VideoId,
    update: F,
) -> WorkerResult<()>
where
    F: FnOnce(&mut Job) -> WorkerResult<()>,
{
    let Some(mut job) = ctx
        .repo
        .latest_job_for_entity(EntityType::Video, video_id.as_str())
        .await?
    else {
        return Ok(());
    };
    if job.is_terminal() {
        return Ok(());
    }
    if job.status == JobStatus::Pending {
        job.start()?;
    }
    update(&mut job)?;
    ctx.repo.save_job(&job).await?;
    ctx.notifier.notify_job(&job).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thumbnail_key() {
        assert_eq!(thumbnail_key(&VideoId::from("v1")), "thumbnails/v1.jpg");
    }
}
