//! Transcription handler.

use std::path::Path;

use tracing::{debug, Instrument};

use reel_media::audio::chunk_offsets;
use reel_models::{TranscriptSegment, Transcription, TranscriptionStatus, Video};
use reel_queue::{TranscriptionPayload, TYPE_TRANSCRIPTION};

use crate::context::WorkerContext;
use crate::error::{WorkerError, WorkerResult};
use crate::handlers::video::load_video;
use crate::logging::JobLogger;
use crate::workspace::Workspace;

/// Shortest segment kept after offsetting, in seconds.
const MIN_SEGMENT_SECS: f64 = 0.001;

/// Transcribe a video in fixed-length audio chunks and store the segments.
///
/// Any failure marks the transcription failed with the error message.
/// Completed transcriptions are left untouched on redelivery.
pub async fn handle_transcription(
    ctx: &WorkerContext,
    payload: &TranscriptionPayload,
) -> WorkerResult<()> {
    let logger = JobLogger::new(TYPE_TRANSCRIPTION, &payload.transcription_id);
    let span = logger.create_span();
    run(ctx, payload, &logger).instrument(span).await
}

async fn run(
    ctx: &WorkerContext,
    payload: &TranscriptionPayload,
    logger: &JobLogger,
) -> WorkerResult<()> {
    let video = load_video(ctx, &payload.video_id).await?;
    let mut transcription = ctx
        .repo
        .get_transcription(&payload.transcription_id)
        .await?
        .ok_or_else(|| {
            WorkerError::not_found("Transcription", payload.transcription_id.as_str())
        })?;

    if transcription.status == TranscriptionStatus::Completed {
        logger.log_progress("already completed, skipping");
        return Ok(());
    }

    transcription.mark_processing();
    ctx.repo.save_transcription(&transcription).await?;
    logger.log_start(&format!("language {}", transcription.language));

    match transcribe_video(ctx, &video, &transcription, logger).await {
        Ok(segments) => {
            let count = segments.len();
            transcription.complete(segments);
            ctx.repo.save_transcription(&transcription).await?;
            logger.log_completion(&format!("{} segments", count));
            Ok(())
        }
        Err(e) => {
            logger.log_error(&e.to_string());
            transcription.mark_failed(e.to_string());
            ctx.repo.save_transcription(&transcription).await?;
            Err(e)
        }
    }
}

async fn transcribe_video(
    ctx: &WorkerContext,
    video: &Video,
    transcription: &Transcription,
    logger: &JobLogger,
) -> WorkerResult<Vec<TranscriptSegment>> {
    let workspace = Workspace::create(
        &ctx.config.work_dir,
        &format!("transcribe-{}", transcription.id),
    )
    .await?;
    let source = workspace.file("source.mp4");
    ctx.storage.download_file(&video.storage_path, &source).await?;

    let chunk_secs = ctx.config.transcription_chunk_secs;
    let duration = match video.duration() {
        Some(d) => d,
        None => ctx.tools.probe(&source).await?.duration,
    };
    let duration = if duration > 0.0 { duration } else { chunk_secs };
    let language = request_language(&transcription.language);

    let offsets = chunk_offsets(duration, chunk_secs);
    let mut segments = Vec::new();
    for (index, start) in offsets.iter().copied().enumerate() {
        let length = chunk_secs.min(duration - start);
        if length <= 0.0 {
            break;
        }
        let chunk = workspace.file(&format!("chunk_{:04}.wav", index));
        ctx.tools
            .extract_audio(&source, &chunk, start, length)
            .await?;

        let transcribed = ctx.transcriber.transcribe_file(&chunk, language).await?;
        remove_chunk(&chunk).await;
        debug!(
            "Chunk {} at {:.0}s produced {} segments",
            index,
            start,
            transcribed.len()
        );

        let first_order = segments.len() as i32;
        segments.extend(offset_segments(transcribed, start, first_order));
    }
    logger.log_progress(&format!("{} audio chunks transcribed", offsets.len()));

    workspace.close();
    Ok(segments)
}

/// Move chunk-relative segments onto the video timeline and number them
/// from `first_order`.
fn offset_segments(
    segments: Vec<TranscriptSegment>,
    offset: f64,
    first_order: i32,
) -> Vec<TranscriptSegment> {
    segments
        .into_iter()
        .enumerate()
        .map(|(i, mut seg)| {
            seg.start_time += offset;
            seg.end_time += offset;
            if seg.end_time <= seg.start_time {
                seg.end_time = seg.start_time + MIN_SEGMENT_SECS;
            }
            seg.sequence_order = first_order + i as i32;
            seg
        })
        .collect()
}

/// Language hint for the transcriber; empty or `auto` means detect.
fn request_language(language: &str) -> Option<&str> {
    let trimmed = language.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("auto") {
        None
    } else {
        Some(trimmed)
    }
}

async fn remove_chunk(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        debug!("Failed to remove {}: {}", path.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_segments() {
        let segments = vec![
            TranscriptSegment::new(0.0, 1.5, "hello"),
            TranscriptSegment::new(2.0, 2.0, "blip"),
        ];
        let shifted = offset_segments(segments, 60.0, 7);

        assert_eq!(shifted[0].start_time, 60.0);
        assert_eq!(shifted[0].end_time, 61.5);
        assert_eq!(shifted[0].sequence_order, 7);
        assert_eq!(shifted[1].start_time, 62.0);
        assert!((shifted[1].end_time - 62.001).abs() < 1e-9);
        assert_eq!(shifted[1].sequence_order, 8);
    }

    #[test]
    fn test_request_language() {
        assert_eq!(request_language("en"), Some("en"));
        assert_eq!(request_language(" auto "), None);
        assert_eq!(request_language(""), None);
    }
}
