//! Metadata, thumbnail, transcription and analysis handlers.

mod common;

use common::{FakeTools, FakeTranscriber, FakeTranscoder, Harness};

use reel_models::{
    EntityType, Job, JobStatus, JobType, SceneRange, TranscriptSegment, Transcription,
    TranscriptionStatus, VideoStatus,
};
use reel_models::ClipId;
use reel_queue::{
    AnalysisPayload, ClipThumbnailPayload, TranscriptionPayload, VideoMetadataPayload,
    VideoThumbnailPayload,
};
use reel_repo::{
    AnalysisRepository, ClipRepository, JobRepository, TranscriptionRepository, VideoRepository,
};
use reel_worker::handlers::{
    clip_thumbnail_key, handle_analysis, handle_clip_thumbnail, handle_transcription,
    handle_video_metadata, handle_video_thumbnail, thumbnail_key,
};

async fn seed_ingest_job(h: &Harness, video_id: &str) -> Job {
    let job = Job::new("user-1", JobType::VideoProcessing, EntityType::Video, video_id);
    h.repo.save_job(&job).await.unwrap();
    job
}

#[tokio::test]
async fn test_metadata_then_thumbnail_completes_ingest_job() {
    let h = Harness::new().await;
    let video = h.seed_video().await;
    let job = seed_ingest_job(&h, video.id.as_str()).await;

    handle_video_metadata(&h.ctx, &VideoMetadataPayload { video_id: video.id.clone() })
        .await
        .unwrap();

    let stored = h.repo.get_video(&video.id).await.unwrap().unwrap();
    assert_eq!(stored.status, VideoStatus::Ready);
    assert_eq!(stored.duration(), Some(120.0));
    let stored_job = h.repo.get_job(&job.id).await.unwrap().unwrap();
    assert_eq!(stored_job.status, JobStatus::Processing);
    assert_eq!(stored_job.progress, 50);

    handle_video_thumbnail(&h.ctx, &VideoThumbnailPayload { video_id: video.id.clone() })
        .await
        .unwrap();

    let key = thumbnail_key(&video.id);
    assert_eq!(h.storage.get(&key).await.unwrap(), b"jpeg");
    assert_eq!(h.storage.content_type(&key).await.as_deref(), Some("image/jpeg"));
    let stored = h.repo.get_video(&video.id).await.unwrap().unwrap();
    assert_eq!(stored.thumbnail_path.as_deref(), Some(key.as_str()));

    let stored_job = h.repo.get_job(&job.id).await.unwrap().unwrap();
    assert_eq!(stored_job.status, JobStatus::Completed);
    assert_eq!(h.leftover_workspaces(), 0);
}

#[tokio::test]
async fn test_unreadable_video_fails_ingest() {
    let h = Harness::build(
        FakeTranscoder::new(),
        FakeTools::unreadable(),
        FakeTranscriber::new(Vec::new()),
    )
    .await;
    let video = h.seed_video().await;
    let job = seed_ingest_job(&h, video.id.as_str()).await;

    let result =
        handle_video_metadata(&h.ctx, &VideoMetadataPayload { video_id: video.id.clone() }).await;
    assert!(result.is_err());

    let stored = h.repo.get_video(&video.id).await.unwrap().unwrap();
    assert_eq!(stored.status, VideoStatus::Failed);
    assert!(stored.error_message.unwrap().contains("Invalid data"));
    let stored_job = h.repo.get_job(&job.id).await.unwrap().unwrap();
    assert_eq!(stored_job.status, JobStatus::Failed);
}

#[tokio::test]
async fn test_transcription_offsets_chunks_onto_video_timeline() {
    let h = Harness::build(
        FakeTranscoder::new(),
        FakeTools::new(90.0),
        FakeTranscriber::new(vec![
            TranscriptSegment::new(0.0, 2.0, "hello"),
            TranscriptSegment::new(2.0, 4.5, "world"),
        ]),
    )
    .await;
    let video = h.seed_video().await;
    let transcription = Transcription::new(video.id.clone(), "auto");
    h.repo.save_transcription(&transcription).await.unwrap();

    handle_transcription(
        &h.ctx,
        &TranscriptionPayload {
            video_id: video.id.clone(),
            transcription_id: transcription.id.clone(),
        },
    )
    .await
    .unwrap();

    assert_eq!(
        *h.tools.audio_chunks.lock().unwrap(),
        vec![(0.0, 60.0), (60.0, 30.0)]
    );
    assert_eq!(*h.transcriber.languages.lock().unwrap(), vec![None, None]);

    let stored = h
        .repo
        .get_transcription(&transcription.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, TranscriptionStatus::Completed);
    let times: Vec<(f64, f64, i32)> = stored
        .segments
        .iter()
        .map(|s| (s.start_time, s.end_time, s.sequence_order))
        .collect();
    assert_eq!(
        times,
        vec![
            (0.0, 2.0, 0),
            (2.0, 4.5, 1),
            (60.0, 62.0, 2),
            (62.0, 64.5, 3)
        ]
    );
}

#[tokio::test]
async fn test_completed_transcription_is_not_redone() {
    let h = Harness::new().await;
    let video = h.seed_video().await;
    let mut transcription = Transcription::new(video.id.clone(), "en");
    transcription.complete(vec![TranscriptSegment::new(0.0, 1.0, "done")]);
    h.repo.save_transcription(&transcription).await.unwrap();

    handle_transcription(
        &h.ctx,
        &TranscriptionPayload {
            video_id: video.id.clone(),
            transcription_id: transcription.id.clone(),
        },
    )
    .await
    .unwrap();

    assert!(h.transcriber.languages.lock().unwrap().is_empty());
    let stored = h
        .repo
        .get_transcription(&transcription.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.segments.len(), 1);
}

#[tokio::test]
async fn test_analysis_stores_detected_scenes() {
    let scenes = vec![
        SceneRange { start: 0.0, end: 4.2 },
        SceneRange { start: 4.2, end: 120.0 },
    ];
    let h = Harness::build(
        FakeTranscoder::new(),
        FakeTools::new(120.0).with_scenes(scenes.clone()),
        FakeTranscriber::new(Vec::new()),
    )
    .await;
    let video = h.seed_video().await;

    handle_analysis(&h.ctx, &AnalysisPayload { video_id: video.id.clone() })
        .await
        .unwrap();

    let analysis = h.repo.get_analysis(&video.id).await.unwrap().unwrap();
    assert_eq!(analysis.scenes, scenes);
}

#[tokio::test]
async fn test_clip_thumbnail_taken_tenth_into_clip() {
    let h = Harness::new().await;
    let (clip, job) = h.seed_clip(10.0, 30.0, false).await;

    handle_clip_thumbnail(&h.ctx, &ClipThumbnailPayload { clip_id: clip.id.clone() })
        .await
        .unwrap();

    let frames = h.tools.frames.lock().unwrap().clone();
    assert_eq!(frames.len(), 1);
    assert!((frames[0] - 12.0).abs() < 1e-9, "{:?}", frames);

    let key = clip_thumbnail_key(&clip.id);
    assert_eq!(key, format!("thumbnails/clips/{}.jpg", clip.id));
    assert_eq!(h.storage.get(&key).await.unwrap(), b"jpeg");
    assert_eq!(h.storage.content_type(&key).await.as_deref(), Some("image/jpeg"));

    let stored = h.repo.get_clip(&clip.id).await.unwrap().unwrap();
    assert_eq!(stored.thumbnail_path.as_deref(), Some(key.as_str()));
    // Thumbnails do not touch the render job.
    let job = h.repo.get_job(&job.id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Pending);
    assert_eq!(h.leftover_workspaces(), 0);
}

#[tokio::test]
async fn test_clip_thumbnail_for_unknown_clip_fails() {
    let h = Harness::new().await;

    let err = handle_clip_thumbnail(&h.ctx, &ClipThumbnailPayload { clip_id: ClipId::from("ghost") })
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Clip not found: ghost"));
    assert!(!err.is_retryable());
    assert!(h.tools.frames.lock().unwrap().is_empty());
}
