//! Fakes and fixtures shared by the worker integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use reel_media::{CropTarget, MediaError, MediaResult, MediaTools, OverlaySpec, Transcoder};
use reel_models::{
    Clip, ClipStyle, Job, PresetCatalog, SceneRange, TranscriptSegment, Video, VideoMetadata,
};
use reel_notify::NoopNotifier;
use reel_repo::{ClipRepository, JobRepository, MemoryRepo, StyleRepository, VideoRepository};
use reel_storage::MemoryStorage;
use reel_transcribe::{TranscribeError, TranscribeResult, Transcriber};
use reel_worker::{WorkerConfig, WorkerContext};

pub const SOURCE_KEY: &str = "uploads/source.mp4";
pub const SOURCE_BYTES: &[u8] = b"source-video-bytes";

/// Transcoder that copies its main input to `dest` and records every call.
#[derive(Default)]
pub struct FakeTranscoder {
    fail_stage: Option<&'static str>,
    calls: Mutex<Vec<String>>,
    overlays: Mutex<Vec<OverlaySpec>>,
    crops: Mutex<Vec<CropTarget>>,
    subtitles: Mutex<Vec<String>>,
}

impl FakeTranscoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the named stage with a diagnostic.
    pub fn failing_at(stage: &'static str) -> Self {
        Self {
            fail_stage: Some(stage),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn overlays(&self) -> Vec<OverlaySpec> {
        self.overlays.lock().unwrap().clone()
    }

    pub fn crops(&self) -> Vec<CropTarget> {
        self.crops.lock().unwrap().clone()
    }

    /// Contents of every subtitle file handed to the burn stage.
    pub fn subtitles(&self) -> Vec<String> {
        self.subtitles.lock().unwrap().clone()
    }

    async fn run(&self, stage: &str, source: &Path, dest: &Path) -> MediaResult<()> {
        self.calls.lock().unwrap().push(stage.to_string());
        if self.fail_stage == Some(stage) {
            return Err(MediaError::transform_failed(
                stage,
                "ffmpeg exited with status 1",
                Some("Invalid too big or non positive size".to_string()),
                Some(1),
            ));
        }
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(source, dest).await?;
        Ok(())
    }
}

#[async_trait]
impl Transcoder for FakeTranscoder {
    async fn trim(&self, source: &Path, dest: &Path, _start: f64, _end: f64) -> MediaResult<()> {
        self.run("trim", source, dest).await
    }

    async fn crop(&self, source: &Path, dest: &Path, target: &CropTarget) -> MediaResult<()> {
        self.crops.lock().unwrap().push(*target);
        self.run("crop", source, dest).await
    }

    async fn overlay(
        &self,
        main: &Path,
        _overlay: &Path,
        dest: &Path,
        spec: &OverlaySpec,
    ) -> MediaResult<()> {
        self.overlays.lock().unwrap().push(*spec);
        self.run("overlay", main, dest).await
    }

    async fn burn_captions(&self, source: &Path, subtitles: &Path, dest: &Path) -> MediaResult<()> {
        let text = tokio::fs::read_to_string(subtitles).await?;
        self.subtitles.lock().unwrap().push(text);
        self.run("burn", source, dest).await
    }

    async fn finalize(&self, source: &Path, dest: &Path) -> MediaResult<()> {
        self.run("finalize", source, dest).await
    }
}

/// Media tools returning canned results.
pub struct FakeTools {
    pub metadata: Option<VideoMetadata>,
    pub scenes: Vec<SceneRange>,
    pub frames: Mutex<Vec<f64>>,
    pub audio_chunks: Mutex<Vec<(f64, f64)>>,
}

impl FakeTools {
    pub fn new(duration: f64) -> Self {
        Self {
            metadata: Some(metadata(duration)),
            scenes: Vec::new(),
            frames: Mutex::new(Vec::new()),
            audio_chunks: Mutex::new(Vec::new()),
        }
    }

    /// Tools whose probe always fails.
    pub fn unreadable() -> Self {
        Self {
            metadata: None,
            ..Self::new(0.0)
        }
    }

    pub fn with_scenes(mut self, scenes: Vec<SceneRange>) -> Self {
        self.scenes = scenes;
        self
    }
}

#[async_trait]
impl MediaTools for FakeTools {
    async fn probe(&self, _video: &Path) -> MediaResult<VideoMetadata> {
        self.metadata.clone().ok_or_else(|| MediaError::FfprobeFailed {
            message: "Invalid data found when processing input".to_string(),
            stderr: None,
        })
    }

    async fn extract_frame(&self, _video: &Path, dest: &Path, at_secs: f64) -> MediaResult<()> {
        self.frames.lock().unwrap().push(at_secs);
        tokio::fs::write(dest, b"jpeg").await?;
        Ok(())
    }

    async fn extract_audio(
        &self,
        _video: &Path,
        dest: &Path,
        start: f64,
        duration: f64,
    ) -> MediaResult<()> {
        self.audio_chunks.lock().unwrap().push((start, duration));
        tokio::fs::write(dest, b"wav").await?;
        Ok(())
    }

    async fn detect_scenes(&self, _video: &Path) -> Vec<SceneRange> {
        self.scenes.clone()
    }
}

/// Transcriber that returns the same chunk-relative segments for every
/// file, or fails with a retryable error.
pub struct FakeTranscriber {
    segments: Vec<TranscriptSegment>,
    unavailable: bool,
    pub languages: Mutex<Vec<Option<String>>>,
}

impl FakeTranscriber {
    pub fn new(segments: Vec<TranscriptSegment>) -> Self {
        Self {
            segments,
            unavailable: false,
            languages: Mutex::new(Vec::new()),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::new(Vec::new())
        }
    }
}

#[async_trait]
impl Transcriber for FakeTranscriber {
    async fn transcribe_file(
        &self,
        _audio_path: &Path,
        language: Option<&str>,
    ) -> TranscribeResult<Vec<TranscriptSegment>> {
        self.languages
            .lock()
            .unwrap()
            .push(language.map(str::to_string));
        if self.unavailable {
            return Err(TranscribeError::ServiceUnavailable("503".to_string()));
        }
        Ok(self.segments.clone())
    }
}

pub fn metadata(duration: f64) -> VideoMetadata {
    VideoMetadata {
        duration,
        width: 1920,
        height: 1080,
        fps: 30.0,
        codec: "h264".to_string(),
        bitrate: 4_000_000,
        file_size: SOURCE_BYTES.len() as u64,
    }
}

/// A worker context over in-memory collaborators and a private work dir.
pub struct Harness {
    pub repo: MemoryRepo,
    pub storage: MemoryStorage,
    pub transcoder: Arc<FakeTranscoder>,
    pub tools: Arc<FakeTools>,
    pub transcriber: Arc<FakeTranscriber>,
    pub ctx: WorkerContext,
    work_dir: TempDir,
}

impl Harness {
    pub async fn new() -> Self {
        Self::build(FakeTranscoder::new(), FakeTools::new(120.0), FakeTranscriber::new(Vec::new()))
            .await
    }

    pub async fn build(
        transcoder: FakeTranscoder,
        tools: FakeTools,
        transcriber: FakeTranscriber,
    ) -> Self {
        let work_dir = TempDir::new().unwrap();
        let config = WorkerConfig {
            work_dir: work_dir.path().to_path_buf(),
            transcription_chunk_secs: 60.0,
            ..WorkerConfig::default()
        };

        let repo = MemoryRepo::new();
        let storage = MemoryStorage::new();
        storage.put(SOURCE_KEY, SOURCE_BYTES, "video/mp4").await;

        let transcoder = Arc::new(transcoder);
        let tools = Arc::new(tools);
        let transcriber = Arc::new(transcriber);

        let ctx = WorkerContext::new(
            config,
            Arc::new(repo.clone()),
            Arc::new(storage.clone()),
            Arc::new(NoopNotifier),
            transcriber.clone(),
            PresetCatalog::default(),
        )
        .with_transcoder(transcoder.clone())
        .with_tools(tools.clone());

        Self {
            repo,
            storage,
            transcoder,
            tools,
            transcriber,
            ctx,
            work_dir,
        }
    }

    pub fn work_dir(&self) -> PathBuf {
        self.work_dir.path().to_path_buf()
    }

    /// Scratch directories left behind under the work dir.
    pub fn leftover_workspaces(&self) -> usize {
        std::fs::read_dir(self.work_dir.path())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    pub async fn seed_video(&self) -> Video {
        let video = Video::new("user-1", SOURCE_KEY);
        self.repo.save_video(&video).await.unwrap();
        video
    }

    /// A clip over `[start, end)` of a fresh video, with its style and a
    /// pending render job.
    pub async fn seed_clip(&self, start: f64, end: f64, captions: bool) -> (Clip, Job) {
        let video = self.seed_video().await;
        let clip = Clip::new(video.id.clone(), "user-1", start, end);
        self.repo.save_clip(&clip).await.unwrap();
        self.repo
            .save_style(&ClipStyle::new(clip.id.clone()).with_captions(captions))
            .await
            .unwrap();
        let job = Job::new_render("user-1", clip.id.as_str());
        self.repo.save_job(&job).await.unwrap();
        (clip, job)
    }
}
