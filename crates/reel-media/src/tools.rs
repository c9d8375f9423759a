//! Inspection helpers used by the ingest tasks, as a swappable capability.

use std::path::Path;

use async_trait::async_trait;

use reel_models::{SceneRange, VideoMetadata};

use crate::audio::extract_audio_chunk;
use crate::command::FfmpegRunner;
use crate::error::MediaResult;
use crate::probe::probe_video;
use crate::scene::detect_scenes;
use crate::thumbnail::extract_frame;

/// Read-only media operations: probing, frame grabs, audio extraction and
/// scene detection.
#[async_trait]
pub trait MediaTools: Send + Sync {
    async fn probe(&self, video: &Path) -> MediaResult<VideoMetadata>;

    /// Write a single JPEG frame taken at `at_secs`.
    async fn extract_frame(&self, video: &Path, dest: &Path, at_secs: f64) -> MediaResult<()>;

    /// Write `duration` seconds of 16 kHz mono PCM starting at `start`.
    async fn extract_audio(
        &self,
        video: &Path,
        dest: &Path,
        start: f64,
        duration: f64,
    ) -> MediaResult<()>;

    /// Scene ranges of `video`. Never fails; problems yield an empty list.
    async fn detect_scenes(&self, video: &Path) -> Vec<SceneRange>;
}

/// [`MediaTools`] backed by `ffmpeg` and `ffprobe`.
#[derive(Debug, Clone, Default)]
pub struct FfmpegTools {
    runner: FfmpegRunner,
}

impl FfmpegTools {
    pub fn new(runner: FfmpegRunner) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl MediaTools for FfmpegTools {
    async fn probe(&self, video: &Path) -> MediaResult<VideoMetadata> {
        probe_video(video).await
    }

    async fn extract_frame(&self, video: &Path, dest: &Path, at_secs: f64) -> MediaResult<()> {
        extract_frame(&self.runner, video, dest, at_secs).await
    }

    async fn extract_audio(
        &self,
        video: &Path,
        dest: &Path,
        start: f64,
        duration: f64,
    ) -> MediaResult<()> {
        extract_audio_chunk(&self.runner, video, dest, start, duration).await
    }

    async fn detect_scenes(&self, video: &Path) -> Vec<SceneRange> {
        detect_scenes(&self.runner, video).await
    }
}
