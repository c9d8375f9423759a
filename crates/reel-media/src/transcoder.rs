//! The transform stages as a swappable capability.

use std::path::Path;

use async_trait::async_trait;

use crate::burn::burn_subtitles;
use crate::clip::{finalize_output, trim_clip};
use crate::command::FfmpegRunner;
use crate::crop::{crop, CropTarget};
use crate::error::MediaResult;
use crate::overlay::{overlay_video, OverlaySpec};

/// Atomic media transforms. Each call reads its inputs, writes `dest`
/// (creating its directory) and never modifies an input.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Extract `[start, end)` of `source`.
    async fn trim(&self, source: &Path, dest: &Path, start: f64, end: f64) -> MediaResult<()>;

    /// Reframe `source` to an aspect ratio or an explicit size.
    async fn crop(&self, source: &Path, dest: &Path, target: &CropTarget) -> MediaResult<()>;

    /// Composite `overlay` onto `main` according to `spec`.
    async fn overlay(
        &self,
        main: &Path,
        overlay: &Path,
        dest: &Path,
        spec: &OverlaySpec,
    ) -> MediaResult<()>;

    /// Hard-burn a styled subtitle file.
    async fn burn_captions(&self, source: &Path, subtitles: &Path, dest: &Path) -> MediaResult<()>;

    /// Produce the canonical output artifact from the last intermediate.
    async fn finalize(&self, source: &Path, dest: &Path) -> MediaResult<()>;
}

/// [`Transcoder`] backed by the `ffmpeg` CLI.
#[derive(Debug, Clone, Default)]
pub struct FfmpegTranscoder {
    runner: FfmpegRunner,
}

impl FfmpegTranscoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill any single invocation that runs longer than `secs`.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.runner = self.runner.with_timeout(secs);
        self
    }

    pub fn runner(&self) -> &FfmpegRunner {
        &self.runner
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn trim(&self, source: &Path, dest: &Path, start: f64, end: f64) -> MediaResult<()> {
        trim_clip(&self.runner, source, dest, start, end).await
    }

    async fn crop(&self, source: &Path, dest: &Path, target: &CropTarget) -> MediaResult<()> {
        crop(&self.runner, source, dest, target).await
    }

    async fn overlay(
        &self,
        main: &Path,
        overlay: &Path,
        dest: &Path,
        spec: &OverlaySpec,
    ) -> MediaResult<()> {
        overlay_video(&self.runner, main, overlay, dest, spec).await
    }

    async fn burn_captions(&self, source: &Path, subtitles: &Path, dest: &Path) -> MediaResult<()> {
        burn_subtitles(&self.runner, source, subtitles, dest).await
    }

    async fn finalize(&self, source: &Path, dest: &Path) -> MediaResult<()> {
        finalize_output(&self.runner, source, dest).await
    }
}
