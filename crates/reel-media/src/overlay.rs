//! Overlay stage: composite a secondary clip onto the main timeline.

use std::path::Path;
use tracing::info;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::filters::overlay_filter;
use crate::fs_utils::ensure_distinct;

pub const STAGE_OVERLAY: &str = "overlay";

/// Timing and appearance of an overlay, in main-clip seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlaySpec {
    pub start: f64,
    pub end: f64,
    /// Fraction of the overlay's own size
    pub scale: f64,
    /// Alpha multiplier in `(0, 1]`
    pub opacity: f64,
}

impl OverlaySpec {
    pub fn new(start: f64, end: f64, scale: f64, opacity: f64) -> Self {
        Self {
            start,
            end,
            scale,
            opacity,
        }
    }

    /// Substitute defaults for non-positive scale (0.5) and opacity (1).
    pub fn normalized(self) -> Self {
        Self {
            scale: if self.scale > 0.0 { self.scale } else { 0.5 },
            opacity: if self.opacity > 0.0 { self.opacity.min(1.0) } else { 1.0 },
            ..self
        }
    }
}

/// Build the overlay command.
pub fn overlay_command(
    main: &Path,
    overlay: &Path,
    dest: &Path,
    spec: &OverlaySpec,
) -> MediaResult<FfmpegCommand> {
    ensure_distinct(STAGE_OVERLAY, main, dest)?;
    ensure_distinct(STAGE_OVERLAY, overlay, dest)?;
    if !(spec.start >= 0.0 && spec.end > spec.start) {
        return Err(MediaError::invalid_request(format!(
            "{}: invalid window [{:.3}, {:.3})",
            STAGE_OVERLAY, spec.start, spec.end
        )));
    }
    let spec = spec.normalized();

    Ok(FfmpegCommand::new(main, dest)
        .stage(STAGE_OVERLAY)
        .add_input(overlay)
        .filter_complex(overlay_filter(spec.start, spec.end, spec.scale, spec.opacity))
        .map("[v]")
        .map("0:a?")
        .video_codec("libx264")
        .audio_codec("copy"))
}

/// Composite `overlay` centered onto `main` during the spec's window.
pub async fn overlay_video(
    runner: &FfmpegRunner,
    main: impl AsRef<Path>,
    overlay: impl AsRef<Path>,
    dest: impl AsRef<Path>,
    spec: &OverlaySpec,
) -> MediaResult<()> {
    let (main, overlay, dest) = (main.as_ref(), overlay.as_ref(), dest.as_ref());
    let cmd = overlay_command(main, overlay, dest, spec)?;
    info!(
        stage = STAGE_OVERLAY,
        start = spec.start,
        end = spec.end,
        "Overlaying {} onto {}",
        overlay.display(),
        main.display()
    );
    runner.run(&cmd).await
}
