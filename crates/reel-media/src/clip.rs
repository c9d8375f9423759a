//! Trim and finalize stages.

use std::path::Path;
use tracing::info;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::fs_utils::ensure_distinct;

pub const STAGE_TRIM: &str = "trim";
pub const STAGE_FINALIZE: &str = "finalize";

/// Build the trim command for `[start, end)` of `source`.
pub fn trim_command(source: &Path, dest: &Path, start: f64, end: f64) -> MediaResult<FfmpegCommand> {
    if !start.is_finite() || !end.is_finite() || start < 0.0 || end <= start {
        return Err(MediaError::invalid_request(format!(
            "{}: invalid range [{:.3}, {:.3})",
            STAGE_TRIM, start, end
        )));
    }
    ensure_distinct(STAGE_TRIM, source, dest)?;

    Ok(FfmpegCommand::new(source, dest)
        .stage(STAGE_TRIM)
        .seek(start)
        .duration(end - start)
        .codec_copy()
        .output_arg("-avoid_negative_ts")
        .output_arg("make_zero"))
}

/// Extract `[start, end)` of `source` into `dest` without re-encoding.
pub async fn trim_clip(
    runner: &FfmpegRunner,
    source: impl AsRef<Path>,
    dest: impl AsRef<Path>,
    start: f64,
    end: f64,
) -> MediaResult<()> {
    let (source, dest) = (source.as_ref(), dest.as_ref());
    let cmd = trim_command(source, dest, start, end)?;

    info!(
        stage = STAGE_TRIM,
        "Trimming {} [{:.3}, {:.3}) -> {}",
        source.display(),
        start,
        end,
        dest.display()
    );
    runner.run(&cmd).await
}

/// Build the finalize command: a stream-copy remux with the index up front.
pub fn finalize_command(source: &Path, dest: &Path) -> MediaResult<FfmpegCommand> {
    ensure_distinct(STAGE_FINALIZE, source, dest)?;
    Ok(FfmpegCommand::new(source, dest)
        .stage(STAGE_FINALIZE)
        .codec_copy()
        .output_arg("-movflags")
        .output_arg("+faststart"))
}

/// Write the last intermediate to the canonical output artifact.
pub async fn finalize_output(
    runner: &FfmpegRunner,
    source: impl AsRef<Path>,
    dest: impl AsRef<Path>,
) -> MediaResult<()> {
    let cmd = finalize_command(source.as_ref(), dest.as_ref())?;
    runner.run(&cmd).await
}
