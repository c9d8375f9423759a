//! Burn styled captions into video.

use std::path::Path;
use tracing::info;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;
use crate::filters::ass_filter;
use crate::fs_utils::ensure_distinct;

pub const STAGE_BURN: &str = "burn_captions";

/// Build the caption burn command.
pub fn burn_command(source: &Path, subtitles: &Path, dest: &Path) -> MediaResult<FfmpegCommand> {
    ensure_distinct(STAGE_BURN, source, dest)?;
    Ok(FfmpegCommand::new(source, dest)
        .stage(STAGE_BURN)
        .video_filter(ass_filter(&subtitles.to_string_lossy()))
        .video_codec("libx264")
        .audio_codec("copy"))
}

/// Hard-burn the ASS file at `subtitles` into `source`.
pub async fn burn_subtitles(
    runner: &FfmpegRunner,
    source: impl AsRef<Path>,
    subtitles: impl AsRef<Path>,
    dest: impl AsRef<Path>,
) -> MediaResult<()> {
    let (source, subtitles, dest) = (source.as_ref(), subtitles.as_ref(), dest.as_ref());
    if !subtitles.exists() {
        return Err(crate::error::MediaError::missing_input(STAGE_BURN, subtitles));
    }
    let cmd = burn_command(source, subtitles, dest)?;
    info!(stage = STAGE_BURN, "Burning captions from {}", subtitles.display());
    runner.run(&cmd).await
}
