//! Single-frame extraction for thumbnails.

use std::path::Path;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;

pub const STAGE_FRAME: &str = "extract_frame";

/// Width thumbnails are scaled to.
pub const THUMBNAIL_WIDTH: u32 = 640;

/// Offset used for thumbnails of videos longer than it.
pub const THUMBNAIL_OFFSET_SECS: f64 = 1.0;

/// Pick the thumbnail offset for a video of `duration` seconds.
pub fn thumbnail_offset(duration: f64) -> f64 {
    if duration > THUMBNAIL_OFFSET_SECS {
        THUMBNAIL_OFFSET_SECS
    } else {
        0.0
    }
}

/// Fraction of a clip skipped before its preview frame.
pub const CLIP_FRAME_FRACTION: f64 = 0.1;

/// Source time of a clip's preview frame. A non-positive span counts as
/// one second.
pub fn clip_frame_offset(start: f64, end: f64) -> f64 {
    let span = end - start;
    let span = if span > 0.0 { span } else { 1.0 };
    start + CLIP_FRAME_FRACTION * span
}

/// Build the frame extraction command.
pub fn frame_command(video: &Path, output: &Path, at_secs: f64) -> FfmpegCommand {
    FfmpegCommand::new(video, output)
        .stage(STAGE_FRAME)
        .seek(at_secs.max(0.0))
        .single_frame()
        .video_filter(format!("scale={}:-2", THUMBNAIL_WIDTH))
        .output_arg("-q:v")
        .output_arg("2")
}

/// Write one JPEG frame taken at `at_secs`.
pub async fn extract_frame(
    runner: &FfmpegRunner,
    video: impl AsRef<Path>,
    output: impl AsRef<Path>,
    at_secs: f64,
) -> MediaResult<()> {
    let cmd = frame_command(video.as_ref(), output.as_ref(), at_secs);
    runner.run(&cmd).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thumbnail_offset() {
        assert_eq!(thumbnail_offset(30.0), 1.0);
        assert_eq!(thumbnail_offset(0.8), 0.0);
    }

    #[test]
    fn test_clip_frame_offset() {
        assert!((clip_frame_offset(10.0, 30.0) - 12.0).abs() < 1e-9);
        assert!((clip_frame_offset(5.0, 5.0) - 5.1).abs() < 1e-9);
    }

    #[test]
    fn test_frame_command() {
        let args = frame_command(Path::new("v.mp4"), Path::new("t.jpg"), 1.0)
            .build_args()
            .join(" ");
        assert!(args.contains("-ss 1.000 -i v.mp4"));
        assert!(args.contains("-frames:v 1"));
        assert!(args.contains("scale=640:-2"));
    }
}
