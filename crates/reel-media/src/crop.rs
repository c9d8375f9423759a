//! Crop/resize stage.

use std::path::Path;
use tracing::info;

use reel_models::{AspectRatio, ExportPreset};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;
use crate::filters::{aspect_crop_filter, cover_crop_filter};
use crate::fs_utils::ensure_distinct;

pub const STAGE_CROP: &str = "crop";

/// Named output framing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AspectKind {
    /// 9:16
    #[default]
    Portrait,
    /// 1:1
    Square,
    /// 16:9
    Landscape,
}

impl AspectKind {
    /// Map an aspect label; anything unrecognised frames as portrait.
    pub fn from_label(label: &str) -> Self {
        match label.parse::<AspectRatio>() {
            Ok(r) if r == AspectRatio::SQUARE => AspectKind::Square,
            Ok(r) if r == AspectRatio::LANDSCAPE => AspectKind::Landscape,
            _ => AspectKind::Portrait,
        }
    }

    pub fn ratio(&self) -> AspectRatio {
        match self {
            AspectKind::Portrait => AspectRatio::PORTRAIT,
            AspectKind::Square => AspectRatio::SQUARE,
            AspectKind::Landscape => AspectRatio::LANDSCAPE,
        }
    }
}

/// Explicit output size and encoder targets, usually from an export preset.
/// Zero bitrates or fps leave the encoder default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputSize {
    pub width: u32,
    pub height: u32,
    pub video_bitrate_kbps: u32,
    pub audio_bitrate_kbps: u32,
    pub fps: u32,
}

impl OutputSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            video_bitrate_kbps: 0,
            audio_bitrate_kbps: 0,
            fps: 0,
        }
    }

    /// Size from a preset, if it carries usable dimensions.
    pub fn from_preset(preset: &ExportPreset) -> Option<Self> {
        preset.has_dimensions().then(|| Self {
            width: preset.width,
            height: preset.height,
            video_bitrate_kbps: preset.video_bitrate_kbps,
            audio_bitrate_kbps: preset.audio_bitrate_kbps,
            fps: preset.fps,
        })
    }
}

/// What the crop stage should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropTarget {
    Aspect(AspectKind),
    Size(OutputSize),
}

/// Build the crop command for `target`.
pub fn crop_command(source: &Path, dest: &Path, target: &CropTarget) -> MediaResult<FfmpegCommand> {
    ensure_distinct(STAGE_CROP, source, dest)?;
    let cmd = FfmpegCommand::new(source, dest).stage(STAGE_CROP);

    let cmd = match target {
        CropTarget::Aspect(kind) => {
            let ratio = kind.ratio();
            cmd.video_filter(aspect_crop_filter(ratio.width, ratio.height))
                .audio_codec("copy")
        }
        CropTarget::Size(size) => {
            let mut cmd = cmd
                .video_filter(cover_crop_filter(size.width, size.height))
                .video_codec("libx264");
            if size.video_bitrate_kbps > 0 {
                cmd = cmd.video_bitrate_kbps(size.video_bitrate_kbps);
            }
            if size.fps > 0 {
                cmd = cmd.frame_rate(size.fps);
            }
            if size.audio_bitrate_kbps > 0 {
                cmd.audio_codec("aac").audio_bitrate_kbps(size.audio_bitrate_kbps)
            } else {
                cmd.audio_codec("copy")
            }
        }
    };
    Ok(cmd)
}

/// Scale and center-crop `source` to a named aspect ratio.
pub async fn crop_to_aspect(
    runner: &FfmpegRunner,
    source: impl AsRef<Path>,
    dest: impl AsRef<Path>,
    kind: AspectKind,
) -> MediaResult<()> {
    crop(runner, source.as_ref(), dest.as_ref(), &CropTarget::Aspect(kind)).await
}

/// Scale `source` to cover `size` and center-crop to exactly that size.
pub async fn crop_to_size(
    runner: &FfmpegRunner,
    source: impl AsRef<Path>,
    dest: impl AsRef<Path>,
    size: OutputSize,
) -> MediaResult<()> {
    crop(runner, source.as_ref(), dest.as_ref(), &CropTarget::Size(size)).await
}

pub(crate) async fn crop(
    runner: &FfmpegRunner,
    source: &Path,
    dest: &Path,
    target: &CropTarget,
) -> MediaResult<()> {
    let cmd = crop_command(source, dest, target)?;
    info!(stage = STAGE_CROP, crop_target = ?target, "Cropping {}", source.display());
    runner.run(&cmd).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect_from_label() {
        assert_eq!(AspectKind::from_label("9:16"), AspectKind::Portrait);
        assert_eq!(AspectKind::from_label("1:1"), AspectKind::Square);
        assert_eq!(AspectKind::from_label("16:9"), AspectKind::Landscape);
        assert_eq!(AspectKind::from_label("4:5"), AspectKind::Portrait);
        assert_eq!(AspectKind::from_label("wide"), AspectKind::Portrait);
    }

    #[test]
    fn test_crop_aspect_copies_audio() {
        let cmd = crop_command(
            Path::new("in.mp4"),
            Path::new("out.mp4"),
            &CropTarget::Aspect(AspectKind::Square),
        )
        .unwrap();
        let args = cmd.build_args().join(" ");
        assert!(args.contains("crop=trunc(min(iw\\,ih*1/1)/2)*2"));
        assert!(args.contains("-c:a copy"));
    }

    #[test]
    fn test_crop_preset_uses_exact_size_and_rates() {
        let preset = reel_models::PresetCatalog::default()
            .get("tiktok")
            .cloned()
            .unwrap();
        let size = OutputSize::from_preset(&preset).unwrap();
        let cmd = crop_command(Path::new("in.mp4"), Path::new("out.mp4"), &CropTarget::Size(size)).unwrap();
        let args = cmd.build_args().join(" ");
        assert!(args.contains("scale=1080:1920:force_original_aspect_ratio=increase,crop=1080:1920"));
        assert!(args.contains("-b:v 6000k"));
        assert!(args.contains("-r 30"));
        assert!(args.contains("-c:a aac -b:a 128k"));
    }

    #[test]
    fn test_preset_without_dimensions() {
        let mut preset = ExportPreset::builtin().remove(0);
        preset.width = 0;
        assert!(OutputSize::from_preset(&preset).is_none());
    }
}
