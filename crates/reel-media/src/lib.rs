//! FFmpeg transform stages and caption rendering.
//!
//! This crate provides:
//! - Caption block building from transcript segments
//! - SRT, WebVTT and styled (ASS) subtitle serializers
//! - Type-safe FFmpeg command building with captured diagnostics
//! - Atomic transform stages (trim, crop, overlay, burn, finalize) behind
//!   the [`Transcoder`] trait
//! - Probe, frame, audio and scene helpers used by ingest tasks, behind
//!   the [`MediaTools`] trait

pub mod audio;
pub mod burn;
pub mod captions;
pub mod clip;
pub mod command;
pub mod crop;
pub mod error;
pub mod filters;
pub mod fs_utils;
pub mod overlay;
pub mod probe;
pub mod scene;
pub mod thumbnail;
pub mod tools;
pub mod transcoder;

pub use audio::extract_audio_chunk;
pub use burn::burn_subtitles;
pub use captions::{build_blocks, to_ass, to_srt, to_vtt, CaptionWindow};
pub use clip::{finalize_output, trim_clip};
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use crop::{crop_to_aspect, crop_to_size, AspectKind, CropTarget, OutputSize};
pub use error::{MediaError, MediaResult};
pub use overlay::{overlay_video, OverlaySpec};
pub use probe::probe_video;
pub use scene::detect_scenes;
pub use thumbnail::extract_frame;
pub use tools::{FfmpegTools, MediaTools};
pub use transcoder::{FfmpegTranscoder, Transcoder};
