//! Audio extraction for speech-to-text.

use std::path::Path;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;

pub const STAGE_AUDIO: &str = "extract_audio";

/// Sample rate expected by the transcriber.
pub const SPEECH_SAMPLE_RATE: u32 = 16_000;

/// Build the command extracting `[start, start + duration)` as 16 kHz mono PCM WAV.
pub fn audio_chunk_command(video: &Path, output: &Path, start: f64, duration: f64) -> FfmpegCommand {
    FfmpegCommand::new(video, output)
        .stage(STAGE_AUDIO)
        .seek(start.max(0.0))
        .duration(duration)
        .output_args([
            "-vn".to_string(),
            "-acodec".to_string(),
            "pcm_s16le".to_string(),
            "-ar".to_string(),
            SPEECH_SAMPLE_RATE.to_string(),
            "-ac".to_string(),
            "1".to_string(),
        ])
}

/// Extract one audio chunk of `video` for transcription.
pub async fn extract_audio_chunk(
    runner: &FfmpegRunner,
    video: impl AsRef<Path>,
    output: impl AsRef<Path>,
    start: f64,
    duration: f64,
) -> MediaResult<()> {
    let cmd = audio_chunk_command(video.as_ref(), output.as_ref(), start, duration);
    runner.run(&cmd).await
}

/// Chunk start offsets covering `total` seconds in steps of `chunk`.
pub fn chunk_offsets(total: f64, chunk: f64) -> Vec<f64> {
    if total <= 0.0 || chunk <= 0.0 {
        return Vec::new();
    }
    let count = (total / chunk).ceil() as usize;
    (0..count).map(|i| i as f64 * chunk).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_offsets() {
        assert_eq!(chunk_offsets(150.0, 60.0), vec![0.0, 60.0, 120.0]);
        assert_eq!(chunk_offsets(60.0, 60.0), vec![0.0]);
        assert!(chunk_offsets(0.0, 60.0).is_empty());
    }

    #[test]
    fn test_audio_chunk_command() {
        let args = audio_chunk_command(Path::new("v.mp4"), Path::new("a.wav"), 60.0, 60.0)
            .build_args()
            .join(" ");
        assert!(args.contains("-ss 60.000 -t 60.000 -i v.mp4"));
        assert!(args.contains("-acodec pcm_s16le -ar 16000 -ac 1"));
    }
}
