//! Scene change detection.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tracing::warn;

use reel_models::SceneRange;

use crate::command::{FfmpegCommand, FfmpegRunner};

pub const STAGE_SCENES: &str = "detect_scenes";

/// Scene score above which a frame counts as a cut.
pub const SCENE_THRESHOLD: f64 = 0.4;

fn pts_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"pts_time:([\d.]+)").expect("valid regex"))
}

/// Build the scene-score command. Output is discarded; cuts are read from
/// `showinfo` lines on stderr.
pub fn scene_command(video: &Path) -> FfmpegCommand {
    FfmpegCommand::new(video, "-")
        .stage(STAGE_SCENES)
        .log_level("info")
        .video_filter(format!("select='gt(scene,{})',showinfo", SCENE_THRESHOLD))
        .output_args(["-vsync", "vfr", "-f", "null"])
}

/// Extract ascending cut timestamps from `showinfo` output.
pub fn parse_scene_cuts(stderr: &str) -> Vec<f64> {
    let mut cuts: Vec<f64> = pts_regex()
        .captures_iter(stderr)
        .filter_map(|c| c.get(1)?.as_str().parse().ok())
        .collect();
    cuts.sort_by(f64::total_cmp);
    cuts.dedup();
    cuts
}

/// Detect scenes in `video`. Failures degrade to an empty list.
pub async fn detect_scenes(runner: &FfmpegRunner, video: impl AsRef<Path>) -> Vec<SceneRange> {
    let video = video.as_ref();
    if !video.exists() {
        return Vec::new();
    }
    match runner.run_capture(&scene_command(video)).await {
        Ok((true, stderr)) => SceneRange::from_cuts(&parse_scene_cuts(&stderr)),
        Ok((false, _)) => {
            warn!(stage = STAGE_SCENES, "Scene detection exited with failure");
            Vec::new()
        }
        Err(e) => {
            warn!(stage = STAGE_SCENES, "Scene detection failed: {}", e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scene_cuts() {
        let stderr = "\
[Parsed_showinfo_1 @ 0x1] n:   0 pts:  12800 pts_time:4.2     duration: 512\n\
[Parsed_showinfo_1 @ 0x1] n:   1 pts:  25600 pts_time:1.5     duration: 512\n\
frame=    2 fps=0.0 q=-0.0 Lsize=N/A\n";
        assert_eq!(parse_scene_cuts(stderr), vec![1.5, 4.2]);
        assert!(parse_scene_cuts("nothing here").is_empty());
    }

    #[test]
    fn test_scene_command() {
        let args = scene_command(Path::new("v.mp4")).build_args().join(" ");
        assert!(args.contains("select='gt(scene,0.4)',showinfo"));
        assert!(args.ends_with("-f null -"));
    }
}
