//! Scene analysis results for a source video.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::video::VideoId;

/// Length given to the last detected scene, which has no following cut.
pub const TRAILING_SCENE_SECS: f64 = 10.0;

/// A detected scene `[start, end]` in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SceneRange {
    pub start: f64,
    pub end: f64,
}

impl SceneRange {
    /// Build consecutive ranges from ascending scene-cut timestamps.
    pub fn from_cuts(cuts: &[f64]) -> Vec<SceneRange> {
        cuts.iter()
            .enumerate()
            .map(|(i, &start)| SceneRange {
                start,
                end: cuts.get(i + 1).copied().unwrap_or(start + TRAILING_SCENE_SECS),
            })
            .collect()
    }
}

/// Stored analysis for a video. One per video; re-runs replace it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VideoAnalysis {
    pub video_id: VideoId,
    #[serde(default)]
    pub scenes: Vec<SceneRange>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VideoAnalysis {
    pub fn new(video_id: VideoId, scenes: Vec<SceneRange>) -> Self {
        let now = Utc::now();
        Self {
            video_id,
            scenes,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranges_from_cuts() {
        let ranges = SceneRange::from_cuts(&[1.5, 4.0, 9.25]);
        assert_eq!(
            ranges,
            vec![
                SceneRange { start: 1.5, end: 4.0 },
                SceneRange { start: 4.0, end: 9.25 },
                SceneRange { start: 9.25, end: 19.25 },
            ]
        );
        assert!(SceneRange::from_cuts(&[]).is_empty());
    }
}
