//! B-roll assets and the segments that place them on a clip timeline.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::clip::ClipId;
use crate::error::ValidationError;
use crate::id::string_id;

string_id!(
    /// Unique identifier for an uploaded B-roll asset.
    BrollAssetId
);

string_id!(
    /// Unique identifier for a B-roll placement on a clip.
    BrollSegmentId
);

/// Default overlay scale applied when a segment stores a non-positive value.
pub const DEFAULT_SCALE: f64 = 0.5;

/// Default overlay opacity applied when a segment stores a non-positive value.
pub const DEFAULT_OPACITY: f64 = 1.0;

/// An uploaded secondary video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BrollAsset {
    pub id: BrollAssetId,
    pub user_id: String,
    #[serde(default)]
    pub name: String,
    /// Object storage key of the asset file
    pub storage_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default)]
    pub file_size: u64,
    pub created_at: DateTime<Utc>,
}

impl BrollAsset {
    pub fn new(user_id: impl Into<String>, storage_path: impl Into<String>) -> Self {
        Self {
            id: BrollAssetId::new(),
            user_id: user_id.into(),
            name: String::new(),
            storage_path: storage_path.into(),
            duration: None,
            width: None,
            height: None,
            file_size: 0,
            created_at: Utc::now(),
        }
    }
}

/// How a segment is placed on the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum BrollPosition {
    CutIn,
    #[default]
    Overlay,
}

/// A B-roll asset placed on a clip, in clip-relative seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct BrollSegment {
    pub id: BrollSegmentId,
    pub clip_id: ClipId,
    pub broll_asset_id: BrollAssetId,
    #[validate(range(min = 0.0))]
    pub start_time: f64,
    #[validate(range(exclusive_min = 0.0))]
    pub end_time: f64,
    #[serde(default)]
    pub position: BrollPosition,
    #[serde(default)]
    #[validate(range(exclusive_min = 0.0))]
    pub scale: f64,
    #[serde(default)]
    #[validate(range(exclusive_min = 0.0, max = 1.0))]
    pub opacity: f64,
    #[serde(default)]
    pub sequence_order: i32,
    /// Asset preloaded by the repository, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<BrollAsset>,
}

impl BrollSegment {
    pub fn new(
        clip_id: ClipId,
        broll_asset_id: BrollAssetId,
        start_time: f64,
        end_time: f64,
    ) -> Self {
        Self {
            id: BrollSegmentId::new(),
            clip_id,
            broll_asset_id,
            start_time,
            end_time,
            position: BrollPosition::default(),
            scale: DEFAULT_SCALE,
            opacity: DEFAULT_OPACITY,
            sequence_order: 0,
            asset: None,
        }
    }

    /// Scale to pass to the overlay stage.
    pub fn effective_scale(&self) -> f64 {
        if self.scale > 0.0 {
            self.scale
        } else {
            DEFAULT_SCALE
        }
    }

    /// Opacity to pass to the overlay stage.
    pub fn effective_opacity(&self) -> f64 {
        if self.opacity > 0.0 {
            self.opacity.min(1.0)
        } else {
            DEFAULT_OPACITY
        }
    }

    /// Validate field ranges and that the segment fits inside the clip.
    pub fn validate_within(&self, clip_duration: f64) -> Result<(), ValidationError> {
        self.validate()?;
        if self.end_time <= self.start_time {
            return Err(ValidationError::new(
                "end_time",
                "must be greater than start_time",
            ));
        }
        if self.end_time > clip_duration {
            return Err(ValidationError::new(
                "end_time",
                format!("must not exceed clip duration {:.3}", clip_duration),
            ));
        }
        Ok(())
    }

    /// Sequence order for a segment appended after `existing`.
    pub fn next_sequence_order(existing: &[BrollSegment]) -> i32 {
        existing
            .iter()
            .map(|s| s.sequence_order)
            .max()
            .map_or(1, |max| max + 1)
    }
}
