//! Clip definitions.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::error::ValidationError;
use crate::id::string_id;
use crate::video::VideoId;

string_id!(
    /// Unique identifier for a clip.
    ClipId
);

/// Clip lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClipStatus {
    #[default]
    Draft,
    Rendering,
    Ready,
    Failed,
}

impl ClipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClipStatus::Draft => "draft",
            ClipStatus::Rendering => "rendering",
            ClipStatus::Ready => "ready",
            ClipStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ClipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An editable clip cut from a source video.
///
/// `storage_path` is set only while `status` is [`ClipStatus::Ready`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Clip {
    pub id: ClipId,
    pub video_id: VideoId,
    pub user_id: String,
    #[serde(default)]
    pub name: String,
    /// Start time in source seconds
    pub start_time: f64,
    /// End time in source seconds
    pub end_time: f64,
    /// Aspect ratio label such as "9:16"
    #[serde(default = "default_aspect_ratio")]
    pub aspect_ratio: String,
    #[serde(default)]
    pub status: ClipStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<String>,
    /// Storage key of the clip's preview frame
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_aspect_ratio() -> String {
    AspectRatio::PORTRAIT.to_string()
}

impl Clip {
    pub fn new(
        video_id: VideoId,
        user_id: impl Into<String>,
        start_time: f64,
        end_time: f64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ClipId::new(),
            video_id,
            user_id: user_id.into(),
            name: String::new(),
            start_time,
            end_time,
            aspect_ratio: default_aspect_ratio(),
            status: ClipStatus::Draft,
            storage_path: None,
            thumbnail_path: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: impl Into<String>) -> Self {
        self.aspect_ratio = aspect_ratio.into();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Clip length in seconds.
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// Check the time range is well-formed.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.start_time.is_finite() || self.start_time < 0.0 {
            return Err(ValidationError::new(
                "start_time",
                "must be a non-negative number",
            ));
        }
        if !self.end_time.is_finite() || self.end_time <= self.start_time {
            return Err(ValidationError::new(
                "end_time",
                "must be greater than start_time",
            ));
        }
        Ok(())
    }

    /// Parsed aspect ratio, if the stored label is well-formed.
    pub fn parsed_aspect_ratio(&self) -> Option<AspectRatio> {
        self.aspect_ratio.parse().ok()
    }

    pub fn mark_rendering(&mut self) {
        self.status = ClipStatus::Rendering;
        self.storage_path = None;
        self.updated_at = Utc::now();
    }

    pub fn mark_ready(&mut self, storage_path: impl Into<String>) {
        self.status = ClipStatus::Ready;
        self.storage_path = Some(storage_path.into());
        self.updated_at = Utc::now();
    }

    pub fn set_thumbnail(&mut self, key: impl Into<String>) {
        self.thumbnail_path = Some(key.into());
        self.updated_at = Utc::now();
    }

    pub fn mark_failed(&mut self) {
        self.status = ClipStatus::Failed;
        self.storage_path = None;
        self.updated_at = Utc::now();
    }
}

/// Aspect ratio as width:height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct AspectRatio {
    pub width: u32,
    pub height: u32,
}

impl AspectRatio {
    /// Standard portrait (9:16) for TikTok/Reels
    pub const PORTRAIT: AspectRatio = AspectRatio {
        width: 9,
        height: 16,
    };

    /// Square (1:1)
    pub const SQUARE: AspectRatio = AspectRatio {
        width: 1,
        height: 1,
    };

    /// Landscape (16:9)
    pub const LANDSCAPE: AspectRatio = AspectRatio {
        width: 16,
        height: 9,
    };

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns the aspect ratio as a decimal.
    pub fn as_f64(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

impl FromStr for AspectRatio {
    type Err = AspectRatioParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| AspectRatioParseError::InvalidFormat(s.to_string()))?;

        let width = w
            .parse()
            .map_err(|_| AspectRatioParseError::InvalidNumber(w.to_string()))?;
        let height = h
            .parse()
            .map_err(|_| AspectRatioParseError::InvalidNumber(h.to_string()))?;

        if width == 0 || height == 0 {
            return Err(AspectRatioParseError::ZeroValue);
        }

        Ok(AspectRatio { width, height })
    }
}

impl Default for AspectRatio {
    fn default() -> Self {
        Self::PORTRAIT
    }
}

#[derive(Debug, Error)]
pub enum AspectRatioParseError {
    #[error("Invalid aspect ratio format: {0}, expected 'W:H'")]
    InvalidFormat(String),
    #[error("Invalid number in aspect ratio: {0}")]
    InvalidNumber(String),
    #[error("Aspect ratio cannot have zero values")]
    ZeroValue,
}
