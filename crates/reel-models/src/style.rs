//! Caption and branding style for a clip.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::clip::ClipId;
use crate::error::ValidationError;

/// Fonts the caption renderer is allowed to reference.
pub const ALLOWED_FONTS: &[&str] = &["Arial", "Inter", "Montserrat", "Open Sans", "Roboto", "Helvetica"];

/// Font used when the requested one is not allowed.
pub const DEFAULT_FONT: &str = "Arial";

pub const DEFAULT_CAPTION_SIZE: u32 = 48;
pub const MAX_CAPTION_SIZE: u32 = 120;
pub const DEFAULT_MAX_WORDS: u32 = 3;

/// Resolve a font name against [`ALLOWED_FONTS`] (case-insensitive).
pub fn resolve_font(name: &str) -> &'static str {
    let name = name.trim();
    ALLOWED_FONTS
        .iter()
        .find(|f| f.eq_ignore_ascii_case(name))
        .copied()
        .unwrap_or(DEFAULT_FONT)
}

/// Vertical caption placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum CaptionPosition {
    Top,
    #[serde(alias = "centre")]
    Center,
    #[default]
    Bottom,
}

impl CaptionPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptionPosition::Top => "top",
            CaptionPosition::Center => "center",
            CaptionPosition::Bottom => "bottom",
        }
    }
}

impl fmt::Display for CaptionPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CaptionPosition {
    type Err = CaptionPositionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "top" => Ok(CaptionPosition::Top),
            "center" | "centre" => Ok(CaptionPosition::Center),
            "bottom" => Ok(CaptionPosition::Bottom),
            _ => Err(CaptionPositionParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown caption position: {0}")]
pub struct CaptionPositionParseError(pub String);

/// Caption and branding configuration, one per clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClipStyle {
    pub clip_id: ClipId,

    #[serde(default)]
    pub caption_enabled: bool,
    #[serde(default = "default_font")]
    pub caption_font: String,
    #[serde(default = "default_caption_size")]
    pub caption_size: u32,
    /// Primary text color as `#RRGGBB` or `#AARRGGBB`
    #[serde(default = "default_caption_color")]
    pub caption_color: String,
    /// Background color as `#RRGGBB` or `#AARRGGBB`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption_bg_color: Option<String>,
    #[serde(default)]
    pub caption_position: CaptionPosition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption_animation: Option<String>,
    #[serde(default = "default_max_words")]
    pub caption_max_words: u32,
    /// Preferred transcript language for captions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption_language: Option<String>,

    // Branding and audio settings are carried through unchanged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_logo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_logo_position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_logo_scale: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_watermark_opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_music_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_music_volume: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_audio_volume: Option<f64>,
}

fn default_font() -> String {
    DEFAULT_FONT.to_string()
}

fn default_caption_size() -> u32 {
    DEFAULT_CAPTION_SIZE
}

fn default_caption_color() -> String {
    "#FFFFFF".to_string()
}

fn default_max_words() -> u32 {
    DEFAULT_MAX_WORDS
}

impl ClipStyle {
    /// Default style for a clip, captions disabled.
    pub fn new(clip_id: ClipId) -> Self {
        Self {
            clip_id,
            caption_enabled: false,
            caption_font: default_font(),
            caption_size: DEFAULT_CAPTION_SIZE,
            caption_color: default_caption_color(),
            caption_bg_color: None,
            caption_position: CaptionPosition::default(),
            caption_animation: None,
            caption_max_words: DEFAULT_MAX_WORDS,
            caption_language: None,
            brand_logo_url: None,
            brand_logo_position: None,
            brand_logo_scale: None,
            brand_watermark_opacity: None,
            background_music_url: None,
            background_music_volume: None,
            original_audio_volume: None,
        }
    }

    pub fn with_captions(mut self, enabled: bool) -> Self {
        self.caption_enabled = enabled;
        self
    }

    /// Font name after allow-list resolution.
    pub fn resolved_font(&self) -> &'static str {
        resolve_font(&self.caption_font)
    }

    /// Caption size clamped into `1..=120`; zero means the default size.
    pub fn effective_size(&self) -> u32 {
        match self.caption_size {
            0 => DEFAULT_CAPTION_SIZE,
            s => s.min(MAX_CAPTION_SIZE),
        }
    }

    /// Words per caption chunk; zero means the default.
    pub fn effective_max_words(&self) -> usize {
        match self.caption_max_words {
            0 => DEFAULT_MAX_WORDS as usize,
            n => n as usize,
        }
    }

    /// Strict validation for user input.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !ALLOWED_FONTS
            .iter()
            .any(|f| f.eq_ignore_ascii_case(self.caption_font.trim()))
        {
            return Err(ValidationError::new(
                "caption_font",
                format!("font must be one of: {}", ALLOWED_FONTS.join(", ")),
            ));
        }
        if self.caption_size == 0 || self.caption_size > MAX_CAPTION_SIZE {
            return Err(ValidationError::new(
                "caption_size",
                format!("must be between 1 and {}", MAX_CAPTION_SIZE),
            ));
        }
        if self.caption_max_words == 0 {
            return Err(ValidationError::new(
                "caption_max_words",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_font() {
        assert_eq!(resolve_font("roboto"), "Roboto");
        assert_eq!(resolve_font("OPEN SANS"), "Open Sans");
        assert_eq!(resolve_font("Comic Sans"), DEFAULT_FONT);
        assert_eq!(resolve_font(""), DEFAULT_FONT);
    }

    #[test]
    fn test_position_parse() {
        assert_eq!("top".parse::<CaptionPosition>().unwrap(), CaptionPosition::Top);
        assert_eq!("Centre".parse::<CaptionPosition>().unwrap(), CaptionPosition::Center);
        assert!("left".parse::<CaptionPosition>().is_err());

        let p: CaptionPosition = serde_json::from_str("\"centre\"").unwrap();
        assert_eq!(p, CaptionPosition::Center);
    }

    #[test]
    fn test_effective_values() {
        let mut style = ClipStyle::new(ClipId::from("clip-1"));
        style.caption_size = 500;
        style.caption_max_words = 0;
        assert_eq!(style.effective_size(), MAX_CAPTION_SIZE);
        assert_eq!(style.effective_max_words(), 3);

        style.caption_size = 0;
        assert_eq!(style.effective_size(), DEFAULT_CAPTION_SIZE);
    }

    #[test]
    fn test_validate_rejects_unknown_font() {
        let mut style = ClipStyle::new(ClipId::from("clip-1"));
        assert!(style.validate().is_ok());

        style.caption_font = "Papyrus".into();
        assert_eq!(style.validate().unwrap_err().field, "caption_font");
    }

    #[test]
    fn test_deserialize_minimal() {
        let style: ClipStyle = serde_json::from_str(r#"{"clip_id":"c1"}"#).unwrap();
        assert!(!style.caption_enabled);
        assert_eq!(style.caption_font, "Arial");
        assert_eq!(style.caption_max_words, 3);
        assert_eq!(style.caption_position, CaptionPosition::Bottom);
    }
}
