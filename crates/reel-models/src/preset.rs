//! Export presets for target platforms.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Named output target: dimensions, bitrates and frame rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ExportPreset {
    pub id: String,
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub video_bitrate_kbps: u32,
    pub audio_bitrate_kbps: u32,
    pub fps: u32,
    pub aspect_ratio: String,
}

impl ExportPreset {
    fn vertical(id: &str, name: &str, video_bitrate_kbps: u32) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            width: 1080,
            height: 1920,
            video_bitrate_kbps,
            audio_bitrate_kbps: 128,
            fps: 30,
            aspect_ratio: "9:16".to_string(),
        }
    }

    /// Whether the preset carries usable explicit dimensions.
    pub fn has_dimensions(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Presets shipped with the service.
    pub fn builtin() -> Vec<ExportPreset> {
        vec![
            Self::vertical("tiktok", "TikTok", 6000),
            Self::vertical("reels", "Instagram Reels", 6000),
            Self::vertical("youtube_shorts", "YouTube Shorts", 8000),
            ExportPreset {
                id: "instagram_feed".to_string(),
                name: "Instagram Feed".to_string(),
                width: 1080,
                height: 1080,
                video_bitrate_kbps: 3500,
                audio_bitrate_kbps: 128,
                fps: 30,
                aspect_ratio: "1:1".to_string(),
            },
        ]
    }
}

/// Read-only lookup of presets by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetCatalog {
    presets: Vec<ExportPreset>,
}

impl Default for PresetCatalog {
    fn default() -> Self {
        Self {
            presets: ExportPreset::builtin(),
        }
    }
}

impl PresetCatalog {
    pub fn new(presets: Vec<ExportPreset>) -> Self {
        Self { presets }
    }

    /// Add presets, replacing existing entries with the same id.
    pub fn merge(mut self, extra: Vec<ExportPreset>) -> Self {
        for preset in extra {
            match self.presets.iter_mut().find(|p| p.id == preset.id) {
                Some(existing) => *existing = preset,
                None => self.presets.push(preset),
            }
        }
        self
    }

    pub fn get(&self, id: &str) -> Option<&ExportPreset> {
        self.presets.iter().find(|p| p.id == id)
    }

    pub fn all(&self) -> &[ExportPreset] {
        &self.presets
    }
}
