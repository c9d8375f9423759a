//! Caption blocks.

use serde::{Deserialize, Serialize};

/// A timed caption chunk in absolute seconds. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionBlock {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl CaptionBlock {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}
