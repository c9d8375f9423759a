//! Wire types of the transcription service.

use serde::{Deserialize, Serialize};

use reel_models::TranscriptSegment;

/// One recognised span, in seconds relative to the submitted audio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscribedSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl From<TranscribedSegment> for TranscriptSegment {
    fn from(s: TranscribedSegment) -> Self {
        let mut segment = TranscriptSegment::new(s.start, s.end, s.text.trim());
        segment.confidence = s.confidence;
        segment
    }
}

/// Response body of `POST /transcribe`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscribeResponse {
    #[serde(default)]
    pub segments: Vec<TranscribedSegment>,
    /// Detected or requested language
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}
