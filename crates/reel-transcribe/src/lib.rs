//! Speech-to-text collaborator.
//!
//! This crate provides:
//! - The [`Transcriber`] trait consumed by the transcription handler
//! - An HTTP client for an external transcription service with retries

pub mod client;
pub mod error;
pub mod types;

pub use client::{HttpTranscriber, Transcriber, TranscriberConfig};
pub use error::{TranscribeError, TranscribeResult};
pub use types::{TranscribeResponse, TranscribedSegment};
