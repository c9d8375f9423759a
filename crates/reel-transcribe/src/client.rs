//! Transcription service HTTP client.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};
use url::Url;

use reel_models::TranscriptSegment;

use crate::error::{TranscribeError, TranscribeResult};
use crate::types::TranscribeResponse;

/// Turns an audio file into timed transcript segments.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe `audio_path`. `language` is an ISO code; `None` lets the
    /// service detect it. Segment times are relative to the file start.
    async fn transcribe_file(
        &self,
        audio_path: &Path,
        language: Option<&str>,
    ) -> TranscribeResult<Vec<TranscriptSegment>>;
}

/// Configuration for the transcription client.
#[derive(Debug, Clone)]
pub struct TranscriberConfig {
    /// Base URL of the transcription service
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Max retries
    pub max_retries: u32,
    /// First retry delay, doubled on each attempt
    pub retry_base_delay: Duration,
}

impl Default for TranscriberConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9000".to_string(),
            timeout: Duration::from_secs(300),
            max_retries: 2,
            retry_base_delay: Duration::from_millis(500),
        }
    }
}

impl TranscriberConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("TRANSCRIBER_URL").unwrap_or(defaults.base_url),
            timeout: std::env::var("TRANSCRIBER_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            max_retries: std::env::var("TRANSCRIBER_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_retries),
            retry_base_delay: defaults.retry_base_delay,
        }
    }
}

/// Client for the transcription service.
///
/// Sends `POST {base_url}/transcribe` as multipart form data with a `file`
/// part and an optional `language` field.
pub struct HttpTranscriber {
    http: Client,
    endpoint: Url,
    config: TranscriberConfig,
}

impl HttpTranscriber {
    pub fn new(config: TranscriberConfig) -> TranscribeResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(TranscribeError::Network)?;

        let mut base = Url::parse(&config.base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base.join("transcribe")?;

        Ok(Self {
            http,
            endpoint,
            config,
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> TranscribeResult<Self> {
        Self::new(TranscriberConfig::from_env())
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn send_once(
        &self,
        audio: &[u8],
        file_name: &str,
        language: Option<&str>,
    ) -> TranscribeResult<TranscribeResponse> {
        let part = Part::bytes(audio.to_vec())
            .file_name(file_name.to_string())
            .mime_str("audio/wav")?;
        let mut form = Form::new().part("file", part);
        if let Some(lang) = language.filter(|l| !l.is_empty()) {
            form = form.text("language", lang.to_string());
        }

        let response = self
            .http
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = format!("transcription service returned {}: {}", status, body);
            return Err(
                if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                    TranscribeError::ServiceUnavailable(message)
                } else {
                    TranscribeError::RequestFailed(message)
                },
            );
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| TranscribeError::InvalidResponse(e.to_string()))
    }

    /// Execute with retry logic.
    async fn with_retry<F, Fut, T>(&self, operation: F) -> TranscribeResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = TranscribeResult<T>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = self.config.retry_base_delay.saturating_mul(2u32.pow(attempt));
                    warn!(
                        "Transcription request failed (attempt {}), retrying in {:?}: {}",
                        attempt + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl Transcriber for HttpTranscriber {
    async fn transcribe_file(
        &self,
        audio_path: &Path,
        language: Option<&str>,
    ) -> TranscribeResult<Vec<TranscriptSegment>> {
        let audio = tokio::fs::read(audio_path).await?;
        let file_name = audio_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.wav")
            .to_string();

        debug!(
            "Sending {} bytes of audio to {}",
            audio.len(),
            self.endpoint
        );

        let response = self
            .with_retry(|| self.send_once(&audio, &file_name, language))
            .await?;

        Ok(response
            .segments
            .into_iter()
            .filter(|s| !s.text.trim().is_empty())
            .map(TranscriptSegment::from)
            .collect())
    }
}
