//! Collaborators shared by every task handler.

use std::sync::Arc;

use reel_media::{FfmpegRunner, FfmpegTools, FfmpegTranscoder, MediaTools, Transcoder};
use reel_models::PresetCatalog;
use reel_notify::JobNotifier;
use reel_repo::Repository;
use reel_storage::ObjectStorage;
use reel_transcribe::Transcriber;

use crate::config::WorkerConfig;

/// Everything a handler needs, injected once at startup.
#[derive(Clone)]
pub struct WorkerContext {
    pub config: WorkerConfig,
    pub repo: Arc<dyn Repository>,
    pub storage: Arc<dyn ObjectStorage>,
    pub notifier: Arc<dyn JobNotifier>,
    pub transcriber: Arc<dyn Transcriber>,
    pub transcoder: Arc<dyn Transcoder>,
    pub tools: Arc<dyn MediaTools>,
    pub presets: PresetCatalog,
}

impl WorkerContext {
    /// Context with ffmpeg-backed media stages honouring the configured
    /// stage timeout.
    pub fn new(
        config: WorkerConfig,
        repo: Arc<dyn Repository>,
        storage: Arc<dyn ObjectStorage>,
        notifier: Arc<dyn JobNotifier>,
        transcriber: Arc<dyn Transcriber>,
        presets: PresetCatalog,
    ) -> Self {
        let timeout = config.stage_timeout.as_secs();
        Self {
            transcoder: Arc::new(FfmpegTranscoder::new().with_timeout(timeout)),
            tools: Arc::new(FfmpegTools::new(FfmpegRunner::new().with_timeout(timeout))),
            config,
            repo,
            storage,
            notifier,
            transcriber,
            presets,
        }
    }

    pub fn with_transcoder(mut self, transcoder: Arc<dyn Transcoder>) -> Self {
        self.transcoder = transcoder;
        self
    }

    pub fn with_tools(mut self, tools: Arc<dyn MediaTools>) -> Self {
        self.tools = tools;
        self
    }
}
