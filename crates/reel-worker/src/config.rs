//! Worker configuration.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reel_models::{ExportPreset, PresetCatalog};

use crate::error::{WorkerError, WorkerResult};

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Tasks handled concurrently
    pub concurrency: usize,
    /// Parent directory of per-task scratch workspaces
    pub work_dir: PathBuf,
    /// Kill any single transcoder invocation after this long
    pub stage_timeout: Duration,
    /// How often the worker should scan for orphaned pending tasks
    pub claim_interval: Duration,
    /// Minimum idle time before a pending task can be claimed (crash recovery)
    pub claim_min_idle: Duration,
    /// Graceful shutdown timeout
    pub shutdown_timeout: Duration,
    /// Optional JSON file of export presets merged over the built-ins
    pub presets_file: Option<PathBuf>,
    /// Audio chunk length for transcription, in seconds
    pub transcription_chunk_secs: f64,
    /// Address of the Prometheus scrape endpoint, if enabled
    pub metrics_addr: Option<SocketAddr>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            work_dir: std::env::temp_dir().join("reelcut"),
            stage_timeout: Duration::from_secs(1800),
            claim_interval: Duration::from_secs(30),
            claim_min_idle: Duration::from_secs(300), // 5 minutes
            shutdown_timeout: Duration::from_secs(60),
            presets_file: None,
            transcription_chunk_secs: 60.0,
            metrics_addr: None,
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            concurrency: env_parse::<usize>("WORKER_CONCURRENCY")
                .filter(|n| *n > 0)
                .unwrap_or(defaults.concurrency),
            work_dir: std::env::var("WORKER_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            stage_timeout: env_parse("WORKER_STAGE_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.stage_timeout),
            claim_interval: env_parse::<u64>("WORKER_CLAIM_INTERVAL_SECS")
                .filter(|n| *n > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.claim_interval),
            claim_min_idle: env_parse("WORKER_CLAIM_MIN_IDLE_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.claim_min_idle),
            shutdown_timeout: env_parse("WORKER_SHUTDOWN_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.shutdown_timeout),
            presets_file: std::env::var("EXPORT_PRESETS_FILE")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            transcription_chunk_secs: env_parse::<f64>("TRANSCRIPTION_CHUNK_SECS")
                .filter(|s| *s > 0.0)
                .unwrap_or(defaults.transcription_chunk_secs),
            metrics_addr: env_parse("METRICS_ADDR"),
        }
    }

    /// Built-in presets, extended or overridden by `presets_file` when set.
    pub fn load_presets(&self) -> WorkerResult<PresetCatalog> {
        match &self.presets_file {
            Some(path) => Ok(PresetCatalog::default().merge(read_presets(path)?)),
            None => Ok(PresetCatalog::default()),
        }
    }
}

fn read_presets(path: &Path) -> WorkerResult<Vec<ExportPreset>> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        WorkerError::config_error(format!("cannot read presets file {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&raw).map_err(|e| {
        WorkerError::config_error(format!("invalid presets file {}: {}", path.display(), e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = WorkerConfig::default();
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.stage_timeout, Duration::from_secs(1800));
        assert_eq!(config.transcription_chunk_secs, 60.0);
        assert!(config.presets_file.is_none());
    }

    #[test]
    fn test_zero_claim_interval_uses_default() {
        std::env::set_var("WORKER_CLAIM_INTERVAL_SECS", "0");
        let config = WorkerConfig::from_env();
        std::env::remove_var("WORKER_CLAIM_INTERVAL_SECS");
        assert_eq!(config.claim_interval, Duration::from_secs(30));
    }

    #[test]
    fn test_load_presets_merges_file() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(
            file.path(),
            r#"[
                {"id": "tiktok", "name": "TikTok HD", "width": 1080, "height": 1920,
                 "video_bitrate_kbps": 8000, "audio_bitrate_kbps": 192, "fps": 60,
                 "aspect_ratio": "9:16"},
                {"id": "story", "name": "Story", "width": 720, "height": 1280,
                 "video_bitrate_kbps": 3000, "audio_bitrate_kbps": 128, "fps": 30,
                 "aspect_ratio": "9:16"}
            ]"#,
        )
        .unwrap();

        let config = WorkerConfig {
            presets_file: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        let catalog = config.load_presets().unwrap();
        assert_eq!(catalog.get("tiktok").unwrap().fps, 60);
        assert_eq!(catalog.get("story").unwrap().width, 720);
        assert!(catalog.get("reels").is_some());
    }

    #[test]
    fn test_load_presets_rejects_bad_json() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "{not json").unwrap();
        let config = WorkerConfig {
            presets_file: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        assert!(matches!(
            config.load_presets(),
            Err(WorkerError::ConfigError(_))
        ));
    }
}
