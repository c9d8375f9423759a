//! Worker binary.
//!
//! Runs against an in-memory repository; tasks referring to entities it has
//! not seen end up dead-lettered as not found.

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use reel_notify::Hub;
use reel_queue::RedisQueue;
use reel_repo::MemoryRepo;
use reel_storage::S3Client;
use reel_transcribe::HttpTranscriber;
use reel_worker::{metrics, JobExecutor, WorkerConfig, WorkerContext};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider (required for TLS/HTTPS)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    dotenvy::dotenv().ok();

    // Colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("reel=info".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting reel-worker");

    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);

    if let Some(addr) = config.metrics_addr {
        metrics::install_exporter(addr)?;
        info!("Serving metrics on {}", addr);
    }

    let presets = config.load_presets()?;
    let queue = Arc::new(RedisQueue::from_env()?);
    let storage = Arc::new(S3Client::from_env()?);
    if let Err(e) = storage.check_connectivity().await {
        warn!("Object storage connectivity check failed: {}", e);
    }
    let transcriber = Arc::new(HttpTranscriber::from_env()?);
    let notifier = Arc::new(Hub::default());

    warn!("Using in-memory repository; entity state is not persisted across restarts");
    let repo = Arc::new(MemoryRepo::new());

    let ctx = WorkerContext::new(config, repo, storage, notifier, transcriber, presets);
    let executor = Arc::new(JobExecutor::new(ctx, queue));

    let signal_executor = Arc::clone(&executor);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        signal_executor.shutdown();
    });

    if let Err(e) = executor.run().await {
        error!("Executor error: {}", e);
        return Err(e.into());
    }

    info!("Worker shutdown complete");
    Ok(())
}
