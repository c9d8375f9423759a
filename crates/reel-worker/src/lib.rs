//! Render and ingest worker.
//!
//! This crate provides:
//! - The worker pool that drains the task queue
//! - Handlers for metadata, thumbnail, transcription, analysis, clip
//!   thumbnail and render tasks
//! - The render orchestrator that chains the media stages for one clip
//! - Structured task logging and Prometheus metrics
//!
//! The `reel-worker` binary wires a [`reel_repo::MemoryRepo`], so it only
//! sees entities created inside its own process. It is a harness until a
//! persistent [`reel_repo::Repository`] backend exists.

pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod handlers;
pub mod logging;
pub mod metrics;
pub mod render;
pub mod workspace;

pub use config::WorkerConfig;
pub use context::WorkerContext;
pub use error::{ErrorKind, WorkerError, WorkerResult};
pub use executor::JobExecutor;
pub use handlers::process_task;
pub use logging::JobLogger;
pub use render::{render_key, RenderInputs, RenderOrchestrator};
