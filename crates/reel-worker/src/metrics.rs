//! Worker metrics.

use std::net::SocketAddr;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::{WorkerError, WorkerResult};

/// Metric names as constants for consistency.
pub mod names {
    pub const TASKS_TOTAL: &str = "reel_tasks_total";
    pub const TASK_DURATION_SECONDS: &str = "reel_task_duration_seconds";
    pub const BROLL_SKIPPED_TOTAL: &str = "reel_broll_skipped_total";
}

/// How a task execution ended, as seen by the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Succeeded,
    Retrying,
    DeadLettered,
}

impl TaskOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskOutcome::Succeeded => "succeeded",
            TaskOutcome::Retrying => "retrying",
            TaskOutcome::DeadLettered => "dead_lettered",
        }
    }
}

/// Serve Prometheus metrics on `addr`.
pub fn install_exporter(addr: SocketAddr) -> WorkerResult<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| WorkerError::config_error(format!("metrics exporter: {}", e)))
}

pub fn record_task(task_type: &'static str, outcome: TaskOutcome, duration_secs: f64) {
    counter!(names::TASKS_TOTAL, "task_type" => task_type, "outcome" => outcome.as_str())
        .increment(1);
    histogram!(names::TASK_DURATION_SECONDS, "task_type" => task_type).record(duration_secs);
}

pub fn record_broll_skipped() {
    counter!(names::BROLL_SKIPPED_TOTAL).increment(1);
}
