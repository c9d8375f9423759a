//! Background job record and its status state machine.
//!
//! A [`Job`] is created when a task is enqueued and is mutated only by the
//! worker that handles that task. The one exception is an owner's cancel
//! request, which flips the status only while the job is not yet terminal.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::id::string_id;

string_id!(
    /// Unique identifier for a background job.
    JobId
);

/// Kind of background work a job tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    VideoProcessing,
    Transcription,
    Analysis,
    Rendering,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::VideoProcessing => "video_processing",
            JobType::Transcription => "transcription",
            JobType::Analysis => "analysis",
            JobType::Rendering => "rendering",
        }
    }
}

/// Kind of entity a job refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Video,
    Clip,
    Transcription,
}

/// Job processing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Job is queued waiting for a worker
    #[default]
    Pending,
    /// Job is actively being processed
    Processing,
    /// Job completed successfully
    Completed,
    /// Job failed with an error
    Failed,
    /// Owner cancelled the job before it finished
    Cancelled,
}

impl JobStatus {
    /// Get string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }

    /// Whether moving from `self` to `next` is allowed.
    ///
    /// `completed` and `failed` are reached from `processing` only.
    /// `cancelled` is reachable from `pending` and `processing`, and nothing
    /// leaves a terminal state. Re-entering `processing` is allowed so
    /// redelivered tasks can resume.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            JobStatus::Pending => false,
            JobStatus::Processing | JobStatus::Cancelled => true,
            JobStatus::Completed | JobStatus::Failed => *self == JobStatus::Processing,
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Rejected status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid job transition from {from} to {to}")]
pub struct JobTransitionError {
    pub from: JobStatus,
    pub to: JobStatus,
}

/// A tracked unit of background work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Job {
    /// Unique job ID
    pub id: JobId,

    /// Owning user
    pub user_id: String,

    /// Kind of work
    pub job_type: JobType,

    /// Kind of the referenced entity
    pub entity_type: EntityType,

    /// ID of the referenced entity
    pub entity_id: String,

    /// Scheduling priority (higher runs first where supported)
    #[serde(default)]
    pub priority: i32,

    /// Current status
    #[serde(default)]
    pub status: JobStatus,

    /// Progress (0-100), advisory
    #[serde(default)]
    pub progress: u8,

    /// Error message (if failed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Number of retry attempts
    #[serde(default)]
    pub retry_count: u32,

    /// Maximum retries allowed
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Opaque caller metadata
    #[serde(default)]
    pub metadata: serde_json::Value,

    /// Started at timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    /// Completed at timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

fn default_max_retries() -> u32 {
    3
}

impl Job {
    /// Create a new pending job.
    pub fn new(
        user_id: impl Into<String>,
        job_type: JobType,
        entity_type: EntityType,
        entity_id: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            user_id: user_id.into(),
            job_type,
            entity_type,
            entity_id: entity_id.into(),
            priority: 0,
            status: JobStatus::Pending,
            progress: 0,
            error_message: None,
            retry_count: 0,
            max_retries: default_max_retries(),
            metadata: serde_json::Value::Null,
            started_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a rendering job for a clip.
    pub fn new_render(user_id: impl Into<String>, clip_id: impl Into<String>) -> Self {
        Self::new(user_id, JobType::Rendering, EntityType::Clip, clip_id)
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    fn transition(&mut self, next: JobStatus) -> Result<(), JobTransitionError> {
        if !self.status.can_transition_to(next) {
            return Err(JobTransitionError {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Move to `processing` and record the start checkpoint.
    pub fn start(&mut self) -> Result<(), JobTransitionError> {
        self.transition(JobStatus::Processing)?;
        if self.started_at.is_none() {
            self.started_at = Some(Utc::now());
        }
        self.set_progress(10);
        Ok(())
    }

    /// Raise progress. Lower values are ignored while processing.
    pub fn set_progress(&mut self, progress: u8) {
        let progress = progress.min(100);
        if self.status == JobStatus::Processing && progress < self.progress {
            return;
        }
        self.progress = progress;
        self.updated_at = Utc::now();
    }

    /// Mark job as completed.
    pub fn complete(&mut self) -> Result<(), JobTransitionError> {
        self.transition(JobStatus::Completed)?;
        self.progress = 100;
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Mark job as failed with the given message.
    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), JobTransitionError> {
        self.transition(JobStatus::Failed)?;
        self.error_message = Some(error.into());
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Apply an owner's cancel request.
    ///
    /// Returns `true` if the status changed. A request against a terminal
    /// job is a no-op.
    pub fn cancel(&mut self) -> bool {
        if self.transition(JobStatus::Cancelled).is_err() {
            return false;
        }
        self.completed_at = Some(Utc::now());
        true
    }

    /// Check if job can be retried.
    pub fn can_retry(&self) -> bool {
        self.retry_count < self.max_retries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [JobStatus; 5] = [
        JobStatus::Pending,
        JobStatus::Processing,
        JobStatus::Completed,
        JobStatus::Failed,
        JobStatus::Cancelled,
    ];

    #[test]
    fn test_job_creation() {
        let job = Job::new_render("user-1", "clip-1");
        assert_eq!(job.job_type, JobType::Rendering);
        assert_eq!(job.entity_type, EntityType::Clip);
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.progress, 0);
        assert!(!job.is_terminal());
    }

    #[test]
    fn test_job_happy_path() {
        let mut job = Job::new_render("user-1", "clip-1");

        job.start().unwrap();
        assert_eq!(job.status, JobStatus::Processing);
        assert_eq!(job.progress, 10);
        assert!(job.started_at.is_some());

        job.complete().unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.progress, 100);
        assert!(job.completed_at.is_some());
    }

    #[test]
    fn test_job_failure_records_message() {
        let mut job = Job::new_render("user-1", "clip-1");
        job.start().unwrap();
        job.fail("crop: exit status 1").unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error_message.as_deref(), Some("crop: exit status 1"));
    }

    #[test]
    fn test_terminal_states_are_final() {
        for terminal in [JobStatus::Completed, JobStatus::Failed, JobStatus::Cancelled] {
            for next in ALL {
                assert!(
                    !terminal.can_transition_to(next),
                    "{} -> {} must be rejected",
                    terminal,
                    next
                );
            }
        }
    }

    #[test]
    fn test_no_backward_transitions() {
        assert!(!JobStatus::Processing.can_transition_to(JobStatus::Pending));
        assert!(JobStatus::Pending.can_transition_to(JobStatus::Processing));
        assert!(JobStatus::Processing.can_transition_to(JobStatus::Completed));
        assert!(JobStatus::Processing.can_transition_to(JobStatus::Failed));
    }

    #[test]
    fn test_pending_must_start_before_finishing() {
        assert!(!JobStatus::Pending.can_transition_to(JobStatus::Completed));
        assert!(!JobStatus::Pending.can_transition_to(JobStatus::Failed));

        let mut job = Job::new_render("user-1", "clip-1");
        let err = job.complete().unwrap_err();
        assert_eq!(err.from, JobStatus::Pending);
        assert_eq!(err.to, JobStatus::Completed);
        assert!(job.fail("boom").is_err());
        assert_eq!(job.status, JobStatus::Pending);
        assert!(job.error_message.is_none());
        assert!(job.completed_at.is_none());
    }

    #[test]
    fn test_cancel_only_before_terminal() {
        let mut pending = Job::new_render("user-1", "clip-1");
        assert!(pending.cancel());
        assert_eq!(pending.status, JobStatus::Cancelled);

        let mut processing = Job::new_render("user-1", "clip-1");
        processing.start().unwrap();
        assert!(processing.cancel());

        let mut completed = Job::new_render("user-1", "clip-1");
        completed.start().unwrap();
        completed.complete().unwrap();
        assert!(!completed.cancel());
        assert_eq!(completed.status, JobStatus::Completed);

        let mut failed = Job::new_render("user-1", "clip-1");
        failed.start().unwrap();
        failed.fail("boom").unwrap();
        assert!(!failed.cancel());
        assert_eq!(failed.status, JobStatus::Failed);
    }

    #[test]
    fn test_progress_non_decreasing_while_processing() {
        let mut job = Job::new_render("user-1", "clip-1");
        job.start().unwrap();
        job.set_progress(60);
        job.set_progress(30);
        assert_eq!(job.progress, 60);
        job.set_progress(250);
        assert_eq!(job.progress, 100);
    }

    #[test]
    fn test_restart_keeps_started_at() {
        let mut job = Job::new_render("user-1", "clip-1");
        job.start().unwrap();
        let first = job.started_at;
        job.set_progress(50);
        job.start().unwrap();
        assert_eq!(job.started_at, first);
        assert_eq!(job.progress, 50);
    }

    #[test]
    fn test_job_serde_shape() {
        let job = Job::new_render("user-1", "clip-1");
        let json = serde_json::to_value(&job).unwrap();
        assert_eq!(json["status"], "pending");
        assert_eq!(json["job_type"], "rendering");
        assert_eq!(json["entity_type"], "clip");
        assert!(json.get("error_message").is_none());

        let parsed: Job = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, job);
    }
}
