//! Structured task logging.

use tracing::{error, info, warn, Span};

/// Logger carrying the identity of one task execution.
///
/// Every line is tagged with the task type and the id of the entity being
/// worked on, so a render can be followed across stages.
#[derive(Debug, Clone)]
pub struct JobLogger {
    entity_id: String,
    task_type: String,
}

impl JobLogger {
    pub fn new(task_type: &str, entity_id: impl ToString) -> Self {
        Self {
            entity_id: entity_id.to_string(),
            task_type: task_type.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            entity_id = %self.entity_id,
            task_type = %self.task_type,
            "Task started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            entity_id = %self.entity_id,
            task_type = %self.task_type,
            "Task progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            entity_id = %self.entity_id,
            task_type = %self.task_type,
            "Task warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            entity_id = %self.entity_id,
            task_type = %self.task_type,
            "Task error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            entity_id = %self.entity_id,
            task_type = %self.task_type,
            "Task completed: {}", message
        );
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    pub fn task_type(&self) -> &str {
        &self.task_type
    }

    /// Span to instrument the whole handler with.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "task",
            entity_id = %self.entity_id,
            task_type = %self.task_type
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_models::ClipId;

    #[test]
    fn test_job_logger_creation() {
        let clip_id = ClipId::new();
        let logger = JobLogger::new("render", &clip_id);

        assert_eq!(logger.entity_id(), clip_id.to_string());
        assert_eq!(logger.task_type(), "render");
    }

    #[test]
    fn test_span_metadata() {
        let logger = JobLogger::new("analysis", "video-1");
        let span = logger.create_span();
        if let Some(meta) = span.metadata() {
            assert_eq!(meta.name(), "task");
        }
    }
}
