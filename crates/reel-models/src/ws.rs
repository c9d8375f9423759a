//! Real-time message envelope pushed to connected clients.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::job::Job;

/// Message delivered over a user's live connections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    /// A job's status or progress changed
    JobUpdated { job: Job },

    /// Keep-alive
    Ping,
}

impl WsMessage {
    pub fn job_updated(job: Job) -> Self {
        WsMessage::JobUpdated { job }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_updated_envelope() {
        let job = Job::new_render("user-1", "clip-1");
        let json: serde_json::Value =
            serde_json::from_str(&WsMessage::job_updated(job.clone()).to_json().unwrap()).unwrap();

        assert_eq!(json["type"], "job_updated");
        assert_eq!(json["job"]["id"], job.id.as_str());
        assert_eq!(json["job"]["status"], "pending");
    }

    #[test]
    fn test_ping() {
        assert_eq!(WsMessage::Ping.to_json().unwrap(), r#"{"type":"ping"}"#);
    }
}
