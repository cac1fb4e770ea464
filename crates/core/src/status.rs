//! Orchestrator job status wire types.
//!
//! The status lookup returns
//! `{"status": "QUEUED"|"PROCESSING"|"SUCCESS"|"FAILURE", "queue_position"?, "queue_total"?, "error"?}`.

use serde::{Deserialize, Serialize};

/// Job status as reported by the orchestrator.
///
/// `Success` and `Failure` are terminal: no further transitions happen
/// for that job once either is observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Queued,
    Processing,
    Success,
    Failure,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Failure)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "QUEUED",
            JobStatus::Processing => "PROCESSING",
            JobStatus::Success => "SUCCESS",
            JobStatus::Failure => "FAILURE",
        }
    }
}

/// Position of a queued job, informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuePosition {
    /// 1-based place in the queue.
    pub position: u32,
    /// Total number of queued jobs.
    pub total: u32,
}

/// Body of a status lookup response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_position: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_total: Option<u32>,
    /// Backend-originated failure text. Operator-only; never shown to users.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatusReport {
    pub fn new(status: JobStatus) -> Self {
        Self {
            status,
            queue_position: None,
            queue_total: None,
            error: None,
        }
    }

    pub fn queued(position: u32, total: u32) -> Self {
        Self {
            queue_position: Some(position),
            queue_total: Some(total),
            ..Self::new(JobStatus::Queued)
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::new(JobStatus::Failure)
        }
    }

    /// Queue position, only while the job is queued and both fields are present.
    pub fn queue(&self) -> Option<QueuePosition> {
        if self.status != JobStatus::Queued {
            return None;
        }
        match (self.queue_position, self.queue_total) {
            (Some(position), Some(total)) => Some(QueuePosition { position, total }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_queued_with_position() {
        let json = r#"{"status":"QUEUED","queue_position":3,"queue_total":5}"#;
        let report: StatusReport = serde_json::from_str(json).unwrap();
        assert_eq!(report.status, JobStatus::Queued);
        assert_eq!(
            report.queue(),
            Some(QueuePosition {
                position: 3,
                total: 5
            })
        );
    }

    #[test]
    fn parse_failure_with_error() {
        let json = r#"{"status":"FAILURE","error":"CUDA out of memory"}"#;
        let report: StatusReport = serde_json::from_str(json).unwrap();
        assert_eq!(report.status, JobStatus::Failure);
        assert_eq!(report.error.as_deref(), Some("CUDA out of memory"));
        assert!(report.status.is_terminal());
    }

    #[test]
    fn queue_is_none_outside_queued() {
        let report = StatusReport {
            queue_position: Some(1),
            queue_total: Some(2),
            ..StatusReport::new(JobStatus::Processing)
        };
        assert!(report.queue().is_none());
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(serde_json::from_str::<StatusReport>(r#"{"status":"PAUSED"}"#).is_err());
    }

    #[test]
    fn failure_serializes_without_queue_fields() {
        let json = serde_json::to_value(StatusReport::failure("nope")).unwrap();
        assert_eq!(json, serde_json::json!({"status": "FAILURE", "error": "nope"}));
    }
}
