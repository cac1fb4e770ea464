//! Lifecycle events emitted by the job controller.
//!
//! The watch channel carries the current state; these events are a log of
//! the transitions that led there, for observers that care about history
//! (progress bars, audit logs, tests).

use imagejob_core::error::JobErrorKind;
use imagejob_core::types::{Generation, JobId, ToolKind};
use serde::Serialize;

/// A lifecycle transition for one generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobEvent {
    /// The orchestrator accepted the submission.
    Submitted {
        generation: Generation,
        job_id: JobId,
        tool: ToolKind,
    },

    /// Non-terminal progress changed.
    Progress {
        generation: Generation,
        job_id: JobId,
        /// Human-readable progress text.
        message: String,
    },

    /// The artifact was fetched; the job is done.
    Succeeded {
        generation: Generation,
        job_id: JobId,
        bytes: usize,
    },

    /// The job ended in failure. Carries only the kind, never detail text.
    Failed {
        generation: Generation,
        job_id: Option<JobId>,
        kind: JobErrorKind,
    },

    /// A busy session was replaced by a newer one before finishing.
    Superseded {
        generation: Generation,
        job_id: Option<JobId>,
    },
}

impl JobEvent {
    pub fn generation(&self) -> Generation {
        match self {
            JobEvent::Submitted { generation, .. }
            | JobEvent::Progress { generation, .. }
            | JobEvent::Succeeded { generation, .. }
            | JobEvent::Failed { generation, .. }
            | JobEvent::Superseded { generation, .. } => *generation,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobEvent::Succeeded { .. } | JobEvent::Failed { .. })
    }
}
