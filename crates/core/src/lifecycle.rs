//! The job lifecycle as seen by the UI.
//!
//! `Idle -> Submitting -> Queued <-> Processing -> Succeeded | Failed`.
//! Each state carries only the fields valid in it, so combinations such as
//! "submitting with a result present" cannot be represented.

use std::sync::Arc;

use crate::error::{JobError, JobErrorKind};
use crate::payload::Artifact;
use crate::status::QueuePosition;
use crate::types::{Generation, JobId};

/// Current lifecycle state of the tracked job.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Lifecycle {
    #[default]
    Idle,
    Submitting,
    Queued {
        job_id: JobId,
        queue: Option<QueuePosition>,
    },
    Processing {
        job_id: JobId,
    },
    Succeeded {
        job_id: JobId,
        artifact: Arc<Artifact>,
    },
    Failed {
        /// Present when the failure happened after the job was created.
        job_id: Option<JobId>,
        kind: JobErrorKind,
        /// Sanitized, user-facing text.
        message: &'static str,
    },
}

impl Lifecycle {
    /// Build the failed state for an error, dropping its detail.
    pub fn failed(job_id: Option<JobId>, error: &JobError) -> Self {
        Lifecycle::Failed {
            job_id,
            kind: error.kind(),
            message: error.user_message(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Lifecycle::Succeeded { .. } | Lifecycle::Failed { .. })
    }

    /// True while a job is submitted or being tracked.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            Lifecycle::Submitting | Lifecycle::Queued { .. } | Lifecycle::Processing { .. }
        )
    }

    pub fn job_id(&self) -> Option<&JobId> {
        match self {
            Lifecycle::Idle | Lifecycle::Submitting => None,
            Lifecycle::Queued { job_id, .. }
            | Lifecycle::Processing { job_id }
            | Lifecycle::Succeeded { job_id, .. } => Some(job_id),
            Lifecycle::Failed { job_id, .. } => job_id.as_ref(),
        }
    }

    /// Short state name for logs and events.
    pub fn name(&self) -> &'static str {
        match self {
            Lifecycle::Idle => "idle",
            Lifecycle::Submitting => "submitting",
            Lifecycle::Queued { .. } => "queued",
            Lifecycle::Processing { .. } => "processing",
            Lifecycle::Succeeded { .. } => "succeeded",
            Lifecycle::Failed { .. } => "failed",
        }
    }

    /// Human-readable progress text for the current state.
    pub fn progress_message(&self) -> String {
        match self {
            Lifecycle::Idle => "Ready".to_string(),
            Lifecycle::Submitting => "Uploading your image...".to_string(),
            Lifecycle::Queued {
                queue: Some(q), ..
            } => format!("Waiting in queue ({} of {})", q.position, q.total),
            Lifecycle::Queued { queue: None, .. } => "Waiting in queue...".to_string(),
            Lifecycle::Processing { .. } => "Processing your image...".to_string(),
            Lifecycle::Succeeded { .. } => "Done".to_string(),
            Lifecycle::Failed { message, .. } => (*message).to_string(),
        }
    }
}

/// Lifecycle state tagged with the generation that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LifecycleSnapshot {
    pub generation: Generation,
    pub lifecycle: Lifecycle,
}
