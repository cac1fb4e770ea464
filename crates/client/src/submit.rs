use std::sync::Arc;

use imagejob_core::error::JobError;
use imagejob_core::payload::JobPayload;
use imagejob_core::types::JobId;

use crate::api::Orchestrator;

/// Packages user input and creates a job on the orchestrator.
///
/// Never retries: a failed submission needs a new user-initiated one.
#[derive(Clone)]
pub struct SubmissionClient {
    orchestrator: Arc<dyn Orchestrator>,
}

impl SubmissionClient {
    pub fn new(orchestrator: Arc<dyn Orchestrator>) -> Self {
        Self { orchestrator }
    }

    /// Submit `payload` and return the new job's id.
    ///
    /// Only the presence of file data is checked here; size and format
    /// limits are enforced by the orchestrator.
    pub async fn submit(&self, payload: &JobPayload) -> Result<JobId, JobError> {
        if payload.is_empty() {
            return Err(JobError::Submission("payload has no file data".into()));
        }

        let job_id = self
            .orchestrator
            .submit(payload)
            .await
            .map_err(|e| JobError::Submission(e.to_string()))?;

        if job_id.as_str().is_empty() {
            return Err(JobError::Submission(
                "orchestrator returned an empty job id".into(),
            ));
        }

        tracing::info!(
            tool = %payload.tool,
            job_id = %job_id,
            bytes = payload.data.len(),
            "Job submitted",
        );
        Ok(job_id)
    }
}
