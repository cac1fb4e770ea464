use std::sync::Arc;

use imagejob_core::error::JobError;
use imagejob_core::payload::Artifact;
use imagejob_core::types::JobId;

use crate::api::Orchestrator;

/// Retrieves the artifact of a job whose status reported success.
///
/// Called once per successful job by the controller; failures are not
/// retried.
#[derive(Clone)]
pub struct ResultFetcher {
    orchestrator: Arc<dyn Orchestrator>,
}

impl ResultFetcher {
    pub fn new(orchestrator: Arc<dyn Orchestrator>) -> Self {
        Self { orchestrator }
    }

    pub async fn fetch(&self, job_id: &JobId) -> Result<Artifact, JobError> {
        let artifact = self
            .orchestrator
            .result(job_id)
            .await
            .map_err(|e| JobError::ResultFetch(e.to_string()))?;

        tracing::info!(
            job_id = %job_id,
            bytes = artifact.len(),
            content_type = artifact.content_type.as_deref().unwrap_or("unknown"),
            "Result fetched",
        );
        Ok(artifact)
    }
}
