//! Scripted in-memory orchestrator shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use imagejob_client::api::{Orchestrator, OrchestratorError};
use imagejob_core::payload::{Artifact, JobPayload};
use imagejob_core::status::{JobStatus, StatusReport};
use imagejob_core::types::{JobId, ToolKind};

/// One scripted status response.
#[derive(Debug, Clone)]
pub enum Step {
    Report(StatusReport),
    /// Respond with this HTTP error status.
    Error(u16),
    /// Never respond.
    Hang,
}

pub fn queued(position: u32, total: u32) -> Step {
    Step::Report(StatusReport::queued(position, total))
}

pub fn processing() -> Step {
    Step::Report(StatusReport::new(JobStatus::Processing))
}

pub fn success() -> Step {
    Step::Report(StatusReport::new(JobStatus::Success))
}

pub fn failure(error: &str) -> Step {
    Step::Report(StatusReport::failure(error))
}

/// Orchestrator driven by per-job scripts. Once a job's status script is
/// exhausted it keeps reporting `PROCESSING`.
#[derive(Default)]
pub struct ScriptedOrchestrator {
    submits: Mutex<VecDeque<Result<JobId, u16>>>,
    statuses: Mutex<HashMap<JobId, VecDeque<Step>>>,
    results: Mutex<HashMap<JobId, Result<Bytes, u16>>>,
    status_calls: Mutex<HashMap<JobId, usize>>,
    result_calls: Mutex<HashMap<JobId, usize>>,
}

impl ScriptedOrchestrator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue the outcome of the next submission.
    pub fn on_submit(&self, outcome: Result<&str, u16>) -> &Self {
        self.submits
            .lock()
            .unwrap()
            .push_back(outcome.map(JobId::from));
        self
    }

    pub fn on_status(&self, job: &str, steps: Vec<Step>) -> &Self {
        self.statuses
            .lock()
            .unwrap()
            .insert(JobId::from(job), steps.into());
        self
    }

    pub fn on_result(&self, job: &str, outcome: Result<&'static [u8], u16>) -> &Self {
        self.results
            .lock()
            .unwrap()
            .insert(JobId::from(job), outcome.map(Bytes::from_static));
        self
    }

    pub fn status_calls(&self, job: &str) -> usize {
        self.status_calls
            .lock()
            .unwrap()
            .get(&JobId::from(job))
            .copied()
            .unwrap_or(0)
    }

    pub fn result_calls(&self, job: &str) -> usize {
        self.result_calls
            .lock()
            .unwrap()
            .get(&JobId::from(job))
            .copied()
            .unwrap_or(0)
    }
}

fn api_error(status: u16) -> OrchestratorError {
    OrchestratorError::Api {
        status,
        body: format!("internal detail {status} at gpu-worker-7"),
    }
}

#[async_trait]
impl Orchestrator for ScriptedOrchestrator {
    async fn submit(&self, _payload: &JobPayload) -> Result<JobId, OrchestratorError> {
        let next = self.submits.lock().unwrap().pop_front();
        match next {
            Some(Ok(id)) => Ok(id),
            Some(Err(status)) => Err(api_error(status)),
            None => panic!("unexpected submission"),
        }
    }

    async fn status(&self, job_id: &JobId) -> Result<StatusReport, OrchestratorError> {
        *self
            .status_calls
            .lock()
            .unwrap()
            .entry(job_id.clone())
            .or_default() += 1;

        let step = self
            .statuses
            .lock()
            .unwrap()
            .get_mut(job_id)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(processing);

        match step {
            Step::Report(report) => Ok(report),
            Step::Error(status) => Err(api_error(status)),
            Step::Hang => std::future::pending().await,
        }
    }

    async fn result(&self, job_id: &JobId) -> Result<Artifact, OrchestratorError> {
        *self
            .result_calls
            .lock()
            .unwrap()
            .entry(job_id.clone())
            .or_default() += 1;

        let outcome = self.results.lock().unwrap().get(job_id).cloned();
        match outcome {
            Some(Ok(data)) => Ok(Artifact {
                job_id: job_id.clone(),
                content_type: Some("image/png".into()),
                data,
            }),
            Some(Err(status)) => Err(api_error(status)),
            None => Err(api_error(404)),
        }
    }
}

pub fn payload() -> JobPayload {
    JobPayload::new(
        ToolKind::SuperResolution,
        "photo.png",
        "image/png",
        vec![0x89, b'P', b'N', b'G'],
    )
    .with_param("scale", "4")
}
