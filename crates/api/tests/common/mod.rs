#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use imagejob_client::api::{Orchestrator, OrchestratorError};
use imagejob_core::payload::{Artifact, JobPayload};
use imagejob_core::status::StatusReport;
use imagejob_core::types::JobId;
use tower::ServiceExt;

use imagejob_api::config::RelayConfig;
use imagejob_api::router::build_app_router;
use imagejob_api::state::AppState;

/// Status lookups answered from a fixed table. Unknown jobs get an
/// upstream 500 carrying internal detail; hanging jobs never answer.
#[derive(Default)]
pub struct FakeOrchestrator {
    reports: Mutex<HashMap<JobId, StatusReport>>,
    hanging: Mutex<HashSet<JobId>>,
}

impl FakeOrchestrator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_report(self: Arc<Self>, job: &str, report: StatusReport) -> Arc<Self> {
        self.reports.lock().unwrap().insert(JobId::from(job), report);
        self
    }

    pub fn with_hang(self: Arc<Self>, job: &str) -> Arc<Self> {
        self.hanging.lock().unwrap().insert(JobId::from(job));
        self
    }
}

#[async_trait]
impl Orchestrator for FakeOrchestrator {
    async fn submit(&self, _payload: &JobPayload) -> Result<JobId, OrchestratorError> {
        unreachable!("the relay never submits")
    }

    async fn status(&self, job_id: &JobId) -> Result<StatusReport, OrchestratorError> {
        if self.hanging.lock().unwrap().contains(job_id) {
            return std::future::pending().await;
        }
        self.reports
            .lock()
            .unwrap()
            .get(job_id)
            .cloned()
            .ok_or_else(|| OrchestratorError::Api {
                status: 500,
                body: "connection to redis://10.0.0.3 refused".into(),
            })
    }

    async fn result(&self, _job_id: &JobId) -> Result<Artifact, OrchestratorError> {
        unreachable!("the relay never fetches results")
    }
}

/// Build a test `RelayConfig` with safe defaults.
pub fn test_config() -> RelayConfig {
    RelayConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        orchestrator_url: "http://orchestrator.invalid".to_string(),
    }
}

/// Build the relay router backed by `orchestrator`, with the production
/// middleware stack.
pub fn build_test_app(orchestrator: Arc<dyn Orchestrator>) -> Router {
    build_test_app_with(orchestrator, test_config())
}

pub fn build_test_app_with(orchestrator: Arc<dyn Orchestrator>, config: RelayConfig) -> Router {
    let state = AppState {
        orchestrator,
        config: Arc::new(config.clone()),
    };
    build_app_router(state, &config)
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
