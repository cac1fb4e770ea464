//! REST client for the job orchestrator.
//!
//! [`Orchestrator`] is the seam the rest of the crate talks to;
//! [`HttpOrchestrator`] implements it over HTTP using [`reqwest`].

use std::time::Duration;

use async_trait::async_trait;
use imagejob_core::payload::{Artifact, JobPayload};
use imagejob_core::status::StatusReport;
use imagejob_core::types::JobId;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

/// Contract of the job orchestrator: submit, status lookup, result retrieval.
#[async_trait]
pub trait Orchestrator: Send + Sync {
    /// Create a job and return its identifier.
    async fn submit(&self, payload: &JobPayload) -> Result<JobId, OrchestratorError>;

    /// Look up the current status of a job.
    async fn status(&self, job_id: &JobId) -> Result<StatusReport, OrchestratorError>;

    /// Retrieve the artifact of a finished job.
    async fn result(&self, job_id: &JobId) -> Result<Artifact, OrchestratorError>;
}

/// Errors from the orchestrator REST layer.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    /// The HTTP request itself failed (network, DNS, TLS, decoding, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The orchestrator returned a non-2xx status code.
    #[error("Orchestrator API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

/// Response returned by the submit endpoint.
#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    /// Orchestrator-assigned job identifier.
    pub id: JobId,
}

/// HTTP client for a single orchestrator.
#[derive(Debug, Clone)]
pub struct HttpOrchestrator {
    client: reqwest::Client,
    base_url: String,
}

impl HttpOrchestrator {
    /// Create a new client for an orchestrator.
    ///
    /// * `base_url` - Base HTTP URL, e.g. `http://host:8000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// Create a client whose requests give up after `timeout`.
    ///
    /// Without a timeout requests run until the platform gives up.
    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, OrchestratorError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self::with_client(builder.build()?, base_url))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or an [`OrchestratorError::Api`]
    /// containing the status and body text on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, OrchestratorError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(OrchestratorError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, OrchestratorError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    fn build_form(payload: &JobPayload) -> Result<Form, OrchestratorError> {
        let file = Part::bytes(payload.data.to_vec())
            .file_name(payload.file_name.clone())
            .mime_str(&payload.content_type)?;

        let form = payload
            .params
            .iter()
            .fold(Form::new().part("file", file), |form, (key, value)| {
                form.text(key.clone(), value.clone())
            });
        Ok(form)
    }
}

#[async_trait]
impl Orchestrator for HttpOrchestrator {
    /// `POST /jobs/{tool}` with a multipart body: the `file` part plus one
    /// text part per tool parameter.
    async fn submit(&self, payload: &JobPayload) -> Result<JobId, OrchestratorError> {
        let form = Self::build_form(payload)?;

        let response = self
            .client
            .post(format!("{}/jobs/{}", self.base_url, payload.tool.slug()))
            .multipart(form)
            .send()
            .await?;

        let body: SubmitResponse = Self::parse_response(response).await?;
        Ok(body.id)
    }

    /// `GET /jobs/{id}/status`.
    async fn status(&self, job_id: &JobId) -> Result<StatusReport, OrchestratorError> {
        let response = self
            .client
            .get(format!("{}/jobs/{}/status", self.base_url, job_id))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// `GET /jobs/{id}/result`. The body is the raw artifact.
    async fn result(&self, job_id: &JobId) -> Result<Artifact, OrchestratorError> {
        let response = self
            .client
            .get(format!("{}/jobs/{}/result", self.base_url, job_id))
            .send()
            .await?;

        let response = Self::ensure_success(response).await?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let data = response.bytes().await?;

        Ok(Artifact {
            job_id: job_id.clone(),
            content_type,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed() {
        let api = HttpOrchestrator::new("http://localhost:8000/");
        assert_eq!(api.base_url(), "http://localhost:8000");
    }

    #[test]
    fn api_error_display() {
        let err = OrchestratorError::Api {
            status: 503,
            body: "upstream overloaded".into(),
        };
        assert_eq!(
            err.to_string(),
            "Orchestrator API error (503): upstream overloaded"
        );
    }

    #[test]
    fn invalid_mime_type_is_rejected() {
        let payload = JobPayload::new(
            imagejob_core::types::ToolKind::Sketch,
            "a.png",
            "not a mime type",
            vec![1, 2, 3],
        );
        assert!(HttpOrchestrator::build_form(&payload).is_err());
    }

    #[test]
    fn with_timeout_builds() {
        let api = HttpOrchestrator::with_timeout("http://h", Some(Duration::from_secs(5))).unwrap();
        assert_eq!(api.base_url(), "http://h");
    }
}
