//! Handlers for the `/jobs` resource.

use axum::extract::{Path, State};
use axum::Json;
use imagejob_core::error::GENERIC_FAILURE_MESSAGE;
use imagejob_core::status::{JobStatus, StatusReport};
use imagejob_core::types::JobId;

use crate::state::AppState;

/// GET /api/v1/jobs/{id}/status
///
/// Always answers 200. Upstream success is passed through; any upstream
/// failure (transport, non-2xx, undecodable body, no answer within
/// [`RelayConfig::upstream_timeout`](crate::config::RelayConfig::upstream_timeout)) becomes
/// `{"status": "FAILURE", "error": <generic message>}`. Backend error text
/// in a reported `FAILURE` is replaced the same way; the original is
/// logged.
pub async fn relay_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<StatusReport> {
    let job_id = JobId::new(id);

    let budget = state.config.upstream_timeout();
    let lookup = match tokio::time::timeout(budget, state.orchestrator.status(&job_id)).await {
        Ok(lookup) => lookup,
        Err(_) => {
            tracing::error!(
                job_id = %job_id,
                timeout_ms = budget.as_millis() as u64,
                "Upstream status lookup timed out",
            );
            return Json(StatusReport::failure(GENERIC_FAILURE_MESSAGE));
        }
    };

    match lookup {
        Ok(report) if report.status == JobStatus::Failure => {
            tracing::warn!(
                job_id = %job_id,
                error = report.error.as_deref().unwrap_or("-"),
                "Orchestrator reported job failure",
            );
            Json(StatusReport::failure(GENERIC_FAILURE_MESSAGE))
        }
        Ok(report) => Json(report),
        Err(e) => {
            tracing::error!(job_id = %job_id, error = %e, "Upstream status lookup failed");
            Json(StatusReport::failure(GENERIC_FAILURE_MESSAGE))
        }
    }
}
