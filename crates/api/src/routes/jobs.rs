//! Route definitions for the `/jobs` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::jobs;
use crate::state::AppState;

/// Routes mounted at `/jobs`.
///
/// ```text
/// GET    /{id}/status     -> relay_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}/status", get(jobs::relay_status))
}
