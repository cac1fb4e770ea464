use std::sync::Arc;

use imagejob_client::api::Orchestrator;

use crate::config::RelayConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Upstream job orchestrator.
    pub orchestrator: Arc<dyn Orchestrator>,
    /// Relay configuration.
    pub config: Arc<RelayConfig>,
}
