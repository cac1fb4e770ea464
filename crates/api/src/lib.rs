//! Status relay service.
//!
//! Forwards client status lookups to the job orchestrator and normalizes
//! every upstream failure into a `FAILURE` body with a generic message, so
//! outages never leak implementation details to the browser. Exposes the
//! building blocks (config, state, routes) so integration tests and the
//! binary entrypoint share them.

pub mod config;
pub mod handlers;
pub mod router;
pub mod routes;
pub mod state;
