//! Client for asynchronous image-inference jobs.
//!
//! Submits a job to the orchestrator, polls its status at a fixed interval
//! until it reaches a terminal state, fetches the produced artifact, and
//! exposes the whole thing as a single lifecycle signal through
//! [`controller::JobController`].

pub mod api;
pub mod config;
pub mod controller;
pub mod events;
pub mod fetcher;
pub mod poller;
pub mod retry;
pub mod submit;
