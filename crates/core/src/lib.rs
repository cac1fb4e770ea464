//! Domain types shared by the image-job client, relay and CLI.
//!
//! Nothing in this crate performs I/O. It defines the job identifiers,
//! the orchestrator's status wire shape, submission payloads, result
//! artifacts, the lifecycle state machine and the error taxonomy with its
//! sanitized user-facing message.

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod payload;
pub mod status;
pub mod types;
