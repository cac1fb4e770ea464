//! Fixed-interval status polling.
//!
//! [`StatusPoller::run`] queries a job's status every `interval` until the
//! orchestrator reports a terminal state, a status request fails, or the
//! [`CancellationToken`] fires. A new request is only issued after the
//! previous one settles, so responses for one job arrive in order.

use std::sync::Arc;
use std::time::Duration;

use imagejob_core::error::JobError;
use imagejob_core::status::{JobStatus, QueuePosition, StatusReport};
use imagejob_core::types::JobId;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::api::Orchestrator;
use crate::retry::RetryConfig;

/// Poller settings.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Time between status requests. Fixed, no backoff.
    pub interval: Duration,
    /// Retry policy for failed status requests (off by default).
    pub retry: RetryConfig,
}

impl PollerConfig {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(3000);

    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            ..Self::default()
        }
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Self::DEFAULT_INTERVAL,
            retry: RetryConfig::default(),
        }
    }
}

/// Non-terminal progress observed while polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollProgress {
    Queued(Option<QueuePosition>),
    Processing,
}

/// How a polling run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The orchestrator reported `SUCCESS`; the result can be fetched.
    Succeeded,
    /// The job failed, or its status could not be read.
    Failed(JobError),
    /// The token fired before a terminal state was reached.
    Cancelled,
}

/// Polls one orchestrator for job status.
#[derive(Clone)]
pub struct StatusPoller {
    orchestrator: Arc<dyn Orchestrator>,
    config: PollerConfig,
}

impl StatusPoller {
    pub fn new(orchestrator: Arc<dyn Orchestrator>, config: PollerConfig) -> Self {
        Self {
            orchestrator,
            config,
        }
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    /// Poll `job_id` until it reaches a terminal state or `cancel` fires.
    ///
    /// `on_progress` is called for every non-terminal status that differs
    /// from the previous one. The first request is sent one interval after
    /// the call. Cancelling drops any in-flight request.
    pub async fn run<F>(
        &self,
        job_id: &JobId,
        cancel: &CancellationToken,
        mut on_progress: F,
    ) -> PollOutcome
    where
        F: FnMut(PollProgress),
    {
        let mut ticker =
            tokio::time::interval_at(Instant::now() + self.config.interval, self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last: Option<PollProgress> = None;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return PollOutcome::Cancelled,
                _ = ticker.tick() => {}
            }

            let result = tokio::select! {
                _ = cancel.cancelled() => return PollOutcome::Cancelled,
                result = self.check_status(job_id) => result,
            };

            let report = match result {
                Ok(report) => report,
                Err(e) => return PollOutcome::Failed(e),
            };

            tracing::debug!(job_id = %job_id, status = report.status.as_str(), "Status polled");

            let progress = match report.status {
                JobStatus::Queued => PollProgress::Queued(report.queue()),
                JobStatus::Processing => PollProgress::Processing,
                JobStatus::Success => return PollOutcome::Succeeded,
                JobStatus::Failure => {
                    let detail = report
                        .error
                        .unwrap_or_else(|| "no error message provided".to_string());
                    return PollOutcome::Failed(JobError::JobReportedFailure(detail));
                }
            };

            if last != Some(progress) {
                on_progress(progress);
                last = Some(progress);
            }
        }
    }

    /// One status request, retried per [`RetryConfig`] on failure.
    async fn check_status(&self, job_id: &JobId) -> Result<StatusReport, JobError> {
        let mut delays = self.config.retry.delays();
        let mut attempt = 0u32;

        loop {
            let error = match self.orchestrator.status(job_id).await {
                Ok(report) => return Ok(report),
                Err(e) => e,
            };
            let Some(delay) = delays.next() else {
                return Err(JobError::PollingTransport(error.to_string()));
            };

            attempt += 1;
            tracing::warn!(
                job_id = %job_id,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Status request failed, retrying",
            );
            tokio::time::sleep(delay).await;
        }
    }
}
