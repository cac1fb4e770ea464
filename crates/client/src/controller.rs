//! Job lifecycle controller.
//!
//! [`JobController`] tracks at most one job per tool instance. A single
//! driver task owns the session (generation counter, active job id,
//! lifecycle state); every network call runs in its own task and reports
//! back through the driver's mailbox tagged with the generation it was
//! started for. Reports for any generation but the current one are
//! dropped, so a superseded job can never touch visible state.
//!
//! The current state is published on a [`watch`] channel. Transitions are
//! also broadcast as [`JobEvent`]s. Call [`JobController::subscribe`] or
//! [`JobController::events`] to receive them.

use std::sync::Arc;

use imagejob_core::error::JobError;
use imagejob_core::lifecycle::{Lifecycle, LifecycleSnapshot};
use imagejob_core::payload::{Artifact, JobPayload};
use imagejob_core::types::{Generation, JobId, ToolKind};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;

use crate::api::Orchestrator;
use crate::events::JobEvent;
use crate::fetcher::ResultFetcher;
use crate::poller::{PollOutcome, PollProgress, PollerConfig, StatusPoller};
use crate::submit::SubmissionClient;

/// Broadcast channel capacity for lifecycle events.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Errors from the controller handle itself (not from jobs).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControllerError {
    /// The driver task has stopped.
    #[error("Job controller has shut down")]
    Closed,

    /// A newer submission or reset replaced the awaited generation.
    #[error("Generation {0} was superseded")]
    Superseded(Generation),
}

/// Owns the lifecycle session of one tool instance.
///
/// Must be created inside a Tokio runtime. Dropping the controller stops
/// the driver and every task of the current session.
pub struct JobController {
    mailbox: mpsc::UnboundedSender<Message>,
    state_rx: watch::Receiver<LifecycleSnapshot>,
    event_tx: broadcast::Sender<JobEvent>,
    /// Master cancellation token -- cancelled on shutdown.
    cancel: CancellationToken,
}

impl JobController {
    pub fn new(orchestrator: Arc<dyn Orchestrator>, config: PollerConfig) -> Self {
        let (mailbox, inbox) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(LifecycleSnapshot::default());
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();

        let driver = Driver::new(
            orchestrator,
            config,
            mailbox.clone(),
            state_tx,
            event_tx.clone(),
            cancel.clone(),
        );
        tokio::spawn(driver.run(inbox));

        Self {
            mailbox,
            state_rx,
            event_tx,
            cancel,
        }
    }

    /// Start a new job, superseding whatever the session was doing.
    ///
    /// Returns the generation assigned to the submission once the session
    /// has moved to `Submitting`. The outcome arrives on [`subscribe`](Self::subscribe).
    pub async fn submit(&self, payload: JobPayload) -> Result<Generation, ControllerError> {
        let (reply, generation) = oneshot::channel();
        self.mailbox
            .send(Message::Submit { payload, reply })
            .map_err(|_| ControllerError::Closed)?;
        generation.await.map_err(|_| ControllerError::Closed)
    }

    /// Drop the current job and result and return to `Idle` (e.g. the
    /// user picked a new input file).
    pub async fn reset(&self) -> Result<Generation, ControllerError> {
        let (reply, generation) = oneshot::channel();
        self.mailbox
            .send(Message::Reset { reply })
            .map_err(|_| ControllerError::Closed)?;
        generation.await.map_err(|_| ControllerError::Closed)
    }

    /// The lifecycle signal.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleSnapshot> {
        self.state_rx.clone()
    }

    pub fn snapshot(&self) -> LifecycleSnapshot {
        self.state_rx.borrow().clone()
    }

    /// Subscribe to lifecycle transition events.
    pub fn events(&self) -> broadcast::Receiver<JobEvent> {
        self.event_tx.subscribe()
    }

    /// Wait until `generation` reaches a terminal state.
    pub async fn wait_for(&self, generation: Generation) -> Result<Lifecycle, ControllerError> {
        wait_for_terminal(&mut self.subscribe(), generation).await
    }

    /// Stop the driver and cancel every task of the current session.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for JobController {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Wait until `generation` is `Succeeded` or `Failed`.
pub async fn wait_for_terminal(
    state: &mut watch::Receiver<LifecycleSnapshot>,
    generation: Generation,
) -> Result<Lifecycle, ControllerError> {
    follow(state, generation, |_| {}).await
}

/// Like [`wait_for_terminal`], calling `on_change` with every distinct
/// state `generation` passes through (as far as the watch channel shows
/// them).
pub async fn follow<F>(
    state: &mut watch::Receiver<LifecycleSnapshot>,
    generation: Generation,
    mut on_change: F,
) -> Result<Lifecycle, ControllerError>
where
    F: FnMut(&Lifecycle),
{
    let mut last: Option<Lifecycle> = None;

    loop {
        let snapshot = state.borrow_and_update().clone();
        if snapshot.generation > generation {
            return Err(ControllerError::Superseded(generation));
        }
        if snapshot.generation == generation {
            if last.as_ref() != Some(&snapshot.lifecycle) {
                on_change(&snapshot.lifecycle);
                last = Some(snapshot.lifecycle.clone());
            }
            if snapshot.lifecycle.is_terminal() {
                return Ok(snapshot.lifecycle);
            }
        }
        state.changed().await.map_err(|_| ControllerError::Closed)?;
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Mailbox of the driver: commands from the handle and generation-tagged
/// reports from the tasks it spawned.
enum Message {
    Submit {
        payload: JobPayload,
        reply: oneshot::Sender<Generation>,
    },
    Reset {
        reply: oneshot::Sender<Generation>,
    },
    Submitted {
        generation: Generation,
        tool: ToolKind,
        result: Result<JobId, JobError>,
    },
    Progress {
        generation: Generation,
        progress: PollProgress,
    },
    Polled {
        generation: Generation,
        outcome: PollOutcome,
    },
    Fetched {
        generation: Generation,
        result: Result<Artifact, JobError>,
    },
}

/// The current unit of work.
struct Session {
    generation: Generation,
    active_job_id: Option<JobId>,
    lifecycle: Lifecycle,
    /// Child of the master token; covers every task of this generation.
    cancel: CancellationToken,
    fetch_started: bool,
}

struct Driver {
    submitter: SubmissionClient,
    poller: StatusPoller,
    fetcher: ResultFetcher,
    mailbox: mpsc::UnboundedSender<Message>,
    state_tx: watch::Sender<LifecycleSnapshot>,
    event_tx: broadcast::Sender<JobEvent>,
    cancel: CancellationToken,
    session: Session,
}

impl Driver {
    fn new(
        orchestrator: Arc<dyn Orchestrator>,
        config: PollerConfig,
        mailbox: mpsc::UnboundedSender<Message>,
        state_tx: watch::Sender<LifecycleSnapshot>,
        event_tx: broadcast::Sender<JobEvent>,
        cancel: CancellationToken,
    ) -> Self {
        let session = Session {
            generation: 0,
            active_job_id: None,
            lifecycle: Lifecycle::Idle,
            cancel: cancel.child_token(),
            fetch_started: false,
        };

        Self {
            submitter: SubmissionClient::new(Arc::clone(&orchestrator)),
            poller: StatusPoller::new(Arc::clone(&orchestrator), config),
            fetcher: ResultFetcher::new(orchestrator),
            mailbox,
            state_tx,
            event_tx,
            cancel,
            session,
        }
    }

    async fn run(mut self, mut inbox: mpsc::UnboundedReceiver<Message>) {
        tracing::debug!("Job controller started");

        loop {
            let message = tokio::select! {
                _ = self.cancel.cancelled() => break,
                message = inbox.recv() => match message {
                    Some(message) => message,
                    None => break,
                },
            };
            self.handle(message);
        }

        self.session.cancel.cancel();
        tracing::debug!(generation = self.session.generation, "Job controller stopped");
    }

    fn handle(&mut self, message: Message) {
        match message {
            Message::Submit { payload, reply } => {
                let generation = self.begin_submission(payload);
                let _ = reply.send(generation);
            }
            Message::Reset { reply } => {
                let generation = self.begin_generation(Lifecycle::Idle);
                tracing::info!(generation, "Session reset");
                let _ = reply.send(generation);
            }
            Message::Submitted {
                generation,
                tool,
                result,
            } => {
                if self.is_current(generation, "submission") {
                    self.on_submitted(tool, result);
                }
            }
            Message::Progress {
                generation,
                progress,
            } => {
                if self.is_current(generation, "progress") {
                    self.on_progress(progress);
                }
            }
            Message::Polled {
                generation,
                outcome,
            } => {
                if self.is_current(generation, "poll outcome") {
                    self.on_polled(outcome);
                }
            }
            Message::Fetched { generation, result } => {
                if self.is_current(generation, "result") {
                    self.on_fetched(result);
                }
            }
        }
    }

    fn is_current(&self, generation: Generation, report: &'static str) -> bool {
        let current = generation == self.session.generation;
        if !current {
            tracing::warn!(
                generation,
                current = self.session.generation,
                report,
                "Discarding stale report",
            );
        }
        current
    }

    /// Start a new generation in state `next`, cancelling every task of
    /// the previous one and releasing its result.
    fn begin_generation(&mut self, next: Lifecycle) -> Generation {
        let session = Session {
            generation: self.session.generation + 1,
            active_job_id: None,
            lifecycle: next,
            cancel: self.cancel.child_token(),
            fetch_started: false,
        };
        let previous = std::mem::replace(&mut self.session, session);
        previous.cancel.cancel();

        if previous.lifecycle.is_busy() {
            tracing::info!(
                generation = previous.generation,
                job_id = previous.active_job_id.as_ref().map(JobId::as_str).unwrap_or("-"),
                "Session superseded",
            );
            self.emit(JobEvent::Superseded {
                generation: previous.generation,
                job_id: previous.active_job_id,
            });
        }

        self.publish();
        self.session.generation
    }

    fn begin_submission(&mut self, payload: JobPayload) -> Generation {
        let generation = self.begin_generation(Lifecycle::Submitting);
        let tool = payload.tool;
        tracing::info!(generation, tool = %tool, "Submitting job");

        let submitter = self.submitter.clone();
        let mailbox = self.mailbox.clone();
        let cancel = self.session.cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                result = submitter.submit(&payload) => {
                    let _ = mailbox.send(Message::Submitted { generation, tool, result });
                }
            }
        });

        generation
    }

    fn on_submitted(&mut self, tool: ToolKind, result: Result<JobId, JobError>) {
        let job_id = match result {
            Ok(job_id) => job_id,
            Err(e) => return self.fail(e),
        };

        self.session.active_job_id = Some(job_id.clone());
        self.set_lifecycle(Lifecycle::Queued {
            job_id: job_id.clone(),
            queue: None,
        });
        self.emit(JobEvent::Submitted {
            generation: self.session.generation,
            job_id: job_id.clone(),
            tool,
        });
        self.spawn_poller(job_id);
    }

    fn spawn_poller(&self, job_id: JobId) {
        let generation = self.session.generation;
        let poller = self.poller.clone();
        let mailbox = self.mailbox.clone();
        let cancel = self.session.cancel.clone();

        tracing::debug!(
            generation,
            job_id = %job_id,
            interval_ms = poller.config().interval.as_millis() as u64,
            "Starting status poller",
        );

        tokio::spawn(async move {
            let progress_tx = mailbox.clone();
            let outcome = poller
                .run(&job_id, &cancel, |progress| {
                    let _ = progress_tx.send(Message::Progress {
                        generation,
                        progress,
                    });
                })
                .await;
            let _ = mailbox.send(Message::Polled {
                generation,
                outcome,
            });
        });
    }

    fn on_progress(&mut self, progress: PollProgress) {
        let Some(job_id) = self.tracked_job() else {
            return;
        };

        let next = match progress {
            PollProgress::Queued(queue) => Lifecycle::Queued {
                job_id: job_id.clone(),
                queue,
            },
            PollProgress::Processing => Lifecycle::Processing {
                job_id: job_id.clone(),
            },
        };
        if next == self.session.lifecycle {
            return;
        }

        let message = next.progress_message();
        self.set_lifecycle(next);
        self.emit(JobEvent::Progress {
            generation: self.session.generation,
            job_id,
            message,
        });
    }

    fn on_polled(&mut self, outcome: PollOutcome) {
        let Some(job_id) = self.tracked_job() else {
            return;
        };

        match outcome {
            PollOutcome::Succeeded => {
                if self.session.fetch_started {
                    tracing::warn!(job_id = %job_id, "Ignoring repeated success report");
                    return;
                }
                self.session.fetch_started = true;
                tracing::info!(
                    generation = self.session.generation,
                    job_id = %job_id,
                    "Job succeeded, fetching result",
                );
                self.spawn_fetch(job_id);
            }
            PollOutcome::Failed(e) => self.fail(e),
            PollOutcome::Cancelled => {}
        }
    }

    fn spawn_fetch(&self, job_id: JobId) {
        let generation = self.session.generation;
        let fetcher = self.fetcher.clone();
        let mailbox = self.mailbox.clone();
        let cancel = self.session.cancel.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                result = fetcher.fetch(&job_id) => {
                    let _ = mailbox.send(Message::Fetched { generation, result });
                }
            }
        });
    }

    fn on_fetched(&mut self, result: Result<Artifact, JobError>) {
        let Some(job_id) = self.tracked_job() else {
            return;
        };
        if !self.session.fetch_started {
            return;
        }

        match result {
            Ok(artifact) => {
                let bytes = artifact.len();
                self.set_lifecycle(Lifecycle::Succeeded {
                    job_id: job_id.clone(),
                    artifact: Arc::new(artifact),
                });
                tracing::info!(
                    generation = self.session.generation,
                    job_id = %job_id,
                    bytes,
                    "Job completed",
                );
                self.emit(JobEvent::Succeeded {
                    generation: self.session.generation,
                    job_id,
                    bytes,
                });
                self.session.cancel.cancel();
            }
            Err(e) => self.fail(e),
        }
    }

    /// Surface `error` as the terminal state. The detail goes to the log
    /// only; the state carries the sanitized message.
    fn fail(&mut self, error: JobError) {
        let job_id = self.session.active_job_id.clone();
        tracing::warn!(
            generation = self.session.generation,
            job_id = job_id.as_ref().map(JobId::as_str).unwrap_or("-"),
            kind = ?error.kind(),
            error = %error,
            "Job failed",
        );

        self.set_lifecycle(Lifecycle::failed(job_id.clone(), &error));
        self.emit(JobEvent::Failed {
            generation: self.session.generation,
            job_id,
            kind: error.kind(),
        });
        self.session.cancel.cancel();
    }

    /// The job id while the session is queued or processing. Terminal,
    /// idle and submitting sessions accept no job reports.
    fn tracked_job(&self) -> Option<JobId> {
        match &self.session.lifecycle {
            Lifecycle::Queued { job_id, .. } | Lifecycle::Processing { job_id } => {
                Some(job_id.clone())
            }
            _ => None,
        }
    }

    fn set_lifecycle(&mut self, lifecycle: Lifecycle) {
        self.session.lifecycle = lifecycle;
        self.publish();
    }

    fn publish(&self) {
        self.state_tx.send_replace(LifecycleSnapshot {
            generation: self.session.generation,
            lifecycle: self.session.lifecycle.clone(),
        });
    }

    fn emit(&self, event: JobEvent) {
        let _ = self.event_tx.send(event);
    }
}
