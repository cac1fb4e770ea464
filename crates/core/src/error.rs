use serde::Serialize;

/// The only failure text ever shown to end users.
pub const GENERIC_FAILURE_MESSAGE: &str =
    "Something went wrong while processing your image. Please try again.";

/// Why a job ended in failure.
///
/// Each variant carries operator-only detail (upstream error text, status
/// codes, transport errors). The detail is for logs; the UI boundary only
/// ever sees [`JobError::user_message`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JobError {
    /// The job could not be created; the user must resubmit.
    #[error("Submission failed: {0}")]
    Submission(String),

    /// A status check failed at the transport level.
    #[error("Status polling failed: {0}")]
    PollingTransport(String),

    /// The orchestrator explicitly reported `FAILURE`.
    #[error("Job reported failure: {0}")]
    JobReportedFailure(String),

    /// Status said success but the artifact could not be retrieved.
    #[error("Result fetch failed: {0}")]
    ResultFetch(String),
}

impl JobError {
    pub fn kind(&self) -> JobErrorKind {
        match self {
            JobError::Submission(_) => JobErrorKind::Submission,
            JobError::PollingTransport(_) => JobErrorKind::PollingTransport,
            JobError::JobReportedFailure(_) => JobErrorKind::JobReportedFailure,
            JobError::ResultFetch(_) => JobErrorKind::ResultFetch,
        }
    }

    /// Sanitized message, identical for every kind.
    pub fn user_message(&self) -> &'static str {
        GENERIC_FAILURE_MESSAGE
    }
}

/// Fieldless mirror of [`JobError`] that is safe to expose to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobErrorKind {
    Submission,
    PollingTransport,
    JobReportedFailure,
    ResultFetch,
}
