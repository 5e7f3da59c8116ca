// src/jobs/mod.rs
//! The asynchronous job protocol shared by bulk FASTA download and
//! similarity search.
//!
//! ```text
//! SUBMITTED → RUNNING ─┬→ FINISHED
//!                      ├→ FAILED
//!                      └→ INVALID
//! ```
//!
//! A job is started by the submitter (`submit`), observed by the poller
//! (`poller`) until it reaches a terminal state, and interpreted by the two
//! job kinds (`search`, `fasta`).

pub mod fasta;
pub mod poller;
pub mod search;
pub mod submit;

use crate::api::PlsdbRepository;
use crate::constants::POLL_INTERVAL;
use crate::error::AppError;
use crate::types::JobId;
use std::fmt;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub use poller::poll_until_terminal;

/// What a server-side job produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    FastaDownload,
    SequenceSearch,
}

impl JobKind {
    /// Progress line logged for every poll that finds the job still running.
    pub fn running_message(&self) -> &'static str {
        match self {
            Self::FastaDownload => "preparing fasta file",
            Self::SequenceSearch => "search job is running",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FastaDownload => f.write_str("fasta download"),
            Self::SequenceSearch => f.write_str("sequence search"),
        }
    }
}

/// The one active handle of an outstanding job. Consumed by the poller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    id: JobId,
    kind: JobKind,
}

impl JobHandle {
    pub fn new(id: JobId, kind: JobKind) -> Self {
        Self { id, kind }
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn kind(&self) -> JobKind {
        self.kind
    }
}

/// Why the server gave up on a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// A terminal label such as `failed`, `error` or `no job id`.
    Label(String),
    /// The bulk download named accessions it does not know.
    NotFound(Vec<String>),
}

impl From<FailureReason> for AppError {
    fn from(reason: FailureReason) -> Self {
        match reason {
            FailureReason::Label(label) => AppError::JobFailed { label },
            FailureReason::NotFound(accessions) => AppError::AccessionsNotFound { accessions },
        }
    }
}

/// State of a job as seen by one status query.
#[derive(Debug, PartialEq)]
pub enum JobStatus<T> {
    Running,
    Finished(T),
    Failed(FailureReason),
    InvalidSubmission(String),
}

/// How long and how often a running job is queried.
///
/// The default queries every five seconds with neither an attempt cap nor a
/// deadline, which only ends on a terminal state, an error, or cancellation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// Maximum number of status queries.
    pub max_attempts: Option<u32>,
    /// Maximum total time spent waiting on the job.
    pub deadline: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: POLL_INTERVAL,
            max_attempts: None,
            deadline: None,
        }
    }
}

impl PollPolicy {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// The wait between two status queries.
#[async_trait::async_trait]
pub trait Pause: Send + Sync {
    async fn pause(&self, duration: Duration);
}

/// Waits on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPause;

#[async_trait::async_trait]
impl Pause for TokioPause {
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Everything a job needs besides its own input.
#[derive(Clone, Copy)]
pub struct JobContext<'a> {
    pub repository: &'a dyn PlsdbRepository,
    pub pause: &'a dyn Pause,
    pub policy: &'a PollPolicy,
    pub cancel: &'a CancellationToken,
}

impl JobContext<'_> {
    /// Fails with [`AppError::Cancelled`] once the token has been cancelled,
    /// so no new job is submitted after an interrupt.
    pub fn ensure_active(&self) -> Result<(), AppError> {
        if self.cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }
        Ok(())
    }
}
