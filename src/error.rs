// src/error.rs
//! Application error types with structured error handling.
//!
//! Each variant names the stage that failed: local validation, the wire
//! protocol, the server-side job, or the local machine. Nothing here is
//! retried; the only loop in the client is the running-job poll.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// The server answered, but not in a way the job protocol allows.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    #[error("Http response is not OK. Response status code is {status} ({endpoint})")]
    UnexpectedStatus { status: u16, endpoint: String },

    #[error("Response carries no job id")]
    MissingJobId,

    #[error("Unexpected response shape: {0}")]
    UnexpectedShape(String),

    #[error("Response is missing the {0} header")]
    MissingHeader(&'static str),

    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl ProtocolError {
    /// HTTP status code, when the failure was a non-200 answer.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] crate::types::ValidationError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("Request failed. \"{label}\" was returned.")]
    JobFailed { label: String },

    #[error("Submission failed. {message}")]
    InvalidSubmission { message: String },

    #[error("Request failed. No plasmid in PLSDB with the following ID(s): {}", accessions.join(", "))]
    AccessionsNotFound { accessions: Vec<String> },

    #[error("Job still running after {attempts} status queries")]
    PollExhausted { attempts: u32 },

    #[error("Job still running after {elapsed:?}")]
    DeadlineExceeded { elapsed: Duration },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Network failure: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Filesystem IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Refusing to overwrite existing file {}", path.display())]
    OutputExists { path: PathBuf },
}

impl AppError {
    /// Whether the server reported a terminal failure for a submitted job.
    pub fn is_job_failure(&self) -> bool {
        matches!(
            self,
            Self::JobFailed { .. } | Self::InvalidSubmission { .. } | Self::AccessionsNotFound { .. }
        )
    }

    /// Whether the error was raised before any network call.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Protocol(ProtocolError::Malformed(err.to_string()))
    }
}

/// Result type alias for convenience
pub type Result<T, E = AppError> = std::result::Result<T, E>;
