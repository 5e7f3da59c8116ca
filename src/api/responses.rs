// src/api/responses.rs
//! Wire shapes of PLSDB responses and the tagged unions they decode into.
//!
//! Raw serde structs mirror the JSON exactly; the parser turns them into the
//! explicit variants below so that call sites match on a type instead of
//! probing for fields.

use crate::error::AppError;
use crate::model::ResultRecord;
use crate::types::JobId;
use futures::stream::BoxStream;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// JSON body shared by every submit and status answer of the job endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawJobReply {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub job_id: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub results: Option<Value>,
    #[serde(default)]
    pub notfound: Option<Vec<String>>,
}

/// Status label reported by the job endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerLabel {
    Running,
    Finished,
    Failed,
    Error,
    NoJobId,
    InvalidPost,
    Other(String),
}

impl ServerLabel {
    pub fn parse(label: &str) -> Self {
        match label {
            "running" => Self::Running,
            "finished" => Self::Finished,
            "failed" => Self::Failed,
            "error" => Self::Error,
            "no job id" | "no-job-id" => Self::NoJobId,
            "invalid post" => Self::InvalidPost,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Running => "running",
            Self::Finished => "finished",
            Self::Failed => "failed",
            Self::Error => "error",
            Self::NoJobId => "no job id",
            Self::InvalidPost => "invalid post",
            Self::Other(label) => label,
        }
    }

    /// Labels after which the job is never queried again.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running | Self::Other(_))
    }
}

impl fmt::Display for ServerLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded job endpoint answer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobReply {
    pub label: Option<ServerLabel>,
    pub job_id: Option<JobId>,
    /// Detail message accompanying `invalid post`.
    pub error: Option<String>,
    /// Serialized result table accompanying `finished`.
    pub results: Option<Value>,
    /// Accessions the bulk download could not resolve.
    pub notfound: Option<Vec<String>>,
}

/// Answer of the bulk download status endpoint.
pub enum FastaReply {
    /// JSON status: the file is not ready, or the job failed.
    Structured(Value),
    /// The FASTA file itself.
    Delivery(FastaDelivery),
}

/// Byte stream of a finished bulk download.
pub type ByteStream = BoxStream<'static, Result<Vec<u8>, AppError>>;

pub struct FastaDelivery {
    /// Raw `content-disposition` header, if the server sent one.
    pub content_disposition: Option<String>,
    pub body: ByteStream,
}

impl fmt::Debug for FastaDelivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FastaDelivery")
            .field("content_disposition", &self.content_disposition)
            .finish_non_exhaustive()
    }
}

/// Generation of the accession lookup response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupSchema {
    /// Record carries a nested `Metadata_annotations` object; ambiguity is
    /// flagged by a top-level `searched` field.
    Current,
    /// Record inlined at top level under `NUCCORE_ACC`; ambiguity is flagged
    /// by a `multiple_matches` list.
    Legacy,
}

/// A decoded accession lookup answer.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupResponse {
    /// Exactly one plasmid matches the accession.
    Unique {
        schema: LookupSchema,
        record: ResultRecord,
    },
    /// Several plasmids match; none is picked.
    Ambiguous {
        schema: LookupSchema,
        candidates: Vec<String>,
        record: ResultRecord,
    },
    /// Neither a record nor a multi-match marker.
    Unrecognized { fields: Vec<String> },
}
