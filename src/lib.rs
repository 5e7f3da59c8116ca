// src/lib.rs
//! plsdb-client library: a client for the PLSDB plasmid database API.
//!
//! # Public API
//!
//! The library exposes types organized by concern:
//! - **Client facade** — `PlsdbClient` (summary, FASTA download, search, filters)
//! - **Error handling** — `AppError`, `ProtocolError`, `ValidationError`
//! - **Configuration** — `ClientConfig`, `PollPolicy`, `LoggingConfig`
//! - **Domain types** — `Accession`, `JobId`, `SearchRequest`, `FilterQuery`
//! - **Result model** — `ResultRecord`, `ResultTable`, `TableReport`
//! - **API access** — `PlsdbRepository`, `PlsdbHttpClient`, parsers
//! - **Job protocol** — `poll_until_terminal`, `JobStatus`, `Pause`

pub mod api;
pub mod config;
pub mod constants;
pub mod error;
pub mod jobs;
pub mod logging;
pub mod lookup;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod types;

// --- Client Facade ---
pub use crate::pipeline::PlsdbClient;

// --- Error Handling ---
pub use crate::error::{AppError, ProtocolError};
pub use crate::types::ValidationError;

// --- Configuration ---
pub use crate::config::{ClientConfig, CommandLineInput};
pub use crate::jobs::PollPolicy;
pub use crate::logging::{init_logging, LoggingConfig};

// --- Domain Types ---
pub use crate::types::{
    Accession, FilterKind, FilterQuery, JobId, NumericRange, SearchInput, SearchParameters,
    SearchRequest, SearchType,
};

// --- Result Model ---
pub use crate::model::{FastaDownload, PartialFailure, ResultRecord, ResultTable, TableReport};

// --- API Access ---
pub use crate::api::{
    parser::{decode_filter_table, decode_job_reply, decode_lookup, decode_split_table},
    FastaReply, JobReply, LookupResponse, LookupSchema, PlsdbHttpClient, PlsdbRepository,
    SearchUpload, ServerLabel,
};

// --- Job Protocol ---
pub use crate::jobs::{
    poll_until_terminal, FailureReason, JobHandle, JobKind, JobStatus, Pause, TokioPause,
};

// --- Lookup ---
pub use crate::lookup::{IdentifierQueryResult, Partition};

// --- Output ---
pub use crate::output::{write_table_tsv, DownloadProgress, LogProgress};
