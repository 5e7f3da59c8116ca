// src/constants.rs
//! Domain constants that define the operational boundaries of the client.
//!
//! Each constant is named for the protocol concept it constrains. Reading
//! them tells you how the client talks to PLSDB: where, how often, and in
//! what units.

use std::time::Duration;

// ---------------------------------------------------------------------------
// PLSDB service
// ---------------------------------------------------------------------------

/// Base URL of the public PLSDB API. Endpoint paths are joined onto it.
pub const DEFAULT_API_URL: &str = "https://ccb-microbe.cs.uni-saarland.de/plsdb2025/api/";

/// Environment variable that overrides [`DEFAULT_API_URL`].
pub const API_URL_ENV: &str = "PLSDB_API_URL";

pub const FASTA_ENDPOINT: &str = "fasta";
pub const SUMMARY_ENDPOINT: &str = "summary/";
pub const SEQUENCE_ENDPOINT: &str = "sequence/";

/// Separator appended after each accession of a bulk download request.
pub const ACCESSION_SEPARATOR: char = ';';

/// Multipart part name carrying the query FASTA of a search.
pub const SEARCH_UPLOAD_FIELD: &str = "fasta_file";

/// Record name used when an inline sequence is wrapped as FASTA.
pub const DEFAULT_SEQUENCE_NAME: &str = "sequence";

// ---------------------------------------------------------------------------
// Job protocol
// ---------------------------------------------------------------------------

/// Time the server is given between two status queries of a running job.
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Bytes written per step when persisting a downloaded FASTA file.
pub const DOWNLOAD_CHUNK_SIZE: usize = 1024;

// ---------------------------------------------------------------------------
// Result tables
// ---------------------------------------------------------------------------

/// Injected column holding the classification of a looked-up accession.
pub const LABEL_COLUMN: &str = "label";

/// Injected column holding the accession as it was searched.
pub const SEARCHED_COLUMN: &str = "searched";

/// Column carrying accessions in filter results.
pub const ACCESSION_COLUMN: &str = "NUCCORE_ACC";

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Log file written next to the working directory unless relocated.
pub const DEFAULT_LOG_FILE: &str = "plsdbapi.log";

/// Maximum characters shown when previewing unexpected response bodies.
pub const ERROR_BODY_PREVIEW_LENGTH: usize = 200;
