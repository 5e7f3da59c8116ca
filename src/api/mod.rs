// src/api/mod.rs
//! PLSDB API interaction — the ability to talk to the plasmid database.
//!
//! The job protocol and the lookup logic depend on [`PlsdbRepository`],
//! never on HTTP details. The HTTP implementation lives in `client`; pure
//! body decoding lives in `parser`.

pub mod client;
pub mod parser;
pub mod responses;

use crate::error::AppError;
use crate::types::{Accession, FilterQuery, JobId};
use serde_json::Value;

pub use client::PlsdbHttpClient;
pub use responses::{
    ByteStream, FastaDelivery, FastaReply, JobReply, LookupResponse, LookupSchema, ServerLabel,
};

/// A search submission ready to be sent: the query FASTA plus form fields.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchUpload {
    pub file_name: String,
    pub contents: Vec<u8>,
    pub fields: Vec<(&'static str, String)>,
}

/// The endpoints of the PLSDB API.
///
/// Every method performs exactly one request. Implementations return an
/// error for any answer other than HTTP 200; the body is handed back
/// undecoded so callers choose the decoding.
#[async_trait::async_trait]
pub trait PlsdbRepository: Send + Sync {
    /// Starts preparing a FASTA file for the `;`-joined accessions.
    async fn submit_fasta(&self, joined_accessions: &str) -> Result<Value, AppError>;

    /// Queries a bulk download job: JSON while pending, the file when ready.
    async fn fasta_status(&self, job: &JobId) -> Result<FastaReply, AppError>;

    /// Looks up one accession.
    async fn lookup_summary(&self, accession: &Accession) -> Result<Value, AppError>;

    /// Starts a similarity search.
    async fn submit_search(&self, upload: SearchUpload) -> Result<Value, AppError>;

    /// Queries a similarity search job.
    async fn search_status(&self, job: &JobId) -> Result<Value, AppError>;

    /// Runs a metadata filter query.
    async fn filter(&self, query: &FilterQuery) -> Result<Value, AppError>;
}
