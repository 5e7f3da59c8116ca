// src/jobs/submit.rs
//! Starting server-side jobs.

use super::{JobHandle, JobKind};
use crate::api::{parser, JobReply, SearchUpload};
use crate::constants::ACCESSION_SEPARATOR;
use crate::error::{AppError, ProtocolError};
use crate::types::{Accession, SearchInput, SearchRequest, ValidationError};
use serde_json::Value;

/// What the server said when a job was submitted.
#[derive(Debug, PartialEq)]
pub enum Submission {
    /// The job runs; poll it through the handle.
    Accepted(JobHandle),
    /// The server answered with a terminal label right away.
    Immediate(JobReply),
}

/// Classifies a submit answer. A reply that is neither terminal nor carries
/// a job id breaks the protocol.
pub fn classify_submission(value: Value, kind: JobKind) -> Result<Submission, AppError> {
    let reply = parser::decode_job_reply(value)?;

    if reply.label.as_ref().is_some_and(|l| l.is_terminal()) || reply.notfound.is_some() {
        return Ok(Submission::Immediate(reply));
    }

    match reply.job_id {
        Some(id) => Ok(Submission::Accepted(JobHandle::new(id, kind))),
        None => Err(ProtocolError::MissingJobId.into()),
    }
}

/// Request body of a bulk download: every accession followed by `;`.
pub fn join_accessions(accessions: &[Accession]) -> String {
    accessions
        .iter()
        .map(|a| format!("{}{}", a, ACCESSION_SEPARATOR))
        .collect()
}

/// Submits a bulk FASTA download.
pub async fn submit_fasta(
    repository: &dyn crate::api::PlsdbRepository,
    accessions: &[Accession],
) -> Result<Submission, AppError> {
    if accessions.is_empty() {
        return Err(ValidationError::EmptyIdentifierList.into());
    }
    let body = join_accessions(accessions);
    let value = repository.submit_fasta(&body).await?;
    classify_submission(value, JobKind::FastaDownload)
}

/// Builds the upload of a search request.
///
/// An input file is read whole and closed before the request is sent; an
/// inline sequence is wrapped as a single FASTA record.
pub async fn prepare_upload(request: &SearchRequest) -> Result<SearchUpload, AppError> {
    let contents = match &request.input {
        SearchInput::File(path) => match tokio::fs::read(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ValidationError::SearchFileNotFound { path: path.clone() }.into());
            }
            Err(e) => return Err(e.into()),
        },
        SearchInput::Inline { name, sequence } => format!(">{}\n{}", name, sequence).into_bytes(),
    };

    Ok(SearchUpload {
        file_name: request.input.upload_name(),
        contents,
        fields: request.form_fields(),
    })
}

/// Submits a similarity search.
pub async fn submit_search(
    repository: &dyn crate::api::PlsdbRepository,
    request: &SearchRequest,
) -> Result<Submission, AppError> {
    let upload = prepare_upload(request).await?;
    let value = repository.submit_search(upload).await?;
    classify_submission(value, JobKind::SequenceSearch)
}
