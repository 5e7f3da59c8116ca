// src/jobs/fasta.rs
//! Bulk FASTA download: submit accessions, poll, stream the file to disk.
//!
//! Completion is signalled by the status endpoint switching from JSON to a
//! binary body, not by a label.

use super::submit::{submit_fasta, Submission};
use super::{poll_until_terminal, FailureReason, JobContext, JobStatus};
use crate::api::{parser, FastaDelivery, FastaReply, JobReply, ServerLabel};
use crate::error::{AppError, ProtocolError};
use crate::model::FastaDownload;
use crate::output::{destination_for, filename_from_disposition, persist_stream, DownloadProgress};
use crate::types::Accession;
use std::path::Path;

/// Interprets a JSON answer of the bulk download status endpoint.
///
/// Only `running` keeps the job alive. A `notfound` list fails the job naming
/// the accessions; any other label fails it echoing the label.
pub fn interpret_fasta_json(reply: JobReply) -> Result<JobStatus<FastaDelivery>, AppError> {
    if reply.label == Some(ServerLabel::Running) {
        return Ok(JobStatus::Running);
    }

    if let Some(accessions) = reply.notfound.filter(|ids| !ids.is_empty()) {
        return Ok(JobStatus::Failed(FailureReason::NotFound(accessions)));
    }

    match reply.label {
        Some(label) => Ok(JobStatus::Failed(FailureReason::Label(
            label.as_str().to_string(),
        ))),
        None => Err(ProtocolError::UnexpectedShape("fasta status without label".to_string()).into()),
    }
}

fn interpret_fasta_reply(reply: FastaReply) -> Result<JobStatus<FastaDelivery>, AppError> {
    match reply {
        FastaReply::Structured(value) => interpret_fasta_json(parser::decode_job_reply(value)?),
        FastaReply::Delivery(delivery) => Ok(JobStatus::Finished(delivery)),
    }
}

/// Downloads the FASTA sequences of `accessions` into `destination_dir`.
///
/// The file name comes from the server's `content-disposition` header. No
/// file is created unless the server delivers one.
pub async fn download_fasta(
    ctx: &JobContext<'_>,
    accessions: &[Accession],
    destination_dir: &Path,
    progress: &mut dyn DownloadProgress,
) -> Result<FastaDownload, AppError> {
    ctx.ensure_active()?;
    let handle = match submit_fasta(ctx.repository, accessions).await? {
        Submission::Accepted(handle) => handle,
        Submission::Immediate(reply) => {
            return match interpret_fasta_json(reply)? {
                JobStatus::Failed(reason) => Err(reason.into()),
                _ => Err(ProtocolError::MissingJobId.into()),
            };
        }
    };

    log::info!("START with job id: {}", handle.id());
    let repository = ctx.repository;
    let job_id = handle.id().clone();
    let delivery = poll_until_terminal(ctx, &handle, || {
        let job_id = job_id.clone();
        async move { interpret_fasta_reply(repository.fasta_status(&job_id).await?) }
    })
    .await?;

    let header = delivery
        .content_disposition
        .as_deref()
        .ok_or(ProtocolError::MissingHeader("content-disposition"))?;
    let filename = filename_from_disposition(header).ok_or_else(|| {
        ProtocolError::UnexpectedShape(format!("no filename in content-disposition {:?}", header))
    })?;
    let path = destination_for(destination_dir, &filename)?;

    log::info!("starting file download to {}", path.display());
    let download = persist_stream(&path, delivery.body, progress).await?;
    log::info!("DONE ({} bytes)", download.bytes_written);
    Ok(download)
}
