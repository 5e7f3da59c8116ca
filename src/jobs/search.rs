// src/jobs/search.rs
//! Similarity search jobs: submit a query FASTA, poll, decode the result table.

use super::submit::{submit_search, Submission};
use super::{poll_until_terminal, FailureReason, JobContext, JobStatus};
use crate::api::{parser, JobReply, ServerLabel};
use crate::error::{AppError, ProtocolError};
use crate::model::ResultTable;
use crate::types::SearchRequest;

/// Interprets a search status answer.
///
/// `finished` carries the serialized result table. Labels outside the known
/// vocabulary are a protocol error rather than a reason to keep polling.
pub fn interpret_search_reply(reply: JobReply) -> Result<JobStatus<ResultTable>, AppError> {
    let label = reply.label.ok_or_else(|| {
        ProtocolError::UnexpectedShape("search status without label".to_string())
    })?;

    match label {
        ServerLabel::Running => Ok(JobStatus::Running),
        ServerLabel::Finished => {
            let results = reply.results.ok_or_else(|| {
                ProtocolError::UnexpectedShape("finished search without results".to_string())
            })?;
            Ok(JobStatus::Finished(parser::decode_split_table(results)?))
        }
        ServerLabel::Failed | ServerLabel::Error | ServerLabel::NoJobId => Ok(JobStatus::Failed(
            FailureReason::Label(label.as_str().to_string()),
        )),
        ServerLabel::InvalidPost => Ok(JobStatus::InvalidSubmission(
            reply.error.unwrap_or_else(|| "no detail given".to_string()),
        )),
        ServerLabel::Other(other) => Err(ProtocolError::UnexpectedShape(format!(
            "unknown search label {:?}",
            other
        ))
        .into()),
    }
}

/// Runs a similarity search to completion and returns its result table.
pub async fn run_search(
    ctx: &JobContext<'_>,
    request: &SearchRequest,
) -> Result<ResultTable, AppError> {
    ctx.ensure_active()?;
    log::info!("START sequence search ({})", request.search_type);

    let handle = match submit_search(ctx.repository, request).await? {
        Submission::Accepted(handle) => handle,
        Submission::Immediate(reply) => {
            return match interpret_search_reply(reply)? {
                JobStatus::Finished(table) => {
                    log::info!("DONE");
                    Ok(table)
                }
                JobStatus::Failed(reason) => Err(reason.into()),
                JobStatus::InvalidSubmission(message) => {
                    Err(AppError::InvalidSubmission { message })
                }
                JobStatus::Running => Err(ProtocolError::MissingJobId.into()),
            };
        }
    };

    log::info!("START with job id: {}", handle.id());
    let repository = ctx.repository;
    let job_id = handle.id().clone();
    let table = poll_until_terminal(ctx, &handle, || {
        let job_id = job_id.clone();
        async move {
            let value = repository.search_status(&job_id).await?;
            interpret_search_reply(parser::decode_job_reply(value)?)
        }
    })
    .await?;

    log::info!("DONE");
    Ok(table)
}
