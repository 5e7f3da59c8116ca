// src/jobs/poller.rs
//! Status polling of a submitted job.

use super::{JobContext, JobHandle, JobStatus};
use crate::error::AppError;
use std::future::Future;
use std::time::{Duration, Instant};

/// Queries `job` until it reaches a terminal state.
///
/// `query` performs one status request and interprets the answer. The first
/// query is sent immediately; after every `Running` answer the loop waits one
/// policy interval before querying again, so `n` running answers mean exactly
/// `n` pauses, except that no pause follows the last query the attempt cap
/// permits. Failures end the loop at once and are never retried.
///
/// Cancellation is checked before each query and interrupts a pause. The
/// optional attempt cap and deadline from [`super::PollPolicy`] bound the
/// loop; without them it runs until the job ends.
pub async fn poll_until_terminal<T, F, Fut>(
    ctx: &JobContext<'_>,
    job: &JobHandle,
    mut query: F,
) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<JobStatus<T>, AppError>>,
{
    let started = Instant::now();
    let mut waited = Duration::ZERO;
    let mut attempts = 0u32;

    loop {
        if ctx.cancel.is_cancelled() {
            log::info!("{} job {} cancelled", job.kind(), job.id());
            return Err(AppError::Cancelled);
        }

        if let Some(max) = ctx.policy.max_attempts {
            if attempts >= max {
                return Err(AppError::PollExhausted { attempts });
            }
        }

        attempts += 1;
        match query().await? {
            JobStatus::Running => {
                log::info!("{}", job.kind().running_message());
            }
            JobStatus::Finished(payload) => {
                log::info!("{} job {} finished after {} queries", job.kind(), job.id(), attempts);
                return Ok(payload);
            }
            JobStatus::Failed(reason) => {
                log::debug!("{} job {} failed: {:?}", job.kind(), job.id(), reason);
                return Err(reason.into());
            }
            JobStatus::InvalidSubmission(message) => {
                return Err(AppError::InvalidSubmission { message });
            }
        }

        if ctx.policy.max_attempts.is_some_and(|max| attempts >= max) {
            return Err(AppError::PollExhausted { attempts });
        }

        let interval = ctx.policy.interval;
        if let Some(deadline) = ctx.policy.deadline {
            let elapsed = started.elapsed().max(waited);
            if elapsed + interval > deadline {
                return Err(AppError::DeadlineExceeded { elapsed });
            }
        }

        tokio::select! {
            _ = ctx.cancel.cancelled() => {
                log::info!("{} job {} cancelled while waiting", job.kind(), job.id());
                return Err(AppError::Cancelled);
            }
            _ = ctx.pause.pause(interval) => {}
        }
        waited += interval;
    }
}
