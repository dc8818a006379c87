//! Awaiting a remote run.
//!
//! The service exposes runs as pollable records. [`create_and_await_run`]
//! starts a run and polls it until the status is terminal, bounded by the
//! optional deadline in [`RunOptions`] and by a [`CancellationToken`]. When
//! the wait is abandoned the run is cancelled remotely on a best-effort basis.

use agents::{AgentId, AgentsError, AgentsService, RetryPolicy, Run, RunStatus, ThreadId};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::RunOptions;

/// Consecutive transient poll failures tolerated before giving up.
pub const MAX_POLL_RETRIES: u32 = 3;

/// Starts a run of `agent_id` over `thread_id` and waits for a terminal status.
///
/// Returns [`AgentsError::RunTimedOut`] when the deadline passes and
/// [`AgentsError::RunCancelled`] when `cancel` fires first. A run that reaches
/// the `failed` status is *not* an error; it is returned like any other
/// terminal run.
pub async fn create_and_await_run<S>(
    service: &S,
    thread_id: &ThreadId,
    agent_id: &AgentId,
    options: &RunOptions,
    cancel: &CancellationToken,
) -> Result<Run, AgentsError>
where
    S: AgentsService + ?Sized,
{
    let run = service.create_run(thread_id, agent_id).await?;
    info!(run.id = %run.id, run.status = %run.status, "run created");
    let run_id = run.id.clone();

    let deadline = async {
        match options.timeout {
            Some(limit) => tokio::time::sleep(limit).await,
            None => std::future::pending::<()>().await,
        }
    };

    let outcome = tokio::select! {
        result = poll_until_terminal(service, thread_id, run, options) => result,
        () = deadline => Err(AgentsError::RunTimedOut {
            run_id: run_id.clone(),
            waited: options.timeout.unwrap_or_default(),
        }),
        () = cancel.cancelled() => Err(AgentsError::RunCancelled { run_id: run_id.clone() }),
    };

    if let Err(AgentsError::RunTimedOut { .. } | AgentsError::RunCancelled { .. }) = &outcome {
        match service.cancel_run(thread_id, &run_id).await {
            Ok(run) => info!(run.id = %run.id, run.status = %run.status, "remote run cancelled"),
            Err(err) => warn!(run.id = %run_id, error = %err, "could not cancel remote run"),
        }
    }

    outcome
}

async fn poll_until_terminal<S>(
    service: &S,
    thread_id: &ThreadId,
    mut run: Run,
    options: &RunOptions,
) -> Result<Run, AgentsError>
where
    S: AgentsService + ?Sized,
{
    let mut failures = 0u32;
    let mut cancel_requested = false;

    loop {
        if run.status.is_terminal() {
            info!(run.id = %run.id, run.status = %run.status, "run finished");
            return Ok(run);
        }

        // No client-side tools are declared, so a run asking for tool output
        // can never progress.
        if run.status == RunStatus::RequiresAction && !cancel_requested {
            warn!(run.id = %run.id, "run requires client-side tool output; cancelling");
            cancel_requested = true;
            run = service.cancel_run(thread_id, &run.id).await?;
            continue;
        }

        tokio::time::sleep(options.poll_interval).await;

        match service.get_run(thread_id, &run.id).await {
            Ok(next) => {
                if next.status != run.status {
                    debug!(run.id = %next.id, from = %run.status, to = %next.status, "run status changed");
                }
                failures = 0;
                run = next;
            }
            Err(err) => match err.retry_policy() {
                RetryPolicy::Retryable { after } if failures < MAX_POLL_RETRIES => {
                    failures += 1;
                    warn!(run.id = %run.id, attempt = failures, error = %err, "transient failure polling run");
                    if let Some(delay) = after {
                        tokio::time::sleep(delay).await;
                    }
                }
                _ => return Err(err),
            },
        }
    }
}
