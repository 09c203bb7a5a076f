//! Worker loop and per-job lifecycle.

use super::QueuedJob;
use super::download;
use crate::context::Context;
use crate::job::{Job, JobKind};
use crate::retry::download_with_retry;
use crate::types::{Event, JobStatus};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Pull jobs from the shared queue until it is closed or the pool is stopped
///
/// Jobs already waiting in the queue are preferred over the stop signal, so a
/// stop issued after the last submit still lets the queue drain.
pub(super) async fn run_worker(
    index: usize,
    ctx: Context,
    queue: Arc<Mutex<mpsc::Receiver<QueuedJob>>>,
    stop: CancellationToken,
) {
    debug!(worker = index, "worker started");

    loop {
        let next = {
            let mut queue = queue.lock().await;
            tokio::select! {
                biased;
                job = queue.recv() => job,
                _ = stop.cancelled() => None,
            }
        };

        let Some(queued) = next else {
            break;
        };

        let id = queued.job.id;
        let task_ctx = ctx.clone();

        // A panicking job must not take the worker down with it
        let handle = tokio::spawn(async move {
            let QueuedJob { job, _pending } = queued;
            process_job(&task_ctx, job).await
        });

        if let Err(e) = handle.await {
            error!(worker = index, job_id = %id, error = %e, "job task panicked");
            ctx.emit(Event::JobFailed {
                id,
                attempts: 0,
                error: e.to_string(),
            });
        }
    }

    debug!(worker = index, "worker stopped");
}

/// Run a job to its terminal state, emitting lifecycle events
pub(super) async fn process_job(ctx: &Context, mut job: Job) -> JobStatus {
    ctx.emit(Event::JobStarted { id: job.id });
    info!(job_id = %job.id, filename = %job.filename, url = %job.url, "job started");

    let work_dir = ctx.config.temp_dir().join(job.id.to_string());
    let mut attempts = 0u32;

    let result = {
        let job = &job;
        let work_dir = work_dir.as_path();
        download_with_retry(&ctx.config.retry, || {
            attempts += 1;
            let attempt = attempts;
            async move {
                let outcome = match job.kind {
                    JobKind::SegmentList => download::attempt(ctx, job, work_dir).await,
                };
                if let Err(e) = &outcome {
                    warn!(job_id = %job.id, attempt, url = %job.url, error = %e, "attempt failed");
                    ctx.emit(Event::JobAttemptFailed {
                        id: job.id,
                        attempt,
                        error: e.to_string(),
                    });
                }
                outcome
            }
        })
        .await
    };
    job.attempts = attempts;

    match result {
        Ok(path) => {
            info!(job_id = %job.id, path = %path.display(), attempts = job.attempts, "job completed");
            ctx.emit(Event::JobCompleted {
                id: job.id,
                path,
                attempts: job.attempts,
            });
            JobStatus::Complete
        }
        Err(e) => {
            error!(
                job_id = %job.id,
                filename = %job.filename,
                url = %job.url,
                attempts = job.attempts,
                error = %e,
                "job failed"
            );
            if let Err(cleanup) = download::remove_work_dir(&work_dir).await {
                warn!(job_id = %job.id, error = %cleanup, "failed to remove job working directory");
            }
            ctx.emit(Event::JobFailed {
                id: job.id,
                attempts: job.attempts,
                error: e.to_string(),
            });
            JobStatus::Failed
        }
    }
}
