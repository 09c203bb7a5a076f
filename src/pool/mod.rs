//! Bounded worker pool.
//!
//! A fixed number of workers drain one shared, bounded queue. Submitting
//! blocks while the queue is full. Every accepted job is tracked by a
//! pending counter until it reaches a terminal state, which is what
//! [`WorkerPool::wait_idle`] waits on.
//!
//! - [`worker`] - Worker loop and per-job lifecycle with retries
//! - [`download`] - One download attempt (playlist, segments, remux, publish)

mod download;
mod worker;

pub(crate) use download::fetch_bytes;


use crate::context::Context;
use crate::error::{Error, Result};
use crate::job::Job;
use crate::types::{Event, JobId};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A job in the queue, holding its share of the pending count
pub(crate) struct QueuedJob {
    pub(crate) job: Job,
    pub(crate) _pending: PendingGuard,
}

/// Decrements the pending count when the job reaches a terminal state
///
/// Dropping happens on success, failure, panic, or when a job is discarded
/// unprocessed, so the count cannot leak.
pub(crate) struct PendingGuard {
    pending: Arc<watch::Sender<usize>>,
}

impl PendingGuard {
    fn new(pending: Arc<watch::Sender<usize>>) -> Self {
        pending.send_modify(|n| *n += 1);
        Self { pending }
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.pending.send_modify(|n| *n = n.saturating_sub(1));
    }
}

/// Fixed set of workers consuming a bounded job queue
pub struct WorkerPool {
    ctx: Context,
    sender: Mutex<Option<mpsc::Sender<QueuedJob>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    pending: Arc<watch::Sender<usize>>,
    next_id: AtomicU64,
    stop: CancellationToken,
}

impl WorkerPool {
    /// Start `pool_size` workers
    ///
    /// The queue holds `config.download.queue_capacity` jobs. Workers exit once
    /// `stop` is cancelled and the queue is empty, or when the pool is shut down.
    pub fn launch(ctx: Context, pool_size: usize, stop: CancellationToken) -> Self {
        let pool_size = pool_size.max(1);
        let capacity = ctx.config.download.queue_capacity.max(1);
        let (sender, receiver) = mpsc::channel(capacity);
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..pool_size)
            .map(|index| {
                tokio::spawn(worker::run_worker(
                    index,
                    ctx.clone(),
                    Arc::clone(&receiver),
                    stop.clone(),
                ))
            })
            .collect();

        tracing::info!(workers = pool_size, queue_capacity = capacity, "worker pool started");

        let (pending, _) = watch::channel(0usize);

        Self {
            ctx,
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(workers),
            pending: Arc::new(pending),
            next_id: AtomicU64::new(1),
            stop,
        }
    }

    /// Queue a job and return its assigned id
    ///
    /// Waits while the queue is full. Once the pool is stopping, jobs are
    /// rejected with [`Error::ShuttingDown`].
    pub async fn submit(&self, mut job: Job) -> Result<JobId> {
        if self.stop.is_cancelled() {
            return Err(Error::ShuttingDown);
        }

        let sender = match self.sender.lock().await.as_ref() {
            Some(sender) => sender.clone(),
            None => return Err(Error::ShuttingDown),
        };

        let id = JobId(self.next_id.fetch_add(1, Ordering::SeqCst));
        job.id = id;
        let filename = job.filename.clone();

        let queued = QueuedJob {
            job,
            _pending: PendingGuard::new(Arc::clone(&self.pending)),
        };

        tokio::select! {
            sent = sender.send(queued) => {
                // On failure the guard inside the returned job is dropped here
                sent.map_err(|_| Error::ShuttingDown)?;
            }
            _ = self.stop.cancelled() => return Err(Error::ShuttingDown),
        }

        tracing::debug!(job_id = %id, filename = %filename, "job queued");
        self.ctx.emit(Event::JobQueued { id, filename });
        Ok(id)
    }

    /// Jobs submitted and not yet terminal
    pub fn pending(&self) -> usize {
        *self.pending.borrow()
    }

    /// Wait until every submitted job has reached a terminal state
    pub async fn wait_idle(&self) -> Result<()> {
        let mut rx = self.pending.subscribe();
        rx.wait_for(|n| *n == 0)
            .await
            .map_err(|_| Error::Other("pending job counter closed".to_string()))?;
        Ok(())
    }

    /// Stop the workers and wait for them to exit
    ///
    /// No new jobs are accepted. Jobs already in the queue are still run
    /// before the workers exit.
    pub async fn shutdown(&self) {
        self.stop.cancel();
        self.sender.lock().await.take();

        let workers: Vec<_> = self.workers.lock().await.drain(..).collect();
        for result in futures::future::join_all(workers).await {
            if let Err(e) = result {
                tracing::error!(error = %e, "worker task failed");
            }
        }

        tracing::info!("worker pool stopped");
        self.ctx.emit(Event::Shutdown);
    }
}
