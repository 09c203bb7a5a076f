//! Catalog walk: filter, resolve, select and queue.
//!
//! Entries are handled one at a time on the caller's task; only the downloads
//! themselves run in parallel on the [`WorkerPool`]. Problems with a single
//! entry are logged and the entry is skipped. Only the catalog fetch and the
//! final cleanup of the temporary area can fail a run.

use crate::catalog::{CatalogClient, CatalogEntry, HttpManifestResolver, ManifestResolver};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::job::Job;
use crate::manifest::{Manifest, resolve_uri};
use crate::pool::{WorkerPool, fetch_bytes};
use crate::types::{Event, JobId, SkipReason};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

/// What happened to one catalog entry
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemOutcome {
    /// A job was submitted
    Queued(JobId),
    /// No job was submitted
    Skipped(SkipReason),
}

/// Counters for one pass over the catalog
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Entries looked at
    pub entries: usize,
    /// Jobs submitted
    pub queued: usize,
    /// Entries whose title is not whitelisted
    pub not_whitelisted: usize,
    /// Entries already present at their destination
    pub already_present: usize,
    /// Entries sharing a destination with a job queued earlier in the run
    pub already_queued: usize,
    /// Entries whose manifest could not be resolved, fetched or parsed
    pub manifest_failures: usize,
    /// Entries whose manifest lists no stream
    pub no_stream: usize,
}

impl RunSummary {
    /// Count one outcome
    pub fn record(&mut self, outcome: ItemOutcome) {
        self.entries += 1;
        match outcome {
            ItemOutcome::Queued(_) => self.queued += 1,
            ItemOutcome::Skipped(SkipReason::NotWhitelisted) => self.not_whitelisted += 1,
            ItemOutcome::Skipped(SkipReason::AlreadyPresent) => self.already_present += 1,
            ItemOutcome::Skipped(SkipReason::AlreadyQueued) => self.already_queued += 1,
            ItemOutcome::Skipped(SkipReason::ManifestUnavailable) => self.manifest_failures += 1,
            ItemOutcome::Skipped(SkipReason::NoStream) => self.no_stream += 1,
        }
    }
}

/// Drives catalog entries into the worker pool
pub struct Orchestrator {
    ctx: Context,
    pool: WorkerPool,
    resolver: Arc<dyn ManifestResolver>,
    /// Destinations with a job submitted (or being prepared) in this run
    claimed: Mutex<HashSet<PathBuf>>,
}

impl Orchestrator {
    /// Launch the worker pool and prepare to process entries
    pub fn new(ctx: Context, resolver: Arc<dyn ManifestResolver>) -> Self {
        let workers = ctx.config.download.workers;
        let pool = WorkerPool::launch(ctx.clone(), workers, CancellationToken::new());
        Self {
            ctx,
            pool,
            resolver,
            claimed: Mutex::new(HashSet::new()),
        }
    }

    /// The pool jobs are submitted to
    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Process every entry in order
    ///
    /// # Errors
    /// Only a pool that refuses jobs stops the walk; per-entry problems are skips.
    pub async fn process_all(&self, entries: &[CatalogEntry]) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        for (index, entry) in entries.iter().enumerate() {
            summary.record(self.process_entry(index, entry).await?);
        }
        Ok(summary)
    }

    /// Decide what to do with one catalog entry and submit a job if needed
    ///
    /// The destination checks happen before any network call, so an entry that
    /// is already on disk or already queued costs nothing. A destination is
    /// claimed for the rest of the run once a job for it is submitted; the
    /// claim is released again when the entry is skipped later on.
    pub async fn process_entry(&self, index: usize, entry: &CatalogEntry) -> Result<ItemOutcome> {
        let filename = entry.filename();
        let label = format!("[{}] {}", index, filename);

        if !self.ctx.config.whitelist.should_process(&entry.title) {
            info!(item = %label, title = %entry.title, "not registered, skipping");
            return Ok(self.skip(entry, SkipReason::NotWhitelisted));
        }

        let dest_root = self.ctx.config.dest_dir();
        let extension = &self.ctx.config.download.container_extension;
        let destination = entry.name().destination(dest_root, extension);
        if tokio::fs::try_exists(&destination).await.unwrap_or(false) {
            info!(item = %label, path = %destination.display(), "already exists, skipping download");
            return Ok(self.skip(entry, SkipReason::AlreadyPresent));
        }

        if !self.claimed.lock().await.insert(destination.clone()) {
            info!(item = %label, path = %destination.display(), "already queued in this run, skipping");
            return Ok(self.skip(entry, SkipReason::AlreadyQueued));
        }

        let outcome = self.queue_entry(&label, entry, &filename).await;
        if !matches!(outcome, Ok(ItemOutcome::Queued(_))) {
            self.claimed.lock().await.remove(&destination);
        }
        outcome
    }

    /// Resolve, fetch and select the stream of a claimed entry, then submit it
    async fn queue_entry(
        &self,
        label: &str,
        entry: &CatalogEntry,
        filename: &str,
    ) -> Result<ItemOutcome> {
        let dest_root = self.ctx.config.dest_dir();

        let manifest_url = match self.resolver.resolve(entry).await {
            Ok(Some(url)) => url,
            Ok(None) => {
                warn!(item = %label, diffusion_id = %entry.diffusion_id, "no manifest URL, skipping");
                return Ok(self.skip(entry, SkipReason::ManifestUnavailable));
            }
            Err(e) => {
                warn!(item = %label, diffusion_id = %entry.diffusion_id, error = %e, "manifest URL lookup failed, skipping");
                return Ok(self.skip(entry, SkipReason::ManifestUnavailable));
            }
        };

        let manifest_url = match Url::parse(&manifest_url) {
            Ok(url) => url,
            Err(e) => {
                warn!(item = %label, url = %manifest_url, error = %e, "invalid manifest URL, skipping");
                return Ok(self.skip(entry, SkipReason::ManifestUnavailable));
            }
        };

        let manifest = match fetch_bytes(&self.ctx.http, &manifest_url).await {
            Ok(body) => Manifest::new(body),
            Err(e) => {
                warn!(item = %label, url = %manifest_url, error = %e, "downloading manifest failed, skipping");
                return Ok(self.skip(entry, SkipReason::ManifestUnavailable));
            }
        };

        let stream = match manifest.best_stream() {
            Ok(Some(stream)) => stream,
            Ok(None) => {
                info!(item = %label, url = %manifest_url, "manifest lists no stream, skipping");
                return Ok(self.skip(entry, SkipReason::NoStream));
            }
            Err(e) => {
                warn!(item = %label, url = %manifest_url, error = %e, "manifest could not be parsed, skipping");
                return Ok(self.skip(entry, SkipReason::ManifestUnavailable));
            }
        };
        debug!(
            item = %label,
            resolution = %stream.resolution,
            bandwidth = stream.bandwidth,
            codecs = %stream.codecs,
            "selected stream"
        );

        let stream_url = match resolve_uri(&manifest_url, &stream.url) {
            Ok(url) => url,
            Err(e) => {
                warn!(item = %label, error = %e, "stream URL could not be resolved, skipping");
                return Ok(self.skip(entry, SkipReason::ManifestUnavailable));
            }
        };

        let title_dir = entry.name().title_dir(dest_root);
        info!(item = %label, path = %title_dir.display(), ">> downloading");
        let job = Job::new(stream_url.as_str(), title_dir, filename);
        let id = self.pool.submit(job).await?;
        info!(item = %label, job_id = %id, "queued up for download");

        Ok(ItemOutcome::Queued(id))
    }

    /// Wait for every job, stop the pool and remove the temporary area
    ///
    /// # Errors
    /// Failing to remove the temporary area is an [`Error::Cleanup`].
    pub async fn finish(&self) -> Result<()> {
        info!(pending = self.pool.pending(), "waiting for all downloads to be done");
        self.pool.wait_idle().await?;
        self.pool.shutdown().await;
        info!("done processing catalog");

        let temp = self.ctx.config.temp_dir();
        match tokio::fs::remove_dir_all(temp).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(Error::Cleanup {
                path: temp.clone(),
                source,
            }),
        }
    }

    fn skip(&self, entry: &CatalogEntry, reason: SkipReason) -> ItemOutcome {
        self.ctx.emit(Event::EntrySkipped {
            title: entry.title.clone(),
            reason,
        });
        ItemOutcome::Skipped(reason)
    }
}

/// Fetch the catalog, queue every eligible entry and wait for the downloads
///
/// # Errors
/// Catalog failures abort before any job is queued; cleanup failures are
/// reported after every job has finished.
pub async fn run(ctx: Context) -> Result<RunSummary> {
    let catalog = CatalogClient::new(ctx.http.clone());
    let entries = catalog.fetch(&ctx.config.catalog.catalog_url).await?;
    info!(entries = entries.len(), "catalog fetched");

    let resolver = Arc::new(HttpManifestResolver::new(
        ctx.http.clone(),
        &ctx.config.catalog,
    ));
    let orchestrator = Orchestrator::new(ctx, resolver);

    let summary = orchestrator.process_all(&entries).await;
    let finished = orchestrator.finish().await;
    let summary = summary?;
    finished?;

    info!(
        entries = summary.entries,
        queued = summary.queued,
        not_whitelisted = summary.not_whitelisted,
        already_present = summary.already_present,
        already_queued = summary.already_queued,
        manifest_failures = summary.manifest_failures,
        no_stream = summary.no_stream,
        "run complete"
    );
    Ok(summary)
}
