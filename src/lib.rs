//! # replay-dl
//!
//! Downloads catch-up TV episodes published as HTTP Live Streaming playlists.
//!
//! ## How a run works
//!
//! 1. The program catalog is fetched once.
//! 2. Each entry whose title is whitelisted and whose file is not on disk yet
//!    has its multivariant playlist resolved, fetched and parsed.
//! 3. The widest variant is queued as a job on a bounded worker pool.
//! 4. Workers download the variant's segments, remux them with ffmpeg and
//!    move the result to `<dest>/<title>/<title> - SxxEyy - <subtitle>.mp4`,
//!    retrying transient failures.
//! 5. Once every job has finished, the temporary working area is removed.
//!
//! ## Quick Start
//!
//! ```no_run
//! use replay_dl::{Config, Context, FfmpegTranscoder};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::from_json(r#"{"whitelist": ["Peppa Pig"]}"#)?;
//!     config.download.dest_dir = "/srv/tv".into();
//!     config.validate()?;
//!
//!     let transcoder = Arc::new(FfmpegTranscoder::discover(&config.tools)?);
//!     let ctx = Context::new(config, transcoder)?;
//!
//!     // Subscribe to events
//!     let mut events = ctx.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let summary = replay_dl::run(ctx).await?;
//!     println!("{} episodes queued", summary.queued);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Program catalog and manifest URL resolution
pub mod catalog;
/// Configuration types
pub mod config;
/// Shared runtime state
pub mod context;
/// Error types
pub mod error;
/// Jobs and destination naming
pub mod job;
/// HLS playlist parsing and variant selection
pub mod manifest;
/// Catalog processing
pub mod orchestrator;
/// Bounded worker pool
pub mod pool;
/// Retry logic with exponential backoff
pub mod retry;
/// External remuxer
pub mod transcoder;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use catalog::{CatalogClient, CatalogEntry, HttpManifestResolver, ManifestResolver};
pub use config::{Config, RetryConfig, Whitelist};
pub use context::Context;
pub use error::{Error, Result};
pub use job::{EpisodeName, Job, JobKind};
pub use manifest::{Manifest, Resolution, Segment, Stream, best_stream};
pub use orchestrator::{ItemOutcome, Orchestrator, RunSummary, run};
pub use pool::WorkerPool;
pub use transcoder::{FfmpegTranscoder, Transcoder};
pub use types::{Event, JobId, JobStatus, SkipReason};
