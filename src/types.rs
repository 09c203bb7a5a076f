//! Core types and events for replay-dl

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Unique identifier for a submitted job
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct JobId(pub u64);

impl JobId {
    /// Create a new JobId
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the inner u64 value
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl From<u64> for JobId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Terminal state of a job
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Content downloaded and published to its destination
    Complete,
    /// Failed permanently or ran out of attempts
    Failed,
}

/// Why a catalog entry did not produce a job
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Title is not in the whitelist
    NotWhitelisted,
    /// Destination file already exists
    AlreadyPresent,
    /// Another entry of this run already has a job for the same destination
    AlreadyQueued,
    /// Manifest URL could not be resolved, fetched or parsed
    ManifestUnavailable,
    /// Manifest lists no variant stream
    NoStream,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            SkipReason::NotWhitelisted => "not whitelisted",
            SkipReason::AlreadyPresent => "already present",
            SkipReason::AlreadyQueued => "already queued",
            SkipReason::ManifestUnavailable => "manifest unavailable",
            SkipReason::NoStream => "no stream",
        };
        f.write_str(text)
    }
}

/// Events emitted while a run progresses
///
/// Subscribe through [`Context::subscribe`](crate::context::Context::subscribe).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A job entered the queue
    JobQueued {
        /// Job identifier
        id: JobId,
        /// Sanitized destination filename (without extension)
        filename: String,
    },

    /// A worker picked the job up
    JobStarted {
        /// Job identifier
        id: JobId,
    },

    /// One attempt failed; another may follow
    JobAttemptFailed {
        /// Job identifier
        id: JobId,
        /// 1-based attempt number
        attempt: u32,
        /// Error description
        error: String,
    },

    /// The job finished successfully
    JobCompleted {
        /// Job identifier
        id: JobId,
        /// Published file
        path: PathBuf,
        /// Attempts used
        attempts: u32,
    },

    /// The job reached its terminal failure state
    JobFailed {
        /// Job identifier
        id: JobId,
        /// Attempts used
        attempts: u32,
        /// Last error description
        error: String,
    },

    /// A catalog entry was skipped without submitting a job
    EntrySkipped {
        /// Catalog title
        title: String,
        /// Why it was skipped
        reason: SkipReason,
    },

    /// The worker pool stopped
    Shutdown,
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_id_display_and_conversion() {
        let id = JobId::from(7);
        assert_eq!(id.get(), 7);
        assert_eq!(id.to_string(), "7");
        assert_eq!(JobId::new(7), id);
    }

    #[test]
    fn event_serializes_with_type_tag() {
        let event = Event::EntrySkipped {
            title: "Show".to_string(),
            reason: SkipReason::AlreadyPresent,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "entry_skipped");
        assert_eq!(json["reason"], "already_present");
    }

    #[test]
    fn skip_reason_display() {
        assert_eq!(SkipReason::NotWhitelisted.to_string(), "not whitelisted");
        assert_eq!(SkipReason::NoStream.to_string(), "no stream");
        assert_eq!(SkipReason::AlreadyQueued.to_string(), "already queued");
    }
}
