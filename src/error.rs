//! Error types for replay-dl
//!
//! The variants follow the lifecycle of a run:
//! - setup problems (configuration, missing transcoder) abort before any work
//! - catalog problems abort the run
//! - manifest, parse and download problems stay local to one catalog entry or job
//! - cleanup problems abort the process at teardown

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for replay-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for replay-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "dest_dir")
        key: Option<String>,
    },

    /// The catalog listing could not be fetched or decoded
    #[error("catalog error: {0}")]
    Catalog(String),

    /// The manifest URL of a single catalog entry could not be resolved or fetched
    #[error("manifest error: {0}")]
    Manifest(String),

    /// Playlist content could not be interpreted
    #[error("playlist parse error: {0}")]
    Parse(#[from] ParseError),

    /// Content retrieval error
    #[error("download error: {0}")]
    Download(#[from] DownloadError),

    /// The temporary working area could not be removed at shutdown
    #[error("failed to clean up {}: {source}", .path.display())]
    Cleanup {
        /// Directory that could not be removed
        path: PathBuf,
        /// Underlying I/O failure
        source: std::io::Error,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// External tool execution failed (ffmpeg)
    #[error("external tool error: {0}")]
    ExternalTool(String),

    /// The worker pool has been told to stop and accepts no more jobs
    #[error("shutdown in progress: not accepting new jobs")]
    ShuttingDown,

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build a configuration error tied to a specific setting
    pub fn config(message: impl Into<String>, key: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }
}

/// Playlist parsing errors
///
/// None of these are retryable: fetching the same bytes again yields the same failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A line is not valid UTF-8
    #[error("line {line} is not valid UTF-8")]
    InvalidUtf8 {
        /// 1-based line number
        line: usize,
    },

    /// A URI line could not be resolved into an absolute URL
    #[error("invalid URI {uri:?}")]
    InvalidUri {
        /// The offending URI as written in the playlist
        uri: String,
    },

    /// The playlist lists neither media segments nor variant streams
    #[error("playlist contains no media segments or variant streams")]
    NoMedia,
}

/// Content retrieval errors
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The server answered with a non-success status
    #[error("HTTP {status} for {url}")]
    HttpStatus {
        /// Requested URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// The server answered successfully but sent no bytes
    #[error("empty response body for {url}")]
    EmptyBody {
        /// Requested URL
        url: String,
    },
}
