//! Configuration types for replay-dl
//!
//! The on-disk format is JSON. Sub-configs are flattened so the smallest
//! useful document is just the whitelist:
//!
//! ```json
//! { "whitelist": ["Peppa Pig", "Oui-Oui"] }
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Download behavior configuration (directories, concurrency, output container)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Destination root; must exist before a run starts
    #[serde(default)]
    pub dest_dir: PathBuf,

    /// Process-local working area for segments and remux output
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// Number of workers draining the job queue (default: 4)
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Job queue capacity; `submit` waits when the queue is full (default: 32)
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Extension of the final container written by the transcoder (default: "mp4")
    #[serde(default = "default_container_extension")]
    pub container_extension: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            dest_dir: PathBuf::new(),
            temp_dir: default_temp_dir(),
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
            container_extension: default_container_extension(),
        }
    }
}

/// Remote catalog endpoints
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Program listing returning the catalog JSON document
    #[serde(default = "default_catalog_url")]
    pub catalog_url: String,

    /// Per-item information endpoint listing the available renditions
    #[serde(default = "default_info_url")]
    pub info_url: String,

    /// Value of the `catalogue` query parameter sent to `info_url`
    #[serde(default = "default_catalogue")]
    pub catalogue: String,

    /// Rendition format tag that marks the adaptive-streaming manifest
    #[serde(default = "default_manifest_format")]
    pub manifest_format: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            catalog_url: default_catalog_url(),
            info_url: default_info_url(),
            catalogue: default_catalogue(),
            manifest_format: default_manifest_format(),
        }
    }
}

/// External tool paths
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Path to ffmpeg executable (auto-detected if None)
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    /// Whether to search PATH for ffmpeg if no explicit path is set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            search_path: true,
        }
    }
}

/// Retry behavior for a single job
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total number of attempts per job, first try included (default: 4)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the second attempt (default: 1 second)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Upper bound for the delay between attempts (default: 30 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

/// Titles the tool is allowed to act on
///
/// Matching is exact and case-sensitive. An empty whitelist matches nothing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Whitelist(HashSet<String>);

impl Whitelist {
    /// Build a whitelist from a list of titles
    pub fn new<I, S>(titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(titles.into_iter().map(Into::into).collect())
    }

    /// Whether a catalog entry with this title should be processed
    pub fn should_process(&self, title: &str) -> bool {
        self.0.contains(title)
    }

    /// Number of whitelisted titles
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no title is whitelisted
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Main configuration
///
/// Fields are organized into sub-configs:
/// - [`download`](DownloadConfig) - directories, worker count, queue size, container
/// - [`catalog`](CatalogConfig) - remote listing and manifest endpoints
/// - [`tools`](ToolsConfig) - transcoder location
///
/// All sub-configs are flattened, so the JSON document has no nesting except `retry`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Titles to download
    #[serde(default)]
    pub whitelist: Whitelist,

    /// Download behavior settings
    #[serde(flatten)]
    pub download: DownloadConfig,

    /// Remote catalog endpoints
    #[serde(flatten)]
    pub catalog: CatalogConfig,

    /// External tool paths
    #[serde(flatten)]
    pub tools: ToolsConfig,

    /// Retry behavior for jobs
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Config {
    /// Load configuration from a JSON file
    ///
    /// A missing or undecodable file is a configuration error.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(
                format!("cannot read config file '{}': {}", path.display(), e),
                "config",
            )
        })?;
        Self::from_json(&content).map_err(|e| match e {
            Error::Serialization(inner) => Error::config(
                format!("invalid config file '{}': {}", path.display(), inner),
                "config",
            ),
            other => other,
        })
    }

    /// Parse configuration from a JSON string
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Check the settings a run cannot start without
    pub fn validate(&self) -> Result<()> {
        let dest = &self.download.dest_dir;
        if dest.as_os_str().is_empty() {
            return Err(Error::config("destination folder is not set", "dest_dir"));
        }
        if !dest.is_dir() {
            return Err(Error::config(
                format!("destination folder '{}' does not exist", dest.display()),
                "dest_dir",
            ));
        }
        if self.download.workers == 0 {
            return Err(Error::config("at least one worker is required", "workers"));
        }
        if self.download.queue_capacity == 0 {
            return Err(Error::config(
                "queue capacity must be greater than zero",
                "queue_capacity",
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::config(
                "at least one attempt per job is required",
                "retry.max_attempts",
            ));
        }
        Ok(())
    }

    /// Destination root
    pub fn dest_dir(&self) -> &PathBuf {
        &self.download.dest_dir
    }

    /// Temporary working area
    pub fn temp_dir(&self) -> &PathBuf {
        &self.download.temp_dir
    }
}

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir().join(format!("replay-dl-{}", std::process::id()))
}

fn default_workers() -> usize {
    4
}

fn default_queue_capacity() -> usize {
    32
}

fn default_container_extension() -> String {
    "mp4".to_string()
}

fn default_catalog_url() -> String {
    "http://pluzz.webservices.francetelevisions.fr/pluzz/liste/type/replay/rubrique/jeunesse/nb/200/debut/0".to_string()
}

fn default_info_url() -> String {
    "http://webservices.francetelevisions.fr/tools/getInfosOeuvre/v2/".to_string()
}

fn default_catalogue() -> String {
    "Pluzz".to_string()
}

fn default_manifest_format() -> String {
    "hls_v5_os".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    4
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(30)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

// Duration serialization helper (integer seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
