//! Units of work handed to the worker pool, and destination naming.
//!
//! Every catalog entry maps onto a canonical name
//! `"<title> - S<season>E<episode> - <subtitle>"` and a destination
//! `<dest>/<title>/<sanitized name>.<extension>`.

use crate::types::JobId;
use crate::utils::sanitize_filename;
use std::path::{Path, PathBuf};

/// What a worker does with a job's URL
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JobKind {
    /// Fetch a media playlist, download its segments in order and assemble them
    #[default]
    SegmentList,
}

/// A unit of work: fetch `url` and publish it as `<dest_dir>/<filename>.<ext>`
///
/// Ownership moves from the orchestrator into the queue and then to exactly
/// one worker, which is the only writer of `attempts`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Job {
    /// Assigned by the pool on submit
    pub id: JobId,
    /// Processing mode
    pub kind: JobKind,
    /// Source URL (the selected variant's media playlist)
    pub url: String,
    /// Directory the final file is published into
    pub dest_dir: PathBuf,
    /// Sanitized filename, without extension
    pub filename: String,
    /// Attempts made so far
    pub attempts: u32,
}

impl Job {
    /// Create a segment-list job; `filename` is sanitized here
    pub fn new(url: impl Into<String>, dest_dir: impl Into<PathBuf>, filename: &str) -> Self {
        Self {
            id: JobId::default(),
            kind: JobKind::SegmentList,
            url: url.into(),
            dest_dir: dest_dir.into(),
            filename: sanitize_filename(filename),
            attempts: 0,
        }
    }

    /// Final path of the published file for a container extension
    pub fn destination(&self, extension: &str) -> PathBuf {
        self.dest_dir
            .join(format!("{}.{}", self.filename, extension))
    }
}

/// Identifiers of one catalog entry used to build its filename
#[derive(Clone, Copy, Debug)]
pub struct EpisodeName<'a> {
    /// Program title
    pub title: &'a str,
    /// Season number as text; may be empty
    pub season: &'a str,
    /// Episode number as text; may be empty
    pub episode: &'a str,
    /// Broadcast identifier, used when the episode is unset
    pub diffusion_id: &'a str,
    /// Episode subtitle
    pub subtitle: &'a str,
}

impl EpisodeName<'_> {
    /// Canonical, unsanitized filename
    ///
    /// ```
    /// use replay_dl::job::EpisodeName;
    ///
    /// let name = EpisodeName {
    ///     title: "Show",
    ///     season: "",
    ///     episode: "",
    ///     diffusion_id: "123",
    ///     subtitle: "Pilot",
    /// };
    /// assert_eq!(name.filename(), "Show - S00E123 - Pilot");
    /// ```
    pub fn filename(&self) -> String {
        let episode = if self.episode.is_empty() {
            self.diffusion_id
        } else {
            self.episode
        };
        format!(
            "{} - S{}E{} - {}",
            self.title,
            format_season(self.season),
            episode,
            self.subtitle
        )
    }

    /// Directory for this title under the destination root
    pub fn title_dir(&self, dest_root: &Path) -> PathBuf {
        dest_root.join(sanitize_filename(self.title))
    }

    /// Where the finished file for this entry lives
    pub fn destination(&self, dest_root: &Path, extension: &str) -> PathBuf {
        self.title_dir(dest_root).join(format!(
            "{}.{}",
            sanitize_filename(&self.filename()),
            extension
        ))
    }
}

/// Zero-pad a season to two digits; an empty season becomes `00`
pub fn format_season(season: &str) -> String {
    let season = season.trim();
    match season.chars().count() {
        0 => "00".to_string(),
        1 => format!("0{season}"),
        _ => season.to_string(),
    }
}
