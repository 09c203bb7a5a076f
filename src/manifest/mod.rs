//! HLS playlist model.
//!
//! A [`Manifest`] holds the raw playlist bytes and parses them on first
//! access. The parsed lists are cached for the lifetime of the value:
//!
//! ```
//! use replay_dl::manifest::Manifest;
//!
//! let manifest = Manifest::new(
//!     "#EXTM3U\n#EXT-X-STREAM-INF:BANDWIDTH=181000,RESOLUTION=256x144\nlow.m3u8\n\
//!      #EXT-X-STREAM-INF:BANDWIDTH=1496000,RESOLUTION=1024x576\nhigh.m3u8\n",
//! );
//! let best = manifest.best_stream().unwrap().unwrap();
//! assert_eq!(best.url, "high.m3u8");
//! ```

mod parser;
mod select;

pub use parser::parse;
pub use select::best_stream;

use crate::error::ParseError;
use std::sync::OnceLock;
use std::time::Duration;
use url::Url;

/// Frame size declared by a variant stream
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Resolution {
    /// Width in pixels (0 when absent or malformed)
    pub width: u32,
    /// Height in pixels (0 when absent or malformed)
    pub height: u32,
}

impl Resolution {
    /// Create a resolution
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// One selectable rendition of a multivariant playlist
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Stream {
    /// Peak bits per second (0 when absent)
    pub bandwidth: u64,
    /// Declared frame size
    pub resolution: Resolution,
    /// Codec descriptor, surrounding quotes removed
    pub codecs: String,
    /// Media playlist URI, as written
    pub url: String,
    /// Media segments; empty until the media playlist itself is parsed
    pub segments: Vec<Segment>,
}

/// One chunk of a media playlist
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Segment {
    /// 0-based position in the playlist
    pub order: usize,
    /// Declared duration (zero when malformed)
    pub duration: Duration,
    /// Optional title following the duration
    pub title: String,
    /// Segment URI, as written
    pub url: String,
}

/// Result of a parsing pass
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParsedManifest {
    /// Variant streams, in document order
    pub streams: Vec<Stream>,
    /// Media segments, in document order
    pub segments: Vec<Segment>,
}

/// Raw playlist with a lazily parsed, memoized model
#[derive(Debug)]
pub struct Manifest {
    content: Vec<u8>,
    parsed: OnceLock<ParsedManifest>,
}

impl Manifest {
    /// Wrap raw playlist bytes; nothing is parsed yet
    pub fn new(content: impl Into<Vec<u8>>) -> Self {
        Self {
            content: content.into(),
            parsed: OnceLock::new(),
        }
    }

    /// Raw playlist bytes
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Whether a successful parse has been cached
    pub fn is_parsed(&self) -> bool {
        self.parsed.get().is_some()
    }

    /// Parse on first call; later calls return the cached result without scanning
    ///
    /// Failures are not cached.
    pub fn parse(&self) -> Result<&ParsedManifest, ParseError> {
        if let Some(parsed) = self.parsed.get() {
            return Ok(parsed);
        }
        let parsed = parse(&self.content)?;
        Ok(self.parsed.get_or_init(|| parsed))
    }

    /// Variant streams, in document order
    pub fn streams(&self) -> Result<&[Stream], ParseError> {
        Ok(&self.parse()?.streams)
    }

    /// Media segments, in document order
    pub fn segments(&self) -> Result<&[Segment], ParseError> {
        Ok(&self.parse()?.segments)
    }

    /// Highest-quality variant, see [`best_stream`]
    pub fn best_stream(&self) -> Result<Option<&Stream>, ParseError> {
        Ok(best_stream(self.streams()?))
    }
}

/// Resolve a playlist URI against the URL of the playlist that contains it
///
/// Absolute URIs are returned unchanged.
pub fn resolve_uri(base: &Url, uri: &str) -> Result<Url, ParseError> {
    base.join(uri).map_err(|_| ParseError::InvalidUri {
        uri: uri.to_string(),
    })
}
