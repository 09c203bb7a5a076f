//! Single-pass line parser for HLS playlists.
//!
//! Lines starting with `#EXT` are tags, any other non-empty line is a URI.
//! A pairing tag (`#EXT-X-STREAM-INF` or `#EXTINF`) stays pending until the
//! next URI line, which completes a [`Stream`] or a [`Segment`]. Other tags
//! and comments do not disturb the pending tag. Unknown tags are ignored.

use super::{ParsedManifest, Resolution, Segment, Stream};
use crate::error::ParseError;
use std::time::Duration;

const TAG_PREFIX: &str = "#EXT";
const STREAM_INF: &str = "#EXT-X-STREAM-INF";
const SEGMENT_INF: &str = "#EXTINF";

/// Parse raw playlist bytes into variant streams and media segments.
///
/// Fails only when a line is not UTF-8. Malformed attributes degrade to
/// zero values and a tag without an attribute list is skipped.
///
/// Only `#EXT-X-STREAM-INF` and `#EXTINF` are remembered for the next URI
/// line; any other tag between one of them and its URI is ignored instead of
/// replacing it, so the URI still pairs with the last pairing tag.
pub fn parse(content: &[u8]) -> Result<ParsedManifest, ParseError> {
    let mut parsed = ParsedManifest::default();
    let mut pending: Option<&str> = None;

    for (index, raw) in content.split(|b| *b == b'\n').enumerate() {
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        let line = std::str::from_utf8(raw)
            .map_err(|_| ParseError::InvalidUtf8 { line: index + 1 })?
            .trim();

        if line.is_empty() {
            continue;
        }

        if line.starts_with(TAG_PREFIX) {
            if line.starts_with(STREAM_INF) || line.starts_with(SEGMENT_INF) {
                pending = Some(line);
            }
            continue;
        }

        if line.starts_with('#') {
            continue;
        }

        match pending.take() {
            Some(tag) if tag.starts_with(STREAM_INF) => {
                if let Some(stream) = parse_stream(tag, line) {
                    parsed.streams.push(stream);
                } else {
                    tracing::debug!(tag, "skipping stream tag without attribute list");
                }
            }
            Some(tag) => {
                let order = parsed.segments.len();
                parsed.segments.push(parse_segment(tag, line, order));
            }
            None => {}
        }
    }

    Ok(parsed)
}

/// Build a variant stream from its `#EXT-X-STREAM-INF` tag and URI line.
fn parse_stream(tag: &str, uri: &str) -> Option<Stream> {
    let (_, attributes) = tag.split_once(':')?;

    let mut stream = Stream {
        url: uri.to_string(),
        ..Stream::default()
    };

    for (key, value) in split_attributes(attributes) {
        match key {
            "BANDWIDTH" => stream.bandwidth = value.parse().unwrap_or(0),
            "RESOLUTION" => stream.resolution = parse_resolution(value),
            "CODECS" => stream.codecs = unquote(value).to_string(),
            _ => {}
        }
    }

    Some(stream)
}

/// Build a segment from its `#EXTINF:<duration>,<title>` tag and URI line.
fn parse_segment(tag: &str, uri: &str, order: usize) -> Segment {
    let info = tag.split_once(':').map(|(_, rest)| rest).unwrap_or("");
    let (duration, title) = info.split_once(',').unwrap_or((info, ""));

    let duration = duration
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(Duration::from_secs_f64)
        .unwrap_or_default();

    Segment {
        order,
        duration,
        title: title.trim().to_string(),
        url: uri.to_string(),
    }
}

/// `WIDTHxHEIGHT`; each half that is not a number becomes 0.
pub(crate) fn parse_resolution(value: &str) -> Resolution {
    let (width, height) = value.split_once(['x', 'X']).unwrap_or((value, ""));
    Resolution {
        width: width.trim().parse().unwrap_or(0),
        height: height.trim().parse().unwrap_or(0),
    }
}

/// Split a `KEY=VALUE,KEY="V,A,L"` attribute list, honouring quoted commas.
///
/// Entries without `=` are dropped.
pub(crate) fn split_attributes(list: &str) -> Vec<(&str, &str)> {
    let mut pairs = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;

    for (i, c) in list.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                push_pair(&mut pairs, &list[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    push_pair(&mut pairs, &list[start..]);

    pairs
}

fn push_pair<'a>(pairs: &mut Vec<(&'a str, &'a str)>, entry: &'a str) {
    if let Some((key, value)) = entry.split_once('=') {
        pairs.push((key.trim(), value.trim()));
    }
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}
