//! Variant selection.

use super::Stream;

/// Pick the variant with the widest resolution.
///
/// Streams are compared on width only, in document order. A later stream
/// replaces the current pick only when it is strictly wider, so ties
/// (including streams without a declared resolution) keep the first one seen.
/// Bandwidth and codecs do not take part in the comparison.
///
/// Returns `None` only for an empty slice.
pub fn best_stream(streams: &[Stream]) -> Option<&Stream> {
    let mut best: Option<&Stream> = None;
    for stream in streams {
        match best {
            Some(current) if stream.resolution.width <= current.resolution.width => {}
            _ => best = Some(stream),
        }
    }
    best
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::Resolution;

    fn stream(url: &str, width: u32, height: u32, bandwidth: u64) -> Stream {
        Stream {
            bandwidth,
            resolution: Resolution::new(width, height),
            url: url.to_string(),
            ..Stream::default()
        }
    }

    #[test]
    fn no_streams_no_pick() {
        assert!(best_stream(&[]).is_none());
    }

    #[test]
    fn single_stream_is_picked() {
        let streams = [stream("only", 0, 0, 0)];
        assert_eq!(best_stream(&streams).unwrap().url, "only");
    }

    #[test]
    fn widest_stream_wins() {
        let streams = [
            stream("144p", 256, 144, 181_000),
            stream("576p", 1024, 576, 1_496_000),
            stream("360p", 640, 360, 800_000),
        ];
        let best = best_stream(&streams).unwrap();
        assert_eq!(best.url, "576p");
        assert!(streams.iter().all(|s| best.resolution.width >= s.resolution.width));
    }

    #[test]
    fn ties_keep_first_seen() {
        let streams = [
            stream("first", 1280, 720, 1_000),
            stream("second", 1280, 1080, 9_000_000),
        ];
        for _ in 0..10 {
            assert_eq!(best_stream(&streams).unwrap().url, "first");
        }
    }

    #[test]
    fn all_zero_width_keeps_first() {
        let streams = [
            stream("audio-lo", 0, 0, 64_000),
            stream("audio-hi", 0, 0, 128_000),
        ];
        assert_eq!(best_stream(&streams).unwrap().url, "audio-lo");
    }

    #[test]
    fn bandwidth_is_not_compared() {
        let streams = [
            stream("wide-cheap", 1920, 1080, 100),
            stream("narrow-expensive", 1280, 720, 10_000_000),
        ];
        assert_eq!(best_stream(&streams).unwrap().url, "wide-cheap");
    }
}
