//! Event helpers for integration tests

use replay_dl::{Event, SkipReason};
use tokio::sync::broadcast;

/// Everything currently buffered on an event receiver
pub fn drain_events(events: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut collected = Vec::new();
    while let Ok(event) = events.try_recv() {
        collected.push(event);
    }
    collected
}

/// Number of jobs that entered the queue
pub fn queued_count(events: &[Event]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, Event::JobQueued { .. }))
        .count()
}

/// Number of jobs that finished successfully
pub fn completed_count(events: &[Event]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, Event::JobCompleted { .. }))
        .count()
}

/// Whether `title` was skipped for `reason`
pub fn was_skipped(events: &[Event], title: &str, reason: SkipReason) -> bool {
    events.iter().any(|e| {
        matches!(e, Event::EntrySkipped { title: t, reason: r } if t == title && *r == reason)
    })
}
