//! Shared runtime state for one run.

use crate::config::Config;
use crate::error::Result;
use crate::transcoder::Transcoder;
use crate::types::Event;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Everything the orchestrator and the workers share
///
/// Built once at startup and cloned into each component; all fields are
/// cheap to clone.
#[derive(Clone)]
pub struct Context {
    /// Run configuration (read-only)
    pub config: Arc<Config>,
    /// HTTP client reused for catalog, manifest and segment requests
    pub http: reqwest::Client,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub events: broadcast::Sender<Event>,
    /// Converts assembled streams into the output container
    pub transcoder: Arc<dyn Transcoder>,
}

impl Context {
    /// Build a context around a validated configuration
    pub fn new(config: Config, transcoder: Arc<dyn Transcoder>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("replay-dl/", env!("CARGO_PKG_VERSION")))
            .build()?;

        // Lagging subscribers lose old events rather than blocking workers
        let (events, _rx) = broadcast::channel(1000);

        Ok(Self {
            config: Arc::new(config),
            http,
            events,
            transcoder,
        })
    }

    /// Subscribe to run events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    /// Send an event to all subscribers
    ///
    /// Having no subscriber is not an error.
    pub fn emit(&self, event: Event) {
        self.events.send(event).ok();
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config)
            .field("transcoder", &self.transcoder.name())
            .finish_non_exhaustive()
    }
}
