//! Manifest URL lookup for catalog entries.

use super::CatalogEntry;
use crate::config::CatalogConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Finds the adaptive playlist URL of a catalog entry
#[async_trait]
pub trait ManifestResolver: Send + Sync {
    /// Playlist URL of `entry`
    ///
    /// `Ok(None)` means the entry has no rendition in the expected format.
    /// Errors are per entry; callers skip the entry and continue.
    async fn resolve(&self, entry: &CatalogEntry) -> Result<Option<String>>;
}

#[derive(Debug, Default, Deserialize)]
struct WorkInfo {
    #[serde(default)]
    videos: Vec<Rendition>,
}

#[derive(Debug, Deserialize)]
struct Rendition {
    #[serde(default)]
    format: String,
    #[serde(default)]
    url: String,
}

/// [`ManifestResolver`] backed by the broadcaster's work-info service
///
/// Resolved URLs are cached by diffusion id for the lifetime of the resolver,
/// so an entry is looked up over the network at most once.
#[derive(Debug)]
pub struct HttpManifestResolver {
    http: reqwest::Client,
    info_url: String,
    catalogue: String,
    format: String,
    cache: Mutex<HashMap<String, String>>,
}

impl HttpManifestResolver {
    /// Create a resolver for the configured service
    pub fn new(http: reqwest::Client, config: &CatalogConfig) -> Self {
        Self {
            http,
            info_url: config.info_url.clone(),
            catalogue: config.catalogue.clone(),
            format: config.manifest_format.clone(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Number of cached URLs
    pub async fn cached(&self) -> usize {
        self.cache.lock().await.len()
    }

    async fn lookup(&self, diffusion_id: &str) -> Result<Option<String>> {
        let response = self
            .http
            .get(&self.info_url)
            .query(&[
                ("catalogue", self.catalogue.as_str()),
                ("idDiffusion", diffusion_id),
            ])
            .send()
            .await
            .map_err(|e| Error::Manifest(format!("work info request failed: {}", e)))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(Error::Manifest(format!(
                "work info returned HTTP {} for diffusion {}",
                status.as_u16(),
                diffusion_id
            )));
        }

        let info: WorkInfo = response.json().await.map_err(|e| {
            Error::Manifest(format!(
                "invalid work info for diffusion {}: {}",
                diffusion_id, e
            ))
        })?;

        Ok(info
            .videos
            .into_iter()
            .find(|video| video.format == self.format && !video.url.is_empty())
            .map(|video| video.url))
    }
}

#[async_trait]
impl ManifestResolver for HttpManifestResolver {
    async fn resolve(&self, entry: &CatalogEntry) -> Result<Option<String>> {
        if let Some(url) = self.cache.lock().await.get(&entry.diffusion_id) {
            debug!(diffusion_id = %entry.diffusion_id, "manifest URL cache hit");
            return Ok(Some(url.clone()));
        }

        let resolved = self.lookup(&entry.diffusion_id).await?;
        match &resolved {
            Some(url) => {
                self.cache
                    .lock()
                    .await
                    .insert(entry.diffusion_id.clone(), url.clone());
            }
            None => warn!(
                title = %entry.title,
                diffusion_id = %entry.diffusion_id,
                format = %self.format,
                "no rendition in the expected format"
            ),
        }
        Ok(resolved)
    }
}
