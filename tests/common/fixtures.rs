//! Test fixtures: a throwaway environment, fake collaborators and canned HTTP responses

use async_trait::async_trait;
use replay_dl::config::{DownloadConfig, RetryConfig};
use replay_dl::{CatalogEntry, Config, Context, ManifestResolver, Transcoder, Whitelist};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Media playlist with two relative segments
pub const MEDIA_PLAYLIST: &str = "#EXTM3U
#EXT-X-VERSION:3
#EXT-X-TARGETDURATION:10
#EXTINF:10.0,
seg0.ts
#EXTINF:8.5,
seg1.ts
#EXT-X-ENDLIST
";

/// Bytes the two segments of [`MEDIA_PLAYLIST`] concatenate to
pub const SEGMENT_BYTES: &[u8] = b"SEGMENT-0|SEGMENT-1";

/// Multivariant playlist whose widest variant is `<prefix>/hi/index.m3u8`
pub fn master_playlist(prefix: &str) -> String {
    format!(
        "#EXTM3U\n\
         #EXT-X-STREAM-INF:SUBTITLES=\"subs\",PROGRAM-ID=1,BANDWIDTH=181000,RESOLUTION=256x144,CODECS=\"avc1.66.30, mp4a.40.2\"\n\
         {prefix}/lo/index.m3u8\n\
         #EXT-X-STREAM-INF:SUBTITLES=\"subs\",PROGRAM-ID=1,BANDWIDTH=1496000,RESOLUTION=1024x576,CODECS=\"avc1.77.30, mp4a.40.2\"\n\
         {prefix}/hi/index.m3u8\n"
    )
}

/// Stands in for ffmpeg: the "converted" file is a copy of the input
pub struct CopyTranscoder;

#[async_trait]
impl Transcoder for CopyTranscoder {
    async fn remux(&self, input: &Path, output: &Path) -> replay_dl::Result<()> {
        tokio::fs::copy(input, output).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "copy"
    }
}

/// Resolver answering from a fixed map and counting lookups
#[derive(Default)]
pub struct RecordingResolver {
    urls: HashMap<String, String>,
    calls: AtomicUsize,
}

impl RecordingResolver {
    /// Map a diffusion id to a manifest URL
    pub fn with(mut self, diffusion_id: &str, url: impl Into<String>) -> Self {
        self.urls.insert(diffusion_id.to_string(), url.into());
        self
    }

    /// Number of `resolve` calls so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ManifestResolver for RecordingResolver {
    async fn resolve(&self, entry: &CatalogEntry) -> replay_dl::Result<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.urls.get(&entry.diffusion_id).cloned())
    }
}

/// Build a catalog entry
pub fn entry(diffusion_id: &str, title: &str, season: &str, episode: &str, subtitle: &str) -> CatalogEntry {
    CatalogEntry {
        diffusion_id: diffusion_id.to_string(),
        title: title.to_string(),
        subtitle: subtitle.to_string(),
        season: season.to_string(),
        episode: episode.to_string(),
    }
}

/// Temporary destination and working directories plus a mock HTTP server
pub struct TestEnv {
    _root: TempDir,
    /// Destination root
    pub dest: PathBuf,
    /// Temporary working area
    pub temp: PathBuf,
    /// Mock origin for catalog, manifests and segments
    pub server: MockServer,
}

impl TestEnv {
    /// Create the directories and start the mock server
    pub async fn new() -> Self {
        let root = TempDir::new().expect("failed to create temp dir");
        let dest = root.path().join("dest");
        let temp = root.path().join("work");
        std::fs::create_dir_all(&dest).expect("failed to create dest dir");

        Self {
            _root: root,
            dest,
            temp,
            server: MockServer::start().await,
        }
    }

    /// Absolute URL on the mock server
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.server.uri(), path)
    }

    /// Configuration pointing every endpoint at the mock server
    pub fn config(&self, whitelist: &[&str]) -> Config {
        let mut config = Config {
            whitelist: Whitelist::new(whitelist.iter().copied()),
            download: DownloadConfig {
                dest_dir: self.dest.clone(),
                temp_dir: self.temp.clone(),
                workers: 2,
                queue_capacity: 4,
                ..DownloadConfig::default()
            },
            retry: RetryConfig {
                max_attempts: 2,
                initial_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(5),
                backoff_multiplier: 1.0,
                jitter: false,
            },
            ..Config::default()
        };
        config.catalog.catalog_url = self.url("/catalog");
        config.catalog.info_url = self.url("/info");
        config
    }

    /// Runtime context using [`CopyTranscoder`]
    pub fn context(&self, whitelist: &[&str]) -> Context {
        let config = self.config(whitelist);
        config.validate().expect("test config should be valid");
        Context::new(config, Arc::new(CopyTranscoder)).expect("failed to build context")
    }

    /// Serve a multivariant playlist at `<prefix>/master.m3u8` whose widest
    /// variant downloads to [`SEGMENT_BYTES`]
    pub async fn mount_stream(&self, prefix: &str) {
        Mock::given(method("GET"))
            .and(path(format!("{prefix}/master.m3u8")))
            .respond_with(ResponseTemplate::new(200).set_body_string(master_playlist(prefix)))
            .mount(&self.server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{prefix}/hi/index.m3u8")))
            .respond_with(ResponseTemplate::new(200).set_body_string(MEDIA_PLAYLIST))
            .mount(&self.server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{prefix}/hi/seg0.ts")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"SEGMENT-0|".to_vec()))
            .mount(&self.server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{prefix}/hi/seg1.ts")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"SEGMENT-1".to_vec()))
            .mount(&self.server)
            .await;
        // Never selected
        Mock::given(method("GET"))
            .and(path(format!("{prefix}/lo/index.m3u8")))
            .respond_with(ResponseTemplate::new(200).set_body_string(MEDIA_PLAYLIST))
            .expect(0)
            .mount(&self.server)
            .await;
    }

    /// Where the published file for an entry is expected
    pub fn destination(&self, entry: &CatalogEntry) -> PathBuf {
        entry.name().destination(&self.dest, "mp4")
    }
}

/// Catalog document in the service's wire format
pub fn catalog_json(entries: &[CatalogEntry]) -> String {
    let emissions: Vec<serde_json::Value> = entries
        .iter()
        .map(|e| {
            serde_json::json!({
                "id_diffusion": e.diffusion_id,
                "titre": e.title,
                "soustitre": e.subtitle,
                "saison": e.season,
                "episode": e.episode,
                "chaine_label": "France 5",
            })
        })
        .collect();

    serde_json::json!({
        "query": {},
        "reponse": {
            "nb": entries.len(),
            "total": entries.len(),
            "emissions": emissions,
        }
    })
    .to_string()
}

/// Work-info document listing an HLS rendition at `manifest_url`
pub fn work_info_json(manifest_url: &str) -> String {
    serde_json::json!({
        "id": "1",
        "videos": [
            { "format": "mp4-dp", "url": "http://unused.example/video.mp4", "statut": "ONLINE" },
            { "format": "hls_v5_os", "url": manifest_url, "statut": "ONLINE", "drm": false }
        ]
    })
    .to_string()
}
