//! Remote program catalog.
//!
//! The catalog is one JSON document listing the episodes currently available
//! for replay. Each entry only carries identifiers; the URL of its playlist is
//! looked up separately through a [`ManifestResolver`].

mod resolver;

pub use resolver::{HttpManifestResolver, ManifestResolver};

use crate::error::{Error, Result};
use crate::job::EpisodeName;
use serde::{Deserialize, Deserializer};
use tracing::debug;

/// Top-level catalog document
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CatalogDocument {
    /// Listing payload
    #[serde(rename = "reponse", default)]
    pub response: CatalogResponse,
}

/// Listing payload of the catalog document
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CatalogResponse {
    /// Entries in this page
    #[serde(default)]
    pub nb: u64,
    /// Entries available in total
    #[serde(default)]
    pub total: u64,
    /// Episodes
    #[serde(rename = "emissions", default)]
    pub entries: Vec<CatalogEntry>,
}

/// One episode of the catalog
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct CatalogEntry {
    /// Broadcast identifier, unique per entry
    #[serde(rename = "id_diffusion", deserialize_with = "lenient_string", default)]
    pub diffusion_id: String,
    /// Program title
    #[serde(rename = "titre", deserialize_with = "lenient_string", default)]
    pub title: String,
    /// Episode subtitle
    #[serde(rename = "soustitre", deserialize_with = "lenient_string", default)]
    pub subtitle: String,
    /// Season number; may be empty
    #[serde(rename = "saison", deserialize_with = "lenient_string", default)]
    pub season: String,
    /// Episode number; may be empty
    #[serde(deserialize_with = "lenient_string", default)]
    pub episode: String,
}

impl CatalogEntry {
    /// Naming view of this entry
    pub fn name(&self) -> EpisodeName<'_> {
        EpisodeName {
            title: &self.title,
            season: &self.season,
            episode: &self.episode,
            diffusion_id: &self.diffusion_id,
            subtitle: &self.subtitle,
        }
    }

    /// Canonical, unsanitized filename of this entry
    pub fn filename(&self) -> String {
        self.name().filename()
    }
}

/// Accept strings, numbers or null for fields the service types inconsistently
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
        Null,
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Text(s)) => s,
        Some(Raw::Int(n)) => n.to_string(),
        Some(Raw::Float(n)) => n.to_string(),
        Some(Raw::Null) | None => String::new(),
    })
}

/// Fetches the catalog listing
#[derive(Clone, Debug)]
pub struct CatalogClient {
    http: reqwest::Client,
}

impl CatalogClient {
    /// Create a client sharing an existing HTTP client
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Download and decode the catalog
    ///
    /// # Errors
    /// Any transport failure, non-success status or undecodable body is an
    /// [`Error::Catalog`]; a run cannot proceed without the listing.
    pub async fn fetch(&self, url: &str) -> Result<Vec<CatalogEntry>> {
        debug!(url, "fetching catalog");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Catalog(format!("failed to fetch catalog {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Catalog(format!(
                "catalog returned HTTP {}: {}",
                status.as_u16(),
                url
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Catalog(format!("failed to read catalog {}: {}", url, e)))?;

        let document = Self::decode(&body)?;
        debug!(
            entries = document.response.entries.len(),
            total = document.response.total,
            "catalog decoded"
        );
        Ok(document.response.entries)
    }

    /// Decode a catalog document
    pub fn decode(body: &[u8]) -> Result<CatalogDocument> {
        serde_json::from_slice(body)
            .map_err(|e| Error::Catalog(format!("invalid catalog document: {}", e)))
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const CATALOG: &str = r#"{
        "query": {},
        "reponse": {
            "nb": 2,
            "total": 2,
            "emissions": [
                {
                    "id_diffusion": "124932599",
                    "titre": "Peppa Pig",
                    "soustitre": "La cabane",
                    "saison": "3",
                    "episode": "12",
                    "chaine_label": "France 5"
                },
                {
                    "id_diffusion": 777,
                    "titre": "Oui-Oui",
                    "soustitre": "Le cadeau",
                    "saison": null,
                    "episode": ""
                }
            ]
        }
    }"#;

    #[test]
    fn decode_catalog_document() {
        let document = CatalogClient::decode(CATALOG.as_bytes()).unwrap();
        assert_eq!(document.response.nb, 2);
        assert_eq!(document.response.entries.len(), 2);

        let first = &document.response.entries[0];
        assert_eq!(first.title, "Peppa Pig");
        assert_eq!(first.filename(), "Peppa Pig - S03E12 - La cabane");
    }

    #[test]
    fn numeric_and_null_fields_are_accepted() {
        let document = CatalogClient::decode(CATALOG.as_bytes()).unwrap();
        let second = &document.response.entries[1];

        assert_eq!(second.diffusion_id, "777");
        assert_eq!(second.season, "");
        assert_eq!(second.filename(), "Oui-Oui - S00E777 - Le cadeau");
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let document = CatalogClient::decode(br#"{"reponse":{"emissions":[{"titre":"X"}]}}"#)
            .unwrap();
        let entry = &document.response.entries[0];
        assert_eq!(entry.title, "X");
        assert!(entry.episode.is_empty());
    }

    #[test]
    fn garbage_is_a_catalog_error() {
        let err = CatalogClient::decode(b"<html>").unwrap_err();
        assert!(matches!(err, Error::Catalog(_)));
    }

    #[tokio::test]
    async fn fetch_returns_entries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/catalog"))
            .respond_with(ResponseTemplate::new(200).set_body_string(CATALOG))
            .expect(1)
            .mount(&server)
            .await;

        let client = CatalogClient::new(reqwest::Client::new());
        let entries = client
            .fetch(&format!("{}/catalog", server.uri()))
            .await
            .unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[tokio::test]
    async fn fetch_error_status_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = CatalogClient::new(reqwest::Client::new());
        let err = client.fetch(&server.uri()).await.unwrap_err();
        assert!(matches!(err, Error::Catalog(ref m) if m.contains("503")));
    }
}
