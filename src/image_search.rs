//! Stock photo lookup for items and recipes (Pexels).
//!
//! Always yields a URL: when there is no key, no match, or the request fails,
//! a placeholder image keyed by the query text is returned instead.

use crate::error::{Error, Result};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

pub const PEXELS_BASE_URL: &str = "https://api.pexels.com/v1";

const PLACEHOLDER_BASE_URL: &str = "https://loremflickr.com/320/240";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    photos: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    src: PhotoSource,
}

#[derive(Debug, Deserialize)]
struct PhotoSource {
    medium: Option<String>,
}

/// Deterministic fallback image for a query
pub fn placeholder_url(query: &str) -> String {
    format!("{}/{}", PLACEHOLDER_BASE_URL, urlencoding::encode(query))
}

/// Image search client. Successful lookups are remembered per query for the
/// lifetime of the client.
#[derive(Debug, Clone)]
pub struct ImageSearchClient {
    client: Client,
    api_key: Option<String>,
    pub(crate) base_url: String,
    hits: Arc<RwLock<HashMap<String, String>>>,
}

impl ImageSearchClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: PEXELS_BASE_URL.to_string(),
            hits: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Image URL for `query`; never empty.
    pub async fn search_image(&self, query: &str) -> String {
        let key = query.trim().to_lowercase();
        if let Some(url) = self.hits.read().await.get(&key) {
            log::debug!("Image lookup cache hit for \"{}\"", query);
            return url.clone();
        }

        match self.fetch_first_photo(query).await {
            Ok(Some(url)) => {
                self.hits.write().await.insert(key, url.clone());
                url
            }
            Ok(None) => {
                log::info!("No Pexels match for \"{}\". Returning placeholder.", query);
                placeholder_url(query)
            }
            Err(Error::MissingApiKey(_)) => {
                log::debug!("Pexels API key is missing. Returning placeholder.");
                placeholder_url(query)
            }
            Err(e) => {
                log::warn!("Error searching Pexels for \"{}\": {}", query, e);
                placeholder_url(query)
            }
        }
    }

    async fn fetch_first_photo(&self, query: &str) -> Result<Option<String>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(Error::MissingApiKey("Pexels"))?;

        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .header("Authorization", api_key)
            .query(&[("query", query), ("per_page", "1")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::HttpStatus { status, body });
        }

        let parsed: SearchResponse = response.json().await?;
        Ok(parsed
            .photos
            .into_iter()
            .next()
            .and_then(|photo| photo.src.medium)
            .filter(|url| !url.is_empty()))
    }
}
