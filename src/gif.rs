//! Keyword to GIF URL lookup against the GIPHY search API.
//!
//! Lookups never fail: any problem degrades to [`PLACEHOLDER_GIF_URL`].

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::consts::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_HTTP_TIMEOUT_SECS, GIPHY_SEARCH_URL, PLACEHOLDER_GIF_URL,
};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GifConfig {
    pub endpoint: String,
    pub placeholder_url: String,
    pub timeout_secs: u64,
}

impl Default for GifConfig {
    fn default() -> Self {
        Self {
            endpoint: GIPHY_SEARCH_URL.to_string(),
            placeholder_url: PLACEHOLDER_GIF_URL.to_string(),
            timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<GifObject>,
}

#[derive(Debug, Deserialize)]
struct GifObject {
    images: GifImages,
}

#[derive(Debug, Deserialize)]
struct GifImages {
    downsized_medium: GifRendition,
}

#[derive(Debug, Deserialize)]
struct GifRendition {
    url: String,
}

/// Remove every whitespace character, e.g. `"happy cat"` becomes `"happycat"`.
pub fn search_term(keyword: &str) -> String {
    keyword.chars().filter(|c| !c.is_whitespace()).collect()
}

#[derive(Clone)]
pub struct GifClient {
    client: Client,
    api_key: Option<String>,
    config: GifConfig,
}

impl GifClient {
    pub fn new(api_key: Option<String>, config: GifConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            api_key,
            config,
        })
    }

    pub fn placeholder_url(&self) -> &str {
        &self.config.placeholder_url
    }

    /// URL of the first search hit for `keyword`, or the placeholder.
    pub async fn fetch(&self, keyword: &str) -> String {
        match self.search(keyword).await {
            Ok(url) => url,
            Err(e) => {
                warn!(keyword = %keyword, error = %e, "GIF lookup failed, using placeholder");
                self.config.placeholder_url.clone()
            }
        }
    }

    async fn search(&self, keyword: &str) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::InvalidResponse("no GIPHY API key configured".to_string()))?;
        let term = search_term(keyword);
        debug!(term = %term, "Searching GIFs");

        let response: SearchResponse = self
            .client
            .get(&self.config.endpoint)
            .query(&[("api_key", api_key), ("q", term.as_str()), ("limit", "1")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response
            .data
            .into_iter()
            .next()
            .map(|gif| gif.images.downsized_medium.url)
            .ok_or_else(|| Error::InvalidResponse(format!("no GIFs found for {term:?}")))
    }
}

/// Remembers the last keyword so the API is only queried when it changes.
pub struct GifLookup {
    client: GifClient,
    keyword: String,
    url: Option<String>,
}

impl GifLookup {
    pub fn new(client: GifClient) -> Self {
        Self {
            client,
            keyword: String::new(),
            url: None,
        }
    }

    /// Resolve `keyword`. An empty keyword performs no query and yields `None`.
    pub async fn update(&mut self, keyword: &str) -> Option<&str> {
        if keyword.is_empty() {
            self.keyword.clear();
            self.url = None;
            return None;
        }
        if keyword != self.keyword || self.url.is_none() {
            self.url = Some(self.client.fetch(keyword).await);
            self.keyword = keyword.to_string();
        }
        self.url.as_deref()
    }
}
