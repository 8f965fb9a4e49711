//! Google Programmable Search client: the primary web-search provider, and
//! (via `searchType=image`) the top-priority image source.

use serde::Deserialize;
use std::time::Instant;
use xpoxial_core::{Error, ImageProvider, ImageResult, Result, WebResult, WebSearchProvider};

use crate::config::GoogleConfig;
use crate::status_error;

/// Hard upstream limit: Programmable Search returns at most 10 items per page.
const GOOGLE_PAGE_MAX: usize = 10;

#[derive(Debug, Clone)]
pub struct GoogleSearchProvider {
    client: reqwest::Client,
    api_key: String,
    cse_id: String,
    endpoint: String,
}

impl GoogleSearchProvider {
    pub fn new(client: reqwest::Client, cfg: &GoogleConfig) -> Self {
        Self {
            client,
            api_key: cfg.api_key.clone(),
            cse_id: cfg.cse_id.clone(),
            endpoint: cfg
                .endpoint
                .clone()
                .unwrap_or_else(|| "https://www.googleapis.com/customsearch/v1".to_string()),
        }
    }

    async fn query(&self, query: &str, num: usize, image_mode: bool) -> Result<CseResponse> {
        let t0 = Instant::now();
        let num = num.clamp(1, GOOGLE_PAGE_MAX);

        let mut req = self.client.get(&self.endpoint).query(&[
            ("key", self.api_key.as_str()),
            ("cx", self.cse_id.as_str()),
            ("q", query),
        ]);
        req = req.query(&[("num", num.to_string())]);
        if image_mode {
            req = req.query(&[("searchType", "image")]);
        }

        let resp = req.send().await.map_err(|e| Error::Network(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(status_error("google", status));
        }

        let parsed: CseResponse = resp.json().await.map_err(|e| Error::Decode(e.to_string()))?;
        tracing::debug!(
            target: "provider.google",
            query,
            image_mode,
            items = parsed.items.as_ref().map(|i| i.len()).unwrap_or(0),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "cse query done"
        );
        Ok(parsed)
    }
}

#[async_trait::async_trait]
impl WebSearchProvider for GoogleSearchProvider {
    fn name(&self) -> &'static str {
        "google"
    }

    async fn search_web(&self, query: &str, limit: usize) -> Result<Vec<WebResult>> {
        let parsed = self.query(query, limit, false).await?;
        Ok(parsed
            .items
            .unwrap_or_default()
            .into_iter()
            .filter_map(|item| {
                let link = item.link?;
                Some(WebResult {
                    title: item.title.unwrap_or_default(),
                    link,
                    snippet: item.snippet.unwrap_or_default(),
                })
            })
            .collect())
    }
}

#[async_trait::async_trait]
impl ImageProvider for GoogleSearchProvider {
    fn name(&self) -> &'static str {
        "google-images"
    }

    async fn search_images(&self, query: &str, needed: usize) -> Result<Vec<ImageResult>> {
        let parsed = self.query(query, needed, true).await?;
        Ok(parsed
            .items
            .unwrap_or_default()
            .into_iter()
            .filter_map(|item| {
                // In image mode `link` is the image itself; the page it was
                // found on lives under `image.contextLink`.
                let image_url = item.link?;
                Some(ImageResult {
                    image_url,
                    alt_text: item.title,
                    photographer_name: None,
                    photographer_url: None,
                    source_platform: Some("google".to_string()),
                    source_url: item.image.and_then(|i| i.context_link),
                })
            })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct CseResponse {
    items: Option<Vec<CseItem>>,
}

#[derive(Debug, Deserialize)]
struct CseItem {
    title: Option<String>,
    link: Option<String>,
    snippet: Option<String>,
    image: Option<CseImageMeta>,
}

#[derive(Debug, Deserialize)]
struct CseImageMeta {
    #[serde(rename = "contextLink")]
    context_link: Option<String>,
}
