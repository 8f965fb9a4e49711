//! Pixabay image provider (tertiary image API).

use serde::Deserialize;
use xpoxial_core::{Error, ImageProvider, ImageResult, Result};

use crate::config::KeyedConfig;

#[derive(Debug, Clone)]
pub struct PixabayProvider {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl PixabayProvider {
    pub fn new(client: reqwest::Client, cfg: &KeyedConfig) -> Self {
        Self {
            client,
            api_key: cfg.api_key.clone(),
            endpoint: cfg
                .endpoint
                .clone()
                .unwrap_or_else(|| "https://pixabay.com/api/".to_string()),
        }
    }
}

#[async_trait::async_trait]
impl ImageProvider for PixabayProvider {
    fn name(&self) -> &'static str {
        "pixabay"
    }

    async fn search_images(&self, query: &str, needed: usize) -> Result<Vec<ImageResult>> {
        // Pixabay rejects per_page below 3.
        let per_page = needed.clamp(3, 200);
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("key", self.api_key.as_str()),
                ("q", query),
                ("per_page", &per_page.to_string()),
                ("image_type", "photo"),
            ])
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(crate::status_error("pixabay", status));
        }

        let parsed: PixabayResponse =
            resp.json().await.map_err(|e| Error::Decode(e.to_string()))?;
        Ok(parsed
            .hits
            .into_iter()
            .filter_map(|h| {
                let image_url = h.web_format_url.or(h.large_image_url)?;
                Some(ImageResult {
                    image_url,
                    alt_text: h.tags,
                    photographer_name: h.user,
                    photographer_url: None,
                    source_platform: Some("pixabay".to_string()),
                    source_url: h.page_url,
                })
            })
            .take(needed)
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct PixabayResponse {
    #[serde(default)]
    hits: Vec<PixabayHit>,
}

#[derive(Debug, Deserialize)]
struct PixabayHit {
    #[serde(rename = "webformatURL")]
    web_format_url: Option<String>,
    #[serde(rename = "largeImageURL")]
    large_image_url: Option<String>,
    #[serde(rename = "pageURL")]
    page_url: Option<String>,
    tags: Option<String>,
    user: Option<String>,
}
