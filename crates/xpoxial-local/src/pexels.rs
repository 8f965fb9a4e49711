//! Pexels image provider (dedicated image API, priority just below the
//! primary engine's embedded images).

use serde::Deserialize;
use xpoxial_core::{Error, ImageProvider, ImageResult, Result};

use crate::config::KeyedConfig;

#[derive(Debug, Clone)]
pub struct PexelsProvider {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl PexelsProvider {
    pub fn new(client: reqwest::Client, cfg: &KeyedConfig) -> Self {
        Self {
            client,
            api_key: cfg.api_key.clone(),
            endpoint: cfg
                .endpoint
                .clone()
                .unwrap_or_else(|| "https://api.pexels.com/v1/search".to_string()),
        }
    }
}

#[async_trait::async_trait]
impl ImageProvider for PexelsProvider {
    fn name(&self) -> &'static str {
        "pexels"
    }

    async fn search_images(&self, query: &str, needed: usize) -> Result<Vec<ImageResult>> {
        let per_page = needed.clamp(1, 80);
        let resp = self
            .client
            .get(&self.endpoint)
            .header(reqwest::header::AUTHORIZATION, &self.api_key)
            .query(&[("query", query), ("per_page", &per_page.to_string())])
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(crate::status_error("pexels", status));
        }

        let parsed: PexelsResponse =
            resp.json().await.map_err(|e| Error::Decode(e.to_string()))?;
        Ok(parsed
            .photos
            .into_iter()
            .filter_map(|p| {
                let image_url = p.src.and_then(|s| s.large.or(s.original))?;
                Some(ImageResult {
                    image_url,
                    alt_text: p.alt,
                    photographer_name: p.photographer,
                    photographer_url: p.photographer_url,
                    source_platform: Some("pexels".to_string()),
                    source_url: p.url,
                })
            })
            .take(needed)
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct PexelsResponse {
    #[serde(default)]
    photos: Vec<PexelsPhoto>,
}

#[derive(Debug, Deserialize)]
struct PexelsPhoto {
    url: Option<String>,
    alt: Option<String>,
    photographer: Option<String>,
    photographer_url: Option<String>,
    src: Option<PexelsSrc>,
}

#[derive(Debug, Deserialize)]
struct PexelsSrc {
    original: Option<String>,
    large: Option<String>,
}
