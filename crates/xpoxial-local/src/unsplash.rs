//! Unsplash image provider (secondary image API).

use serde::Deserialize;
use xpoxial_core::{Error, ImageProvider, ImageResult, Result};

use crate::config::KeyedConfig;

#[derive(Debug, Clone)]
pub struct UnsplashProvider {
    client: reqwest::Client,
    access_key: String,
    endpoint: String,
}

impl UnsplashProvider {
    pub fn new(client: reqwest::Client, cfg: &KeyedConfig) -> Self {
        Self {
            client,
            access_key: cfg.api_key.clone(),
            endpoint: cfg
                .endpoint
                .clone()
                .unwrap_or_else(|| "https://api.unsplash.com/search/photos".to_string()),
        }
    }
}

#[async_trait::async_trait]
impl ImageProvider for UnsplashProvider {
    fn name(&self) -> &'static str {
        "unsplash"
    }

    async fn search_images(&self, query: &str, needed: usize) -> Result<Vec<ImageResult>> {
        let per_page = needed.clamp(1, 30);
        let resp = self
            .client
            .get(&self.endpoint)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Client-ID {}", self.access_key),
            )
            .query(&[("query", query), ("per_page", &per_page.to_string())])
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(crate::status_error("unsplash", status));
        }

        let parsed: UnsplashResponse =
            resp.json().await.map_err(|e| Error::Decode(e.to_string()))?;
        Ok(parsed
            .results
            .into_iter()
            .filter_map(|p| {
                let image_url = p.urls.and_then(|u| u.regular.or(u.full))?;
                Some(ImageResult {
                    image_url,
                    alt_text: p.alt_description,
                    photographer_name: p.user.as_ref().and_then(|u| u.name.clone()),
                    photographer_url: p
                        .user
                        .and_then(|u| u.links)
                        .and_then(|l| l.html),
                    source_platform: Some("unsplash".to_string()),
                    source_url: p.links.and_then(|l| l.html),
                })
            })
            .take(needed)
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct UnsplashResponse {
    #[serde(default)]
    results: Vec<UnsplashPhoto>,
}

#[derive(Debug, Deserialize)]
struct UnsplashPhoto {
    alt_description: Option<String>,
    urls: Option<UnsplashUrls>,
    links: Option<UnsplashLinks>,
    user: Option<UnsplashUser>,
}

#[derive(Debug, Deserialize)]
struct UnsplashUrls {
    full: Option<String>,
    regular: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UnsplashLinks {
    html: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UnsplashUser {
    name: Option<String>,
    links: Option<UnsplashLinks>,
}
