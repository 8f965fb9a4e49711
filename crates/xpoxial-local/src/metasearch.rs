//! Multi-engine meta-search API client.
//!
//! One upstream API fronts several search engines; the engine is selected per
//! request with a query parameter. Each call returns four result lists (web,
//! image, video, related questions) which map directly onto
//! [`EngineResultBundle`]. Callers fan out one call per engine and isolate
//! failures per engine.

use serde::Deserialize;
use xpoxial_core::{
    Engine, EngineResultBundle, EngineSearchApi, Error, ImageResult, Result, VideoResult,
    WebResult,
};

use crate::config::KeyedConfig;

#[derive(Debug, Clone)]
pub struct MetaSearchClient {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl MetaSearchClient {
    pub fn new(client: reqwest::Client, cfg: &KeyedConfig) -> Self {
        Self {
            client,
            api_key: cfg.api_key.clone(),
            endpoint: cfg
                .endpoint
                .clone()
                .unwrap_or_else(|| "https://www.searchapi.io/api/v1/search".to_string()),
        }
    }
}

#[async_trait::async_trait]
impl EngineSearchApi for MetaSearchClient {
    async fn engine_search(&self, query: &str, engine: Engine) -> Result<EngineResultBundle> {
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("engine", engine.as_str()),
                ("q", query),
                ("api_key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(crate::status_error(engine.as_str(), status));
        }

        let parsed: MetaResponse =
            resp.json().await.map_err(|e| Error::Decode(e.to_string()))?;
        Ok(bundle_from_payload(parsed))
    }
}

fn bundle_from_payload(payload: MetaResponse) -> EngineResultBundle {
    let web_results = payload
        .organic_results
        .into_iter()
        .filter_map(|r| {
            let link = r.link?;
            Some(WebResult {
                title: r.title.unwrap_or_default(),
                link,
                snippet: r.snippet.unwrap_or_default(),
            })
        })
        .collect();

    let image_results = payload
        .inline_images
        .into_iter()
        .filter_map(|i| {
            let image_url = i.original.or(i.thumbnail)?;
            Some(ImageResult {
                image_url,
                alt_text: i.title,
                photographer_name: None,
                photographer_url: None,
                source_platform: i.source,
                source_url: i.link,
            })
        })
        .collect();

    let video_results = payload
        .inline_videos
        .into_iter()
        .filter_map(|v| {
            let link = v.link?;
            Some(VideoResult {
                title: v.title.unwrap_or_default(),
                link,
            })
        })
        .collect();

    let related_questions = payload
        .related_questions
        .into_iter()
        .filter_map(|q| q.question)
        .collect();

    EngineResultBundle {
        web_results,
        image_results,
        video_results,
        related_questions,
        error: None,
    }
}

#[derive(Debug, Default, Deserialize)]
struct MetaResponse {
    #[serde(default)]
    organic_results: Vec<MetaOrganic>,
    #[serde(default)]
    inline_images: Vec<MetaImage>,
    #[serde(default)]
    inline_videos: Vec<MetaVideo>,
    #[serde(default)]
    related_questions: Vec<MetaQuestion>,
}

#[derive(Debug, Deserialize)]
struct MetaOrganic {
    title: Option<String>,
    link: Option<String>,
    snippet: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MetaImage {
    title: Option<String>,
    original: Option<String>,
    thumbnail: Option<String>,
    source: Option<String>,
    link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MetaVideo {
    title: Option<String>,
    link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MetaQuestion {
    question: Option<String>,
}
