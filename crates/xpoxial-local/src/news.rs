//! News provider client.
//!
//! Articles are filtered before they count as results: anything missing a
//! title, url, source, or timestamp, or carrying the upstream `[Removed]`
//! sentinel title, is dropped. HTTP statuses stay typed so the retry policy
//! upstream can tell a fatal 4xx (bad key) from a transient 5xx.

use serde::Deserialize;
use xpoxial_core::{Error, NewsArticle, NewsProvider, Result};

use crate::config::KeyedConfig;

#[derive(Debug, Clone)]
pub struct NewsApiProvider {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl NewsApiProvider {
    pub fn new(client: reqwest::Client, cfg: &KeyedConfig) -> Self {
        Self {
            client,
            api_key: cfg.api_key.clone(),
            endpoint: cfg
                .endpoint
                .clone()
                .unwrap_or_else(|| "https://newsapi.org/v2/everything".to_string()),
        }
    }
}

#[async_trait::async_trait]
impl NewsProvider for NewsApiProvider {
    fn name(&self) -> &'static str {
        "news"
    }

    async fn fetch_news(&self, query: &str, limit: usize) -> Result<Vec<NewsArticle>> {
        let page_size = limit.clamp(1, 100);
        let resp = self
            .client
            .get(&self.endpoint)
            .header("X-Api-Key", &self.api_key)
            .query(&[
                ("q", query),
                ("pageSize", &page_size.to_string()),
                ("sortBy", "publishedAt"),
                ("language", "en"),
            ])
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(crate::status_error("news", status));
        }

        let parsed: NewsApiResponse =
            resp.json().await.map_err(|e| Error::Decode(e.to_string()))?;
        let raw = parsed.articles.len();
        let articles = filter_articles(parsed.articles, limit);
        tracing::debug!(
            target: "provider.news",
            query,
            raw,
            kept = articles.len(),
            "news fetch done"
        );
        Ok(articles)
    }
}

/// Convert raw payload articles into the output type, discarding incomplete
/// or removed entries before they count toward the limit.
fn filter_articles(raw: Vec<RawArticle>, limit: usize) -> Vec<NewsArticle> {
    raw.into_iter()
        .filter_map(|a| {
            let article = NewsArticle {
                title: a.title.unwrap_or_default(),
                description: a.description,
                url: a.url.unwrap_or_default(),
                source: a.source.and_then(|s| s.name).unwrap_or_default(),
                published_at: a.published_at.unwrap_or_default(),
            };
            article.is_complete().then_some(article)
        })
        .take(limit)
        .collect()
}

#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    #[serde(default)]
    articles: Vec<RawArticle>,
}

#[derive(Debug, Deserialize)]
struct RawArticle {
    source: Option<RawSource>,
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    #[serde(rename = "publishedAt")]
    published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::get, Json, Router};

    fn raw(title: &str, url: &str) -> RawArticle {
        RawArticle {
            source: Some(RawSource {
                name: Some("Example Wire".into()),
            }),
            title: Some(title.into()),
            description: Some("d".into()),
            url: Some(url.into()),
            published_at: Some("2025-03-01T12:00:00Z".into()),
        }
    }

    #[test]
    fn removed_sentinel_and_incomplete_articles_are_dropped() {
        let mut missing_date = raw("No date", "https://news.example/b");
        missing_date.published_at = None;
        let articles = vec![
            raw("Kept", "https://news.example/a"),
            raw("[Removed]", "https://news.example/removed"),
            missing_date,
            RawArticle {
                source: None,
                title: Some("No source".into()),
                description: None,
                url: Some("https://news.example/c".into()),
                published_at: Some("2025-03-01T12:00:00Z".into()),
            },
        ];
        let kept = filter_articles(articles, 10);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "Kept");
    }

    #[test]
    fn limit_applies_after_filtering() {
        let articles = vec![
            raw("[Removed]", "https://news.example/r"),
            raw("One", "https://news.example/1"),
            raw("Two", "https://news.example/2"),
        ];
        let kept = filter_articles(articles, 1);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "One");
    }

    #[tokio::test]
    async fn fetch_maps_payload_and_status() {
        let app = Router::new().route(
            "/v2/everything",
            get(|| async {
                Json(serde_json::json!({
                    "status": "ok",
                    "articles": [
                        {
                            "source": {"name": "Example Wire"},
                            "title": "Budget vote",
                            "description": "d",
                            "url": "https://news.example/a",
                            "publishedAt": "2025-03-01T12:00:00Z"
                        }
                    ]
                }))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let p = NewsApiProvider::new(
            reqwest::Client::new(),
            &KeyedConfig {
                api_key: "k".into(),
                endpoint: Some(format!("http://{addr}/v2/everything")),
            },
        );
        let out = p.fetch_news("budget", 10).await.unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].source, "Example Wire");
    }

    #[tokio::test]
    async fn unauthorized_is_a_fatal_http_error() {
        let app = Router::new().route(
            "/v2/everything",
            get(|| async { (axum::http::StatusCode::UNAUTHORIZED, "bad key") }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let p = NewsApiProvider::new(
            reqwest::Client::new(),
            &KeyedConfig {
                api_key: "bad".into(),
                endpoint: Some(format!("http://{addr}/v2/everything")),
            },
        );
        let err = p.fetch_news("budget", 10).await.unwrap_err();
        assert!(err.is_fatal());
    }
}
