use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid query: {0}")]
    InvalidQuery(String),
    #[error("not configured: {0}")]
    NotConfigured(String),
    #[error("{provider} returned HTTP {status}")]
    Http { provider: String, status: u16 },
    #[error("network error: {0}")]
    Network(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("llm failed: {0}")]
    Llm(String),
}

impl Error {
    /// A fatal error must not be retried: the same request will keep failing
    /// (bad credentials, bad parameters). Everything else is transient.
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::Http { status, .. } => (400..500).contains(status),
            Error::InvalidQuery(_) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Reject blank queries at the operation boundary. No other normalization
/// (case, inner whitespace) is applied.
pub fn validate_query(query: &str) -> Result<&str> {
    if query.trim().is_empty() {
        return Err(Error::InvalidQuery("query must be non-empty".to_string()));
    }
    Ok(query)
}

/// Identity key used for deduplication within a category.
///
/// Strips the fragment and a trailing slash so that trivially different
/// spellings of the same URL collapse to one entry. Unparseable input falls
/// back to the trimmed raw string rather than failing; dedup must never
/// reject a result a provider was happy to return.
pub fn canonical_key(raw: &str) -> String {
    if let Ok(mut u) = url::Url::parse(raw.trim()) {
        u.set_fragment(None);
        return u.as_str().trim_end_matches('/').to_string();
    }
    raw.trim().trim_end_matches('/').to_string()
}

/// FNV-1a. Stable across platforms and runs, for anywhere a derived value
/// must be deterministic for a given input.
pub fn stable_hash64(input: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for b in input.as_bytes() {
        hash ^= u64::from(*b);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// News article titles the upstream API substitutes for withdrawn content.
pub const REMOVED_TITLE_SENTINEL: &str = "[Removed]";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebResult {
    pub title: String,
    pub link: String,
    pub snippet: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResult {
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photographer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photographer_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

impl ImageResult {
    pub fn bare(image_url: impl Into<String>) -> Self {
        Self {
            image_url: image_url.into(),
            alt_text: None,
            photographer_name: None,
            photographer_url: None,
            source_platform: None,
            source_url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub url: String,
    pub source: String,
    pub published_at: String,
}

impl NewsArticle {
    /// An article missing any required field, or carrying the upstream
    /// "removed" sentinel title, is discarded before being counted.
    pub fn is_complete(&self) -> bool {
        !self.title.trim().is_empty()
            && self.title != REMOVED_TITLE_SENTINEL
            && !self.url.trim().is_empty()
            && !self.source.trim().is_empty()
            && !self.published_at.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoResult {
    pub title: String,
    pub link: String,
}

/// The engines reachable through the multi-engine meta-search API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    Google,
    Bing,
    DuckDuckGo,
    Yahoo,
}

impl Engine {
    pub fn as_str(&self) -> &'static str {
        match self {
            Engine::Google => "google",
            Engine::Bing => "bing",
            Engine::DuckDuckGo => "duckduckgo",
            Engine::Yahoo => "yahoo",
        }
    }

    pub fn all() -> &'static [Engine] {
        &[Engine::Google, Engine::Bing, Engine::DuckDuckGo, Engine::Yahoo]
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-engine record in the advanced (multi-engine) search response.
///
/// A failed engine carries its message in `error` and empty lists; a
/// successful engine carries `error: None`. Partial success across engines
/// is a valid terminal state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineResultBundle {
    #[serde(default)]
    pub web_results: Vec<WebResult>,
    #[serde(default)]
    pub image_results: Vec<ImageResult>,
    #[serde(default)]
    pub video_results: Vec<VideoResult>,
    #[serde(default)]
    pub related_questions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EngineResultBundle {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Default::default()
        }
    }

    /// True when the engine produced at least one non-error entry in any of
    /// its four result lists.
    pub fn has_results(&self) -> bool {
        self.error.is_none()
            && (!self.web_results.is_empty()
                || !self.image_results.is_empty()
                || !self.video_results.is_empty()
                || !self.related_questions.is_empty())
    }
}

/// Advanced search output: engine name -> bundle. BTreeMap keeps the
/// serialized form deterministic.
pub type AdvancedOutput = BTreeMap<String, EngineResultBundle>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedOutput {
    pub web_results: Vec<WebResult>,
    pub images: Vec<ImageResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsOutput {
    pub articles: Vec<NewsArticle>,
}

#[async_trait::async_trait]
pub trait WebSearchProvider: Send + Sync {
    fn name(&self) -> &'static str;
    /// `limit` is an upper bound passed through to the provider, not a
    /// guarantee.
    async fn search_web(&self, query: &str, limit: usize) -> Result<Vec<WebResult>>;
}

#[async_trait::async_trait]
pub trait ImageProvider: Send + Sync {
    fn name(&self) -> &'static str;
    /// `needed` is the remaining budget for the category, so lower-priority
    /// providers only top up what earlier ones left unfilled.
    async fn search_images(&self, query: &str, needed: usize) -> Result<Vec<ImageResult>>;
}

#[async_trait::async_trait]
pub trait NewsProvider: Send + Sync {
    fn name(&self) -> &'static str;
    async fn fetch_news(&self, query: &str, limit: usize) -> Result<Vec<NewsArticle>>;
}

#[async_trait::async_trait]
pub trait EngineSearchApi: Send + Sync {
    async fn engine_search(&self, query: &str, engine: Engine) -> Result<EngineResultBundle>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_classification_covers_4xx_only() {
        let unauthorized = Error::Http {
            provider: "news".into(),
            status: 401,
        };
        let server = Error::Http {
            provider: "news".into(),
            status: 503,
        };
        assert!(unauthorized.is_fatal());
        assert!(!server.is_fatal());
        assert!(!Error::Network("reset".into()).is_fatal());
        assert!(!Error::Decode("bad json".into()).is_fatal());
        assert!(Error::InvalidQuery("empty".into()).is_fatal());
    }

    #[test]
    fn stable_hash_is_deterministic_and_input_sensitive() {
        assert_eq!(stable_hash64("rust"), stable_hash64("rust"));
        assert_ne!(stable_hash64("rust"), stable_hash64("Rust"));
        // FNV-1a offset basis for the empty string.
        assert_eq!(stable_hash64(""), 0xcbf2_9ce4_8422_2325);
    }

    #[test]
    fn validate_query_rejects_blank() {
        assert!(validate_query("  \t ").is_err());
        assert!(validate_query("rust async").is_ok());
    }

    #[test]
    fn canonical_key_strips_fragment_and_trailing_slash() {
        assert_eq!(
            canonical_key("https://example.com/page/#section"),
            "https://example.com/page"
        );
        assert_eq!(
            canonical_key("https://example.com/page"),
            canonical_key("https://example.com/page/")
        );
    }

    #[test]
    fn canonical_key_tolerates_unparseable_input() {
        assert_eq!(canonical_key("  not a url/ "), "not a url");
    }

    #[test]
    fn web_result_serializes_with_camel_case_contract() {
        let r = WebResult {
            title: "t".into(),
            link: "https://example.com".into(),
            snippet: "s".into(),
        };
        let v = serde_json::to_value(&r).unwrap();
        assert!(v.get("title").is_some());
        assert!(v.get("link").is_some());
        assert!(v.get("snippet").is_some());
    }

    #[test]
    fn image_result_uses_camel_case_and_omits_absent_attribution() {
        let r = ImageResult {
            source_platform: Some("pexels".into()),
            ..ImageResult::bare("https://img.example/1.jpg")
        };
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["imageUrl"], "https://img.example/1.jpg");
        assert_eq!(v["sourcePlatform"], "pexels");
        assert!(v.get("photographerName").is_none());
    }

    #[test]
    fn news_article_completeness_filters_removed_sentinel() {
        let mut a = NewsArticle {
            title: "Budget vote".into(),
            description: None,
            url: "https://news.example/a".into(),
            source: "Example Wire".into(),
            published_at: "2025-03-01T12:00:00Z".into(),
        };
        assert!(a.is_complete());
        a.title = REMOVED_TITLE_SENTINEL.to_string();
        assert!(!a.is_complete());
        a.title = "Budget vote".into();
        a.published_at = String::new();
        assert!(!a.is_complete());
    }

    #[test]
    fn news_article_wire_field_is_published_at_camel_case() {
        let a = NewsArticle {
            title: "t".into(),
            description: Some("d".into()),
            url: "https://news.example/a".into(),
            source: "s".into(),
            published_at: "2025-03-01T12:00:00Z".into(),
        };
        let v = serde_json::to_value(&a).unwrap();
        assert_eq!(v["publishedAt"], "2025-03-01T12:00:00Z");
    }

    #[test]
    fn engine_bundle_has_results_requires_no_error() {
        let mut b = EngineResultBundle::default();
        assert!(!b.has_results());
        b.related_questions.push("why?".into());
        assert!(b.has_results());
        b.error = Some("HTTP 500".into());
        assert!(!b.has_results());
    }

    #[test]
    fn engine_names_are_stable() {
        let names: Vec<&str> = Engine::all().iter().map(|e| e.as_str()).collect();
        assert_eq!(names, vec!["google", "bing", "duckduckgo", "yahoo"]);
    }
}
