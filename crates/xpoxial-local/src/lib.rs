use std::time::Duration;
use xpoxial_core::{Error, Result};

pub mod config;
pub mod duckduckgo;
pub mod gemini;
pub mod google;
pub mod metasearch;
pub mod news;
pub mod pexels;
pub mod pixabay;
pub mod unsplash;

/// Build the shared HTTP client every provider reuses.
///
/// Safety defaults: avoid "hang forever" on DNS/TLS/body stalls. Individual
/// provider calls still apply their own per-request timeout on top.
pub fn default_http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent("xpoxial-local/0.1")
        .redirect(reqwest::redirect::Policy::limited(10))
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| Error::Network(e.to_string()))
}

/// Clamp a per-request timeout. Provider requests can hang indefinitely
/// without an explicit cap, so keep a conservative bound even if callers pass
/// something huge.
pub fn clamp_timeout_ms(requested: Option<u64>) -> u64 {
    requested.unwrap_or(20_000).clamp(1_000, 60_000)
}

/// Map a reqwest failure into the core taxonomy: HTTP statuses stay typed so
/// the retry policy can distinguish fatal 4xx from transient failures.
pub(crate) fn status_error(provider: &str, status: reqwest::StatusCode) -> Error {
    Error::Http {
        provider: provider.to_string(),
        status: status.as_u16(),
    }
}
