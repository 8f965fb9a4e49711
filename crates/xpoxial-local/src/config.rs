//! Process configuration, read from the environment exactly once.
//!
//! Providers never touch `std::env` themselves: [`XpoxialConfig::from_env`]
//! resolves every credential up front and each client is constructed from the
//! piece of configuration it needs. A credential that is absent, blank, or one
//! of the well-known placeholder strings people leave in `.env` templates is
//! treated as "not configured": the provider is then skipped by the cascade
//! without a network request.

/// Placeholder strings treated the same as an unset variable.
const PLACEHOLDER_SENTINELS: &[&str] = &[
    "your_api_key_here",
    "your-api-key-here",
    "changeme",
    "change_me",
    "placeholder",
    "xxxx",
    "todo",
];

fn env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Read a credential, treating placeholder sentinels as missing.
fn credential(key: &str) -> Option<String> {
    env(key).filter(|v| {
        let lowered = v.to_ascii_lowercase();
        !PLACEHOLDER_SENTINELS.contains(&lowered.as_str())
    })
}

/// Read a credential with an unprefixed fallback variable.
fn credential2(primary: &str, fallback: &str) -> Option<String> {
    credential(primary).or_else(|| credential(fallback))
}

#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub api_key: String,
    pub cse_id: String,
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone)]
pub struct KeyedConfig {
    pub api_key: String,
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub endpoint: Option<String>,
}

/// Everything the aggregation layer needs to know about the outside world.
/// `None` means the provider is unconfigured and must be skipped silently.
#[derive(Debug, Clone, Default)]
pub struct XpoxialConfig {
    pub google: Option<GoogleConfig>,
    pub pexels: Option<KeyedConfig>,
    pub unsplash: Option<KeyedConfig>,
    pub pixabay: Option<KeyedConfig>,
    pub news: Option<KeyedConfig>,
    pub searchapi: Option<KeyedConfig>,
    pub gemini: Option<GeminiConfig>,
    /// DuckDuckGo needs no credential, only optional endpoint overrides.
    pub ddg_html_endpoint: Option<String>,
    pub ddg_images_endpoint: Option<String>,
    /// Per-provider call budget in milliseconds (clamped 1s..60s).
    pub provider_timeout_ms: u64,
}

impl XpoxialConfig {
    pub fn from_env() -> Self {
        let google = match (
            credential2("XPOXIAL_GOOGLE_API_KEY", "GOOGLE_API_KEY"),
            credential2("XPOXIAL_GOOGLE_CSE_ID", "GOOGLE_CSE_ID"),
        ) {
            // Both halves are required; a key without an engine id is as
            // useless as no key at all.
            (Some(api_key), Some(cse_id)) => Some(GoogleConfig {
                api_key,
                cse_id,
                endpoint: env("XPOXIAL_GOOGLE_ENDPOINT"),
            }),
            _ => None,
        };

        let keyed = |primary: &str, fallback: &str, endpoint_var: &str| {
            credential2(primary, fallback).map(|api_key| KeyedConfig {
                api_key,
                endpoint: env(endpoint_var),
            })
        };

        let gemini =
            credential2("XPOXIAL_GEMINI_API_KEY", "GEMINI_API_KEY").map(|api_key| GeminiConfig {
                api_key,
                model: env("XPOXIAL_GEMINI_MODEL")
                    .unwrap_or_else(|| "gemini-2.0-flash".to_string()),
                endpoint: env("XPOXIAL_GEMINI_ENDPOINT"),
            });

        Self {
            google,
            pexels: keyed(
                "XPOXIAL_PEXELS_API_KEY",
                "PEXELS_API_KEY",
                "XPOXIAL_PEXELS_ENDPOINT",
            ),
            unsplash: keyed(
                "XPOXIAL_UNSPLASH_ACCESS_KEY",
                "UNSPLASH_ACCESS_KEY",
                "XPOXIAL_UNSPLASH_ENDPOINT",
            ),
            pixabay: keyed(
                "XPOXIAL_PIXABAY_API_KEY",
                "PIXABAY_API_KEY",
                "XPOXIAL_PIXABAY_ENDPOINT",
            ),
            news: keyed(
                "XPOXIAL_NEWS_API_KEY",
                "NEWS_API_KEY",
                "XPOXIAL_NEWS_ENDPOINT",
            ),
            searchapi: keyed(
                "XPOXIAL_SEARCHAPI_KEY",
                "SEARCHAPI_KEY",
                "XPOXIAL_SEARCHAPI_ENDPOINT",
            ),
            gemini,
            ddg_html_endpoint: env("XPOXIAL_DDG_HTML_ENDPOINT"),
            ddg_images_endpoint: env("XPOXIAL_DDG_IMAGES_ENDPOINT"),
            provider_timeout_ms: crate::clamp_timeout_ms(
                env("XPOXIAL_PROVIDER_TIMEOUT_MS").and_then(|s| s.parse::<u64>().ok()),
            ),
        }
    }

    /// Names of configured providers, for startup diagnostics. No secrets.
    pub fn configured_providers(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.google.is_some() {
            out.push("google");
        }
        if self.pexels.is_some() {
            out.push("pexels");
        }
        if self.unsplash.is_some() {
            out.push("unsplash");
        }
        if self.pixabay.is_some() {
            out.push("pixabay");
        }
        if self.news.is_some() {
            out.push("news");
        }
        if self.searchapi.is_some() {
            out.push("searchapi");
        }
        if self.gemini.is_some() {
            out.push("gemini");
        }
        out
    }
}
