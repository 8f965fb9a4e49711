//! The aggregation cascade.
//!
//! Providers in a category are tried strictly in priority order; the two
//! categories (web, images) run concurrently. Results are merged with
//! first-wins dedup on the canonical identity key and the merge stops at the
//! category cap. A provider failure is logged and treated as an empty
//! contribution. If a category ends empty it is filled with deterministic
//! mock data, so callers always receive a complete bundle.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use xpoxial_core::{
    canonical_key, validate_query, AggregatedOutput, Error, ImageProvider, ImageResult, Result,
    WebResult, WebSearchProvider,
};

use crate::{mock, normalize};

/// Per-category result caps. Configuration data, not cascade logic.
#[derive(Debug, Clone)]
pub struct CascadeCaps {
    pub web_max: usize,
    pub image_max: usize,
    pub news_max: usize,
}

impl Default for CascadeCaps {
    fn default() -> Self {
        Self {
            web_max: 10,
            image_max: 6,
            news_max: 10,
        }
    }
}

impl CascadeCaps {
    /// Variant for image-heavy views.
    pub fn wide() -> Self {
        Self {
            image_max: 20,
            ..Self::default()
        }
    }
}

pub struct Cascade {
    web: Vec<Arc<dyn WebSearchProvider>>,
    images: Vec<Arc<dyn ImageProvider>>,
    caps: CascadeCaps,
    provider_timeout: Duration,
}

impl Cascade {
    pub fn new(
        web: Vec<Arc<dyn WebSearchProvider>>,
        images: Vec<Arc<dyn ImageProvider>>,
        caps: CascadeCaps,
        provider_timeout_ms: u64,
    ) -> Self {
        Self {
            web,
            images,
            caps,
            provider_timeout: Duration::from_millis(xpoxial_local::clamp_timeout_ms(Some(
                provider_timeout_ms,
            ))),
        }
    }

    pub async fn aggregate(&self, query: &str) -> Result<AggregatedOutput> {
        let query = validate_query(query)?;
        let (web_results, images) = tokio::join!(self.collect_web(query), self.collect_images(query));
        let mut out = AggregatedOutput {
            web_results,
            images,
        };
        if out.web_results.is_empty() {
            tracing::info!(target: "cascade", category = "web", "no live results, using mock data");
            out.web_results = mock::mock_web_results(query, self.caps.web_max);
        }
        if out.images.is_empty() {
            tracing::info!(target: "cascade", category = "images", "no live results, using placeholders");
            out.images = mock::placeholder_images(query, self.caps.image_max);
        }
        Ok(out)
    }

    async fn collect_web(&self, query: &str) -> Vec<WebResult> {
        let mut seen = BTreeSet::new();
        let mut out: Vec<WebResult> = Vec::new();
        for provider in &self.web {
            if out.len() >= self.caps.web_max {
                break;
            }
            let remaining = self.caps.web_max - out.len();
            let fetched = match self
                .guarded(provider.name(), provider.search_web(query, remaining))
                .await
            {
                Ok(items) => normalize::clean_web(items),
                Err(e) => {
                    log_provider_failure("web", provider.name(), &e);
                    continue;
                }
            };
            let before = out.len();
            for r in fetched {
                if out.len() >= self.caps.web_max {
                    break;
                }
                // First provider to claim a key wins.
                if seen.insert(canonical_key(&r.link)) {
                    out.push(r);
                }
            }
            tracing::debug!(
                target: "cascade",
                provider = provider.name(),
                added = out.len() - before,
                total = out.len(),
                "web contribution merged"
            );
        }
        out
    }

    async fn collect_images(&self, query: &str) -> Vec<ImageResult> {
        let mut seen = BTreeSet::new();
        let mut out: Vec<ImageResult> = Vec::new();
        for provider in &self.images {
            if out.len() >= self.caps.image_max {
                break;
            }
            let needed = self.caps.image_max - out.len();
            let fetched = match self
                .guarded(provider.name(), provider.search_images(query, needed))
                .await
            {
                Ok(items) => normalize::clean_images(items),
                Err(e) => {
                    log_provider_failure("images", provider.name(), &e);
                    continue;
                }
            };
            let before = out.len();
            for r in fetched {
                if out.len() >= self.caps.image_max {
                    break;
                }
                if seen.insert(canonical_key(&r.image_url)) {
                    out.push(r);
                }
            }
            tracing::debug!(
                target: "cascade",
                provider = provider.name(),
                added = out.len() - before,
                total = out.len(),
                "image contribution merged"
            );
        }
        out
    }

    /// Wrap a provider call in the per-provider time budget. A timeout is a
    /// transient failure like any other; the cascade moves to the next
    /// provider.
    async fn guarded<T>(
        &self,
        provider: &'static str,
        call: impl Future<Output = Result<Vec<T>>>,
    ) -> Result<Vec<T>> {
        match tokio::time::timeout(self.provider_timeout, call).await {
            Ok(res) => res,
            Err(_) => Err(Error::Network(format!(
                "{provider} timed out after {}ms",
                self.provider_timeout.as_millis()
            ))),
        }
    }
}

fn log_provider_failure(category: &str, provider: &str, e: &Error) {
    match e {
        // Unconfigured providers usually aren't constructed at all; a client
        // reporting it at call time is skipped without noise.
        Error::NotConfigured(_) => {
            tracing::debug!(target: "cascade", category, provider, "skipped: not configured");
        }
        _ => {
            tracing::warn!(target: "cascade", category, provider, error = %e, "provider failed");
        }
    }
}
