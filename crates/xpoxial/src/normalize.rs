//! Shape validation of provider contributions and final bundles.
//!
//! Provider payloads are already typed, but typed is not the same as usable: a
//! provider can legally return an entry with a blank identity key, which would
//! poison dedup and render as an empty card. Such entries are dropped here,
//! before the cascade counts anything.

use xpoxial_core::{canonical_key, AggregatedOutput, ImageResult, NewsArticle, WebResult};

use crate::cascade::CascadeCaps;

/// Drop web results missing a usable link or title.
pub fn clean_web(results: Vec<WebResult>) -> Vec<WebResult> {
    results
        .into_iter()
        .filter(|r| !r.link.trim().is_empty() && !r.title.trim().is_empty())
        .collect()
}

/// Drop image results missing a usable image URL.
pub fn clean_images(results: Vec<ImageResult>) -> Vec<ImageResult> {
    results
        .into_iter()
        .filter(|r| !r.image_url.trim().is_empty())
        .collect()
}

/// Drop incomplete articles. Provider clients already filter, but mock data
/// and future providers flow through the same gate.
pub fn clean_articles(articles: Vec<NewsArticle>) -> Vec<NewsArticle> {
    articles.into_iter().filter(|a| a.is_complete()).collect()
}

/// Final invariant check on an aggregated bundle before it is emitted: caps
/// hold and no category contains two entries with the same identity key.
pub fn validate_aggregated(out: &AggregatedOutput, caps: &CascadeCaps) -> anyhow::Result<()> {
    anyhow::ensure!(
        out.web_results.len() <= caps.web_max,
        "web results exceed cap: {} > {}",
        out.web_results.len(),
        caps.web_max
    );
    anyhow::ensure!(
        out.images.len() <= caps.image_max,
        "images exceed cap: {} > {}",
        out.images.len(),
        caps.image_max
    );
    ensure_unique("web", out.web_results.iter().map(|r| canonical_key(&r.link)))?;
    ensure_unique("image", out.images.iter().map(|r| canonical_key(&r.image_url)))?;
    Ok(())
}

fn ensure_unique(category: &str, keys: impl Iterator<Item = String>) -> anyhow::Result<()> {
    let mut seen = std::collections::BTreeSet::new();
    for key in keys {
        anyhow::ensure!(
            seen.insert(key.clone()),
            "duplicate {category} identity key: {key}"
        );
    }
    Ok(())
}
