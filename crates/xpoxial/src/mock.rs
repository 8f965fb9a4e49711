//! Deterministic mock and placeholder data.
//!
//! When every provider in a category fails or nothing is configured, the
//! response is filled from here instead of surfacing an error. Everything is a
//! pure function of the query so repeated requests produce identical output.

use xpoxial_core::{
    stable_hash64, AdvancedOutput, Engine, EngineResultBundle, ImageResult, NewsArticle, WebResult,
};

/// URL-safe slug of the query, used in mock links.
fn slug(query: &str) -> String {
    let mut out = String::with_capacity(query.len());
    let mut last_dash = true;
    for c in query.trim().to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    if out.is_empty() {
        out.push_str("search");
    }
    out
}

pub fn mock_web_results(query: &str, count: usize) -> Vec<WebResult> {
    let slug = slug(query);
    (1..=count)
        .map(|n| WebResult {
            title: format!("About {query} (result {n})"),
            link: format!("https://example.com/{slug}/{n}"),
            snippet: format!(
                "Overview of {query}, part {n}. Live providers were unavailable for this request."
            ),
        })
        .collect()
}

/// Placeholder images from a public seeded-image service. The seed is derived
/// from the query so the same query always yields the same image set.
pub fn placeholder_images(query: &str, count: usize) -> Vec<ImageResult> {
    let seed = stable_hash64(query);
    (0..count)
        .map(|i| ImageResult {
            image_url: format!("https://picsum.photos/seed/{seed:x}-{i}/640/480"),
            alt_text: Some(format!("Placeholder image for {query}")),
            photographer_name: None,
            photographer_url: None,
            source_platform: Some("placeholder".to_string()),
            source_url: None,
        })
        .collect()
}

pub fn mock_articles(query: &str, count: usize) -> Vec<NewsArticle> {
    let slug = slug(query);
    let h = stable_hash64(query);
    (1..=count)
        .map(|n| {
            // Spread publication dates across a month, derived from the query
            // so idempotence holds for news too.
            let day = (h.wrapping_add(n as u64) % 28) + 1;
            NewsArticle {
                title: format!("Latest on {query}: update {n}"),
                description: Some(format!("Coverage of {query}, story {n}.")),
                url: format!("https://news.example.com/{slug}/{n}"),
                source: "Xpoxial Wire".to_string(),
                published_at: format!("2025-06-{day:02}T00:00:00Z"),
            }
        })
        .collect()
}

/// One mock bundle per engine, substituted only when every engine came back
/// empty or failed.
pub fn mock_engine_bundles(query: &str) -> AdvancedOutput {
    Engine::all()
        .iter()
        .map(|engine| {
            let bundle = EngineResultBundle {
                web_results: mock_web_results(query, 3),
                related_questions: vec![
                    format!("What is {query}?"),
                    format!("How does {query} work?"),
                ],
                ..Default::default()
            };
            (engine.as_str().to_string(), bundle)
        })
        .collect()
}
