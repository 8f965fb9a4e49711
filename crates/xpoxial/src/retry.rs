//! Bounded retry for the news category.
//!
//! News is the one category backed by a single provider, so a transient
//! failure there has no sibling to fall through to. Instead the call is
//! retried a fixed number of times with a fixed delay. A 4xx response will
//! not get better on retry and aborts immediately. When the budget is spent
//! the caller gets deterministic mock articles, never an error.

use std::time::Duration;

use xpoxial_core::{validate_query, NewsOutput, NewsProvider, Result};

use crate::{mock, normalize};

pub const NEWS_ATTEMPTS: u32 = 2;
pub const NEWS_RETRY_DELAY: Duration = Duration::from_secs(1);

pub async fn fetch_news_with_retry(
    provider: &dyn NewsProvider,
    query: &str,
    limit: usize,
) -> Result<NewsOutput> {
    let query = validate_query(query)?;
    for attempt in 1..=NEWS_ATTEMPTS {
        match provider.fetch_news(query, limit).await {
            Ok(articles) => {
                let articles = normalize::clean_articles(articles);
                if !articles.is_empty() {
                    tracing::debug!(
                        target: "retry.news",
                        attempt,
                        count = articles.len(),
                        "news fetch succeeded"
                    );
                    return Ok(NewsOutput { articles });
                }
                tracing::warn!(target: "retry.news", attempt, "no complete articles returned");
            }
            Err(e) if e.is_fatal() => {
                tracing::warn!(
                    target: "retry.news",
                    attempt,
                    error = %e,
                    "fatal news error, aborting retries"
                );
                return Ok(mock_news(query, limit));
            }
            Err(e) => {
                tracing::warn!(target: "retry.news", attempt, error = %e, "transient news error");
            }
        }
        if attempt < NEWS_ATTEMPTS {
            tokio::time::sleep(NEWS_RETRY_DELAY).await;
        }
    }
    tracing::info!(target: "retry.news", "retry budget exhausted, using mock articles");
    Ok(mock_news(query, limit))
}

fn mock_news(query: &str, limit: usize) -> NewsOutput {
    NewsOutput {
        articles: mock::mock_articles(query, limit),
    }
}
