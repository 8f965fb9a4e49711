//! Generative-model client for the summarize / answer / rank flows.
//!
//! Every flow sends a structured prompt and expects a structured reply. The
//! reply is validated before use; the rank flow in particular must never make
//! the results worse than it found them, so any malformed or invalid model
//! output (after one retry) falls back to the original ordering.

use serde::{Deserialize, Serialize};
use std::time::Instant;
use xpoxial_core::{Error, Result, WebResult};

use crate::config::GeminiConfig;

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl GeminiClient {
    pub fn new(client: reqwest::Client, cfg: &GeminiConfig) -> Self {
        Self {
            client,
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
            endpoint: cfg
                .endpoint
                .clone()
                .unwrap_or_else(|| "https://generativelanguage.googleapis.com/v1beta".to_string()),
        }
    }

    async fn generate(&self, prompt: String) -> Result<String> {
        let t0 = Instant::now();
        let url = format!(
            "{}/models/{}:generateContent",
            self.endpoint, self.model
        );
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };
        let resp = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Llm(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Llm(format!("gemini generateContent HTTP {status}")));
        }

        let parsed: GenerateResponse =
            resp.json().await.map_err(|e| Error::Llm(e.to_string()))?;
        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| Error::Llm("empty candidates in gemini response".to_string()))?;
        tracing::debug!(
            target: "llm.gemini",
            chars = text.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "generate done"
        );
        Ok(text)
    }

    /// Summarize web results for a query. `context` is opaque request metadata
    /// (locale, device class) passed through to the prompt, never branched on.
    pub async fn summarize(
        &self,
        query: &str,
        results: &[WebResult],
        context: Option<&str>,
    ) -> Result<String> {
        let mut prompt = format!(
            "Summarize the following search results for the query {query:?} \
             in a short, neutral paragraph. Cite nothing outside the results.\n"
        );
        if let Some(ctx) = context {
            prompt.push_str(&format!("Request context (informational only): {ctx}\n"));
        }
        for (i, r) in results.iter().enumerate() {
            prompt.push_str(&format!("{}. {}: {}\n", i + 1, r.title, r.snippet));
        }
        self.generate(prompt).await
    }

    /// Answer a question directly from provided context snippets.
    pub async fn answer(&self, query: &str, snippets: &[String]) -> Result<String> {
        let mut prompt = format!(
            "Answer the question {query:?} using only the context below. \
             If the context is insufficient, say so.\n"
        );
        for s in snippets {
            prompt.push_str(&format!("- {s}\n"));
        }
        self.generate(prompt).await
    }

    /// Re-rank results by relevance to the query.
    ///
    /// The model is asked for a JSON array of zero-based indices. The reply is
    /// only applied when it is a valid permutation of a subset of the input;
    /// on any failure the call is retried once, and after that the original
    /// ordering is returned unchanged.
    pub async fn rank(&self, query: &str, results: Vec<WebResult>) -> Vec<WebResult> {
        if results.len() < 2 {
            return results;
        }
        let mut prompt = format!(
            "Order the following search results from most to least relevant to \
             the query {query:?}. Reply with ONLY a JSON array of zero-based \
             indices, e.g. [2,0,1].\n"
        );
        for (i, r) in results.iter().enumerate() {
            prompt.push_str(&format!("{i}. {}: {}\n", r.title, r.snippet));
        }

        for attempt in 0..2 {
            match self.generate(prompt.clone()).await {
                Ok(text) => {
                    if let Some(order) = parse_ranking(&text, results.len()) {
                        return apply_ranking(results, &order);
                    }
                    tracing::warn!(target: "llm.gemini", attempt, "rank reply failed validation");
                }
                Err(e) => {
                    tracing::warn!(target: "llm.gemini", attempt, error = %e, "rank call failed");
                }
            }
        }
        results
    }
}

/// Parse a ranking reply into a list of indices, tolerating markdown code
/// fences around the JSON. Returns `None` unless every index is in range and
/// no index repeats.
pub(crate) fn parse_ranking(text: &str, len: usize) -> Option<Vec<usize>> {
    let trimmed = text.trim();
    let inner = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();
    let order: Vec<usize> = serde_json::from_str(inner).ok()?;
    if order.is_empty() || order.iter().any(|&i| i >= len) {
        return None;
    }
    let mut seen = vec![false; len];
    for &i in &order {
        if seen[i] {
            return None;
        }
        seen[i] = true;
    }
    Some(order)
}

/// Reorder `results` by `order`; indices the model omitted keep their
/// original relative order at the tail.
pub(crate) fn apply_ranking(results: Vec<WebResult>, order: &[usize]) -> Vec<WebResult> {
    let mut slots: Vec<Option<WebResult>> = results.into_iter().map(Some).collect();
    let mut out = Vec::with_capacity(slots.len());
    for &i in order {
        if let Some(r) = slots[i].take() {
            out.push(r);
        }
    }
    for slot in slots {
        if let Some(r) = slot {
            out.push(r);
        }
    }
    out
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn results(n: usize) -> Vec<WebResult> {
        (0..n)
            .map(|i| WebResult {
                title: format!("title {i}"),
                link: format!("https://example.com/{i}"),
                snippet: format!("snippet {i}"),
            })
            .collect()
    }

    #[test]
    fn parse_ranking_accepts_plain_and_fenced_json() {
        assert_eq!(parse_ranking("[2,0,1]", 3), Some(vec![2, 0, 1]));
        assert_eq!(
            parse_ranking("```json\n[1,0]\n```", 2),
            Some(vec![1, 0])
        );
    }

    #[test]
    fn parse_ranking_rejects_out_of_range_duplicates_and_garbage() {
        assert_eq!(parse_ranking("[0,3]", 3), None);
        assert_eq!(parse_ranking("[0,0]", 3), None);
        assert_eq!(parse_ranking("[]", 3), None);
        assert_eq!(parse_ranking("the best result is #2", 3), None);
    }

    #[test]
    fn apply_ranking_reorders_and_appends_omitted() {
        let out = apply_ranking(results(4), &[2, 0]);
        let links: Vec<&str> = out.iter().map(|r| r.link.as_str()).collect();
        assert_eq!(
            links,
            vec![
                "https://example.com/2",
                "https://example.com/0",
                "https://example.com/1",
                "https://example.com/3"
            ]
        );
    }

    #[test]
    fn parses_generate_response_shape() {
        let js = r#"
        {
          "candidates": [
            {"content": {"parts": [{"text": "a summary"}]}}
          ]
        }
        "#;
        let parsed: GenerateResponse = serde_json::from_str(js).unwrap();
        let text = &parsed.candidates[0].content.as_ref().unwrap().parts[0].text;
        assert_eq!(text, "a summary");
    }

    #[tokio::test]
    async fn answer_returns_the_model_text() {
        use axum::{routing::post, Json, Router};

        let app = Router::new().route(
            "/models/gemini-2.0-flash:generateContent",
            post(|| async {
                Json(serde_json::json!({
                    "candidates": [
                        {"content": {"parts": [{"text": "Rust is a systems language."}]}}
                    ]
                }))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let c = GeminiClient::new(
            reqwest::Client::new(),
            &GeminiConfig {
                api_key: "k".into(),
                model: "gemini-2.0-flash".into(),
                endpoint: Some(format!("http://{addr}")),
            },
        );
        let out = c
            .answer("what is rust?", &["Rust is a language.".to_string()])
            .await
            .unwrap();
        assert_eq!(out, "Rust is a systems language.");
    }

    #[tokio::test]
    async fn answer_surfaces_upstream_failures_as_llm_errors() {
        use axum::{routing::post, Router};

        let app = Router::new().route(
            "/models/gemini-2.0-flash:generateContent",
            post(|| async { axum::http::StatusCode::INTERNAL_SERVER_ERROR }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let c = GeminiClient::new(
            reqwest::Client::new(),
            &GeminiConfig {
                api_key: "k".into(),
                model: "gemini-2.0-flash".into(),
                endpoint: Some(format!("http://{addr}")),
            },
        );
        let err = c.answer("q", &[]).await.unwrap_err();
        assert!(matches!(err, Error::Llm(_)));
    }

    #[tokio::test]
    async fn rank_retries_once_then_returns_original_order() {
        use axum::{routing::post, Json, Router};

        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = calls.clone();
        let app = Router::new().route(
            "/models/gemini-2.0-flash:generateContent",
            post(move || {
                let calls = calls2.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Json(serde_json::json!({
                        "candidates": [
                            {"content": {"parts": [{"text": "not json at all"}]}}
                        ]
                    }))
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let c = GeminiClient::new(
            reqwest::Client::new(),
            &GeminiConfig {
                api_key: "k".into(),
                model: "gemini-2.0-flash".into(),
                endpoint: Some(format!("http://{addr}")),
            },
        );
        let input = results(3);
        let out = c.rank("q", input.clone()).await;
        assert_eq!(out, input, "order must be unchanged on validation failure");
        assert_eq!(calls.load(Ordering::SeqCst), 2, "exactly one retry");
    }

    #[tokio::test]
    async fn rank_applies_a_valid_model_ordering() {
        use axum::{routing::post, Json, Router};

        let app = Router::new().route(
            "/models/gemini-2.0-flash:generateContent",
            post(|| async {
                Json(serde_json::json!({
                    "candidates": [
                        {"content": {"parts": [{"text": "```json\n[2,1,0]\n```"}]}}
                    ]
                }))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let c = GeminiClient::new(
            reqwest::Client::new(),
            &GeminiConfig {
                api_key: "k".into(),
                model: "gemini-2.0-flash".into(),
                endpoint: Some(format!("http://{addr}")),
            },
        );
        let out = c.rank("q", results(3)).await;
        assert_eq!(out[0].link, "https://example.com/2");
        assert_eq!(out[2].link, "https://example.com/0");
    }
}
