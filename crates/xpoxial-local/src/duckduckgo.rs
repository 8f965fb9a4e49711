//! Scraping-based fallback search engine.
//!
//! Last in both the web and image priority orders, and the only provider that
//! needs no credential: the HTML-only endpoint at
//! `https://html.duckduckgo.com/html/` works without JavaScript, and the image
//! endpoint needs only a `vqd` request token scraped from the landing page.
//! Being scraped HTML, it is also the most brittle source, so parsing is
//! split into standalone functions and the selectors are pinned with
//! fixtures.

use html_scraper::{Html, Selector};
use xpoxial_core::{Error, ImageProvider, ImageResult, Result, WebResult, WebSearchProvider};

#[derive(Debug, Clone)]
pub struct DuckDuckGoProvider {
    client: reqwest::Client,
    html_endpoint: String,
    images_endpoint: String,
}

impl DuckDuckGoProvider {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            html_endpoint: "https://html.duckduckgo.com/html/".to_string(),
            images_endpoint: "https://duckduckgo.com".to_string(),
        }
    }

    /// Endpoint overrides, for tests and the `XPOXIAL_DDG_*_ENDPOINT` vars.
    pub fn with_endpoints(
        client: reqwest::Client,
        html_endpoint: Option<String>,
        images_endpoint: Option<String>,
    ) -> Self {
        let mut p = Self::new(client);
        if let Some(e) = html_endpoint {
            p.html_endpoint = e;
        }
        if let Some(e) = images_endpoint {
            p.images_endpoint = e;
        }
        p
    }

    /// Fetch the `vqd` request token the image endpoint requires.
    async fn fetch_vqd(&self, query: &str) -> Result<String> {
        let resp = self
            .client
            .get(&self.images_endpoint)
            .query(&[("q", query), ("iax", "images"), ("ia", "images")])
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(crate::status_error("duckduckgo", status));
        }
        let body = resp.text().await.map_err(|e| Error::Network(e.to_string()))?;
        extract_vqd(&body)
            .ok_or_else(|| Error::Decode("vqd token not found in landing page".to_string()))
    }
}

#[async_trait::async_trait]
impl WebSearchProvider for DuckDuckGoProvider {
    fn name(&self) -> &'static str {
        "duckduckgo"
    }

    async fn search_web(&self, query: &str, limit: usize) -> Result<Vec<WebResult>> {
        let resp = self
            .client
            .post(&self.html_endpoint)
            .form(&[("q", query)])
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(crate::status_error("duckduckgo", status));
        }
        let html = resp.text().await.map_err(|e| Error::Network(e.to_string()))?;
        tracing::trace!(target: "provider.duckduckgo", bytes = html.len(), "html response received");
        Ok(parse_result_html(&html, limit))
    }
}

#[async_trait::async_trait]
impl ImageProvider for DuckDuckGoProvider {
    fn name(&self) -> &'static str {
        "duckduckgo-images"
    }

    async fn search_images(&self, query: &str, needed: usize) -> Result<Vec<ImageResult>> {
        let vqd = self.fetch_vqd(query).await?;
        let resp = self
            .client
            .get(format!("{}/i.js", self.images_endpoint))
            .query(&[("q", query), ("o", "json"), ("vqd", vqd.as_str())])
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(crate::status_error("duckduckgo", status));
        }
        let parsed: ImagesResponse =
            resp.json().await.map_err(|e| Error::Decode(e.to_string()))?;
        Ok(parsed
            .results
            .into_iter()
            .filter_map(|r| {
                let image_url = r.image?;
                Some(ImageResult {
                    image_url,
                    alt_text: r.title,
                    photographer_name: None,
                    photographer_url: None,
                    source_platform: Some("duckduckgo".to_string()),
                    source_url: r.url,
                })
            })
            .take(needed)
            .collect())
    }
}

#[derive(Debug, serde::Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    results: Vec<ImageHit>,
}

#[derive(Debug, serde::Deserialize)]
struct ImageHit {
    image: Option<String>,
    title: Option<String>,
    url: Option<String>,
}

/// Pull the `vqd` token out of the image-search landing page.
///
/// The token appears as `vqd="4-..."` or `vqd='4-...'` or `vqd=4-...&` in an
/// inline script. A plain scan beats a full HTML parse here: the surrounding
/// markup changes often, the token format does not.
pub(crate) fn extract_vqd(body: &str) -> Option<String> {
    let start = body.find("vqd=")? + "vqd=".len();
    let rest = &body[start..];
    let (rest, terminator) = match rest.as_bytes().first()? {
        b'"' => (&rest[1..], Some('"')),
        b'\'' => (&rest[1..], Some('\'')),
        _ => (rest, None),
    };
    let end = match terminator {
        Some(t) => rest.find(t)?,
        None => rest
            .find(|c: char| c == '&' || c == ';' || c.is_whitespace())
            .unwrap_or(rest.len()),
    };
    let token = &rest[..end];
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Unwrap DuckDuckGo's redirect links (`//duckduckgo.com/l/?uddg=<encoded>`),
/// returning the target URL.
pub(crate) fn extract_target_url(href: &str) -> Option<String> {
    let full_href = if href.starts_with("//") {
        format!("https:{href}")
    } else {
        href.to_string()
    };
    let parsed = url::Url::parse(&full_href).ok()?;
    if parsed.host_str() == Some("duckduckgo.com") && parsed.path().starts_with("/l/") {
        parsed
            .query_pairs()
            .find(|(key, _)| key == "uddg")
            .map(|(_, value)| value.into_owned())
    } else {
        Some(full_href)
    }
}

/// Parse the HTML-only results page. Ads carry the `result--ad` class and are
/// excluded; entries without a title, href, or decodable target are skipped.
pub(crate) fn parse_result_html(html: &str, limit: usize) -> Vec<WebResult> {
    let document = Html::parse_document(html);
    // Both the legacy and current result containers, minus ads.
    let result_sel = Selector::parse(".result:not(.result--ad), .web-result:not(.result--ad)")
        .expect("static selector");
    let title_sel = Selector::parse(".result__a").expect("static selector");
    let snippet_sel = Selector::parse(".result__snippet").expect("static selector");

    let mut out = Vec::new();
    for element in document.select(&result_sel) {
        if out.len() >= limit {
            break;
        }
        let Some(title_el) = element.select(&title_sel).next() else {
            continue;
        };
        let title = title_el.text().collect::<String>().trim().to_string();
        if title.is_empty() {
            continue;
        }
        let Some(href) = title_el.value().attr("href") else {
            continue;
        };
        let Some(link) = extract_target_url(href) else {
            continue;
        };
        let snippet = element
            .select(&snippet_sel)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .unwrap_or_default();
        out.push(WebResult { title, link, snippet });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
      <html><body>
        <div class="result">
          <a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com%2Fdocs&amp;rut=abc">Example Docs</a>
          <div class="result__snippet">All about examples.</div>
        </div>
        <div class="result result--ad">
          <a class="result__a" href="https://ads.example/buy">Buy now</a>
        </div>
        <div class="result">
          <a class="result__a" href="https://plain.example/page">Plain Link</a>
        </div>
      </body></html>
    "#;

    #[test]
    fn parses_results_and_skips_ads() {
        let results = parse_result_html(FIXTURE, 10);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Example Docs");
        assert_eq!(results[0].link, "https://example.com/docs");
        assert_eq!(results[0].snippet, "All about examples.");
        assert_eq!(results[1].link, "https://plain.example/page");
    }

    #[test]
    fn limit_caps_parsed_results() {
        let results = parse_result_html(FIXTURE, 1);
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn redirect_unwrapping_decodes_uddg() {
        assert_eq!(
            extract_target_url("//duckduckgo.com/l/?uddg=https%3A%2F%2Fa.example%2Fx&rut=1"),
            Some("https://a.example/x".to_string())
        );
        assert_eq!(
            extract_target_url("https://direct.example/"),
            Some("https://direct.example/".to_string())
        );
        assert_eq!(extract_target_url("not a url"), None);
    }

    #[test]
    fn vqd_extraction_handles_quote_styles() {
        assert_eq!(
            extract_vqd(r#"init("/d.js", {vqd="4-12345"});"#).as_deref(),
            Some("4-12345")
        );
        assert_eq!(
            extract_vqd("href=\"/i.js?q=x&vqd=4-67890&o=json\"").as_deref(),
            Some("4-67890")
        );
        assert_eq!(extract_vqd("no token here"), None);
        assert_eq!(extract_vqd("vqd=\"\""), None);
    }

    #[test]
    fn empty_page_yields_no_results() {
        assert!(parse_result_html("<html></html>", 10).is_empty());
    }

    #[tokio::test]
    async fn image_search_runs_token_then_query_roundtrip() {
        use axum::{routing::get, routing::post, Json, Router};

        let app = Router::new()
            .route(
                "/",
                get(|| async { "<script>load(\"/i.js\", {vqd=\"4-token\"});</script>" }),
            )
            .route(
                "/i.js",
                get(|q: axum::extract::Query<std::collections::HashMap<String, String>>| async move {
                    assert_eq!(q.get("vqd").map(String::as_str), Some("4-token"));
                    Json(serde_json::json!({
                        "results": [
                            {"image":"https://img.example/a.jpg","title":"A","url":"https://pages.example/a"},
                            {"title":"no image field"}
                        ]
                    }))
                }),
            )
            .route("/html/", post(|| async { "" }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let p = DuckDuckGoProvider::with_endpoints(
            reqwest::Client::new(),
            Some(format!("http://{addr}/html/")),
            Some(format!("http://{addr}")),
        );
        let out = p.search_images("sunset", 5).await.unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].image_url, "https://img.example/a.jpg");
        assert_eq!(out[0].source_platform.as_deref(), Some("duckduckgo"));
    }
}
