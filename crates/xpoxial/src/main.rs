use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use xpoxial_core::{AggregatedOutput, ImageProvider, NewsOutput, WebSearchProvider};
use xpoxial_local::config::XpoxialConfig;
use xpoxial_local::duckduckgo::DuckDuckGoProvider;
use xpoxial_local::gemini::GeminiClient;
use xpoxial_local::google::GoogleSearchProvider;
use xpoxial_local::metasearch::MetaSearchClient;
use xpoxial_local::news::NewsApiProvider;
use xpoxial_local::pexels::PexelsProvider;
use xpoxial_local::pixabay::PixabayProvider;
use xpoxial_local::unsplash::UnsplashProvider;

mod advanced;
mod cascade;
mod mock;
mod normalize;
mod retry;

use cascade::{Cascade, CascadeCaps};

#[derive(Parser, Debug)]
#[command(name = "xpoxial")]
#[command(about = "Multi-provider search aggregation (web, images, news, multi-engine)", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). Logs go to
    /// stderr; stdout carries only the JSON result.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Aggregate web and image results across configured providers (json).
    Search(SearchCmd),
    /// Fetch news articles with bounded retry (json).
    News(NewsCmd),
    /// Query all meta-search engines in parallel (json).
    Advanced(AdvancedCmd),
    /// Aggregate web results and summarize them with the generative model (json).
    Summarize(SummarizeCmd),
}

#[derive(clap::Args, Debug)]
struct SearchCmd {
    /// Query string.
    query: String,
    /// Raise the image cap from 6 to 20 for image-heavy views.
    #[arg(long, default_value_t = false)]
    wide_images: bool,
}

#[derive(clap::Args, Debug)]
struct NewsCmd {
    /// Query string.
    query: String,
    /// Maximum number of articles.
    #[arg(long, default_value_t = 10)]
    limit: usize,
}

#[derive(clap::Args, Debug)]
struct AdvancedCmd {
    /// Query string.
    query: String,
}

#[derive(clap::Args, Debug)]
struct SummarizeCmd {
    /// Query string.
    query: String,
    /// Opaque request context forwarded to the model prompt (locale, device
    /// class). Never branched on.
    #[arg(long)]
    context: Option<String>,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct SummarizeOutput {
    summary: Option<String>,
    #[serde(flatten)]
    results: AggregatedOutput,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Web providers in priority order. DuckDuckGo is keyless and always present
/// as the scraping fallback.
fn web_providers(config: &XpoxialConfig, client: &reqwest::Client) -> Vec<Arc<dyn WebSearchProvider>> {
    let mut providers: Vec<Arc<dyn WebSearchProvider>> = Vec::new();
    if let Some(google) = &config.google {
        providers.push(Arc::new(GoogleSearchProvider::new(client.clone(), google)));
    }
    providers.push(Arc::new(DuckDuckGoProvider::with_endpoints(
        client.clone(),
        config.ddg_html_endpoint.clone(),
        config.ddg_images_endpoint.clone(),
    )));
    providers
}

/// Image providers in priority order: google-images, then the dedicated image
/// APIs, then the DuckDuckGo scrape as last resort.
fn image_providers(config: &XpoxialConfig, client: &reqwest::Client) -> Vec<Arc<dyn ImageProvider>> {
    let mut providers: Vec<Arc<dyn ImageProvider>> = Vec::new();
    if let Some(google) = &config.google {
        providers.push(Arc::new(GoogleSearchProvider::new(client.clone(), google)));
    }
    if let Some(pexels) = &config.pexels {
        providers.push(Arc::new(PexelsProvider::new(client.clone(), pexels)));
    }
    if let Some(unsplash) = &config.unsplash {
        providers.push(Arc::new(UnsplashProvider::new(client.clone(), unsplash)));
    }
    if let Some(pixabay) = &config.pixabay {
        providers.push(Arc::new(PixabayProvider::new(client.clone(), pixabay)));
    }
    providers.push(Arc::new(DuckDuckGoProvider::with_endpoints(
        client.clone(),
        config.ddg_html_endpoint.clone(),
        config.ddg_images_endpoint.clone(),
    )));
    providers
}

fn build_cascade(config: &XpoxialConfig, client: &reqwest::Client, caps: CascadeCaps) -> Cascade {
    Cascade::new(
        web_providers(config, client),
        image_providers(config, client),
        caps,
        config.provider_timeout_ms,
    )
}

fn emit<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = XpoxialConfig::from_env();
    tracing::info!(providers = ?config.configured_providers(), "configuration loaded");
    let client = xpoxial_local::default_http_client()?;

    match cli.command {
        Commands::Search(args) => {
            let caps = if args.wide_images {
                CascadeCaps::wide()
            } else {
                CascadeCaps::default()
            };
            let out = build_cascade(&config, &client, caps.clone())
                .aggregate(&args.query)
                .await?;
            normalize::validate_aggregated(&out, &caps)?;
            emit(&out)?;
        }
        Commands::News(args) => {
            let caps = CascadeCaps::default();
            let limit = args.limit.min(caps.news_max).max(1);
            let out = match &config.news {
                Some(news) => {
                    let provider = NewsApiProvider::new(client.clone(), news);
                    retry::fetch_news_with_retry(&provider, &args.query, limit).await?
                }
                None => {
                    tracing::info!("news provider not configured, using mock articles");
                    xpoxial_core::validate_query(&args.query)?;
                    NewsOutput {
                        articles: mock::mock_articles(&args.query, limit),
                    }
                }
            };
            emit(&out)?;
        }
        Commands::Advanced(args) => {
            let out = match &config.searchapi {
                Some(searchapi) => {
                    let api = MetaSearchClient::new(client.clone(), searchapi);
                    advanced::advanced_search(&api, &args.query).await?
                }
                None => {
                    tracing::info!("meta-search not configured, using mock bundles");
                    xpoxial_core::validate_query(&args.query)?;
                    mock::mock_engine_bundles(&args.query)
                }
            };
            emit(&out)?;
        }
        Commands::Summarize(args) => {
            let caps = CascadeCaps::default();
            let results = build_cascade(&config, &client, caps.clone())
                .aggregate(&args.query)
                .await?;
            normalize::validate_aggregated(&results, &caps)?;
            let summary = match &config.gemini {
                Some(gemini) => {
                    let llm = GeminiClient::new(client.clone(), gemini);
                    match llm
                        .summarize(&args.query, &results.web_results, args.context.as_deref())
                        .await
                    {
                        Ok(text) => Some(text),
                        Err(e) => {
                            tracing::warn!(error = %e, "summary unavailable");
                            eprintln!("summary unavailable: {e}");
                            None
                        }
                    }
                }
                None => {
                    eprintln!("summary unavailable: no generative model configured");
                    None
                }
            };
            emit(&SummarizeOutput { summary, results })?;
        }
    }
    Ok(())
}
