//! # AI News Daily
//!
//! Fetches news from NewsAPI, asks Claude for a short summary of each
//! article, and publishes the result as a static HTML page.
//!
//! ## Usage
//!
//! ```sh
//! NEWSAPI_KEY=... CLAUDE_API_KEY=... ai_news_daily -o ./docs -k "生成AI" -k LLM
//! ```
//!
//! Keys may also come from a `.env` file in the working directory.
//!
//! ## Architecture
//!
//! One run is a straight pipeline:
//! 1. **Fetching**: Run each NewsAPI query in order and normalize the records
//! 2. **Validation**: Drop duplicates and records that fail validation
//! 3. **Summarizing**: Ask Claude for a summary of each article, one at a time
//! 4. **Output**: Write the HTML page, point `index.html` at it, and
//!    optionally write a JSON snapshot

use chrono::{Local, Utc};
use clap::Parser;
use std::error::Error;
use std::path::Path;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod cli;
mod config;
mod error;
mod llm;
mod models;
mod outputs;
mod sources;
mod utils;

use cli::Cli;
use config::Settings;
use llm::{claude::ClaudeClient, Summarizer};
use outputs::html::HtmlRenderer;
use outputs::{index, json};
use sources::newsapi::NewsApiSource;
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // .env first so RUST_LOG and the API keys it carries are visible below
    let _ = dotenvy::dotenv();

    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("ai_news_daily starting up");

    let args = Cli::parse();
    debug!(?args.output_dir, ?args.config, "Parsed CLI arguments");

    let settings = match Settings::resolve(&args) {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };
    info!(
        queries = settings.queries.len(),
        layout = settings.layout.name(),
        model = %settings.model,
        "Configuration resolved"
    );

    // Early check: ensure the HTML output dir is writable
    if let Err(e) = ensure_writable_dir(&settings.output_dir).await {
        error!(
            path = %settings.output_dir,
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    // ---- Fetch and normalize ----
    let source = NewsApiSource::new(settings.newsapi_key.as_str())?;
    let mut articles = sources::collect_articles(&source, &settings.queries, &settings.locale).await?;
    sources::retain_valid(&mut articles, Utc::now());
    if articles.is_empty() {
        warn!("No articles to publish; nothing written");
        return Ok(());
    }
    info!(count = articles.len(), "Total articles to summarize");

    // ---- Summarize ----
    let client = ClaudeClient::new(settings.claude_api_key.as_str(), settings.model.as_str())?;
    let summarizer = Summarizer::new(client);
    let stats = summarizer
        .summarize_articles(&mut articles, settings.max_tokens, &settings.summary_language)
        .await;

    // ---- HTML output ----
    let stem = Local::now().format("news_%Y%m%d").to_string();
    let filename = format!("{stem}.html");
    let renderer = HtmlRenderer::new(&settings.output_dir, settings.layout)?;
    let page = match renderer
        .generate(&articles, &settings.title, Some(&filename))
        .await
    {
        Ok(page) => page,
        Err(e) => {
            error!(error = %e, "Failed to write HTML page");
            return Err(e.into());
        }
    };

    if let Err(e) = index::write_index_redirect(renderer.output_dir(), &filename, &settings.title).await {
        error!(error = %e, "Failed to update index.html");
    }

    // ---- JSON snapshot ----
    if let Some(json_dir) = settings.json_output_dir.as_deref() {
        let edition = json::Edition::now(&articles);
        if let Err(e) = json::write_edition(&edition, Path::new(json_dir), &stem).await {
            error!(error = %e, "Failed to write JSON snapshot");
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        page = %page.display(),
        articles = articles.len(),
        summarized = stats.summarized,
        skipped = stats.skipped,
        failed = stats.failed,
        "Execution complete"
    );

    Ok(())
}
