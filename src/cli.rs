//! Command-line interface definitions for AI News Daily.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Secrets can be provided via flags, environment variables, or a `.env` file;
//! everything else can also come from a YAML config file (see [`crate::config`]).

use crate::outputs::html::Layout;
use crate::sources::newsapi::SortBy;
use clap::Parser;

/// Command-line arguments for the AI News Daily application.
///
/// Flags left unset fall back to the config file, then to built-in defaults.
///
/// # Examples
///
/// ```sh
/// # Keyword search rendered into ./docs
/// ai_news_daily -o ./docs -k AI -k "machine learning"
///
/// # Japanese top headlines in the classic layout
/// ai_news_daily --headlines --country jp --category technology --layout classic
///
/// # Settings from a file, plus a JSON snapshot
/// ai_news_daily -c config.yaml -j ./json
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Output directory for the HTML pages
    #[arg(short, long)]
    pub output_dir: Option<String>,

    /// Output directory for the JSON snapshot (skipped when unset)
    #[arg(short, long)]
    pub json_output_dir: Option<String>,

    /// Optional path to config.yaml file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Search keyword; repeat for several searches
    #[arg(short, long = "keyword")]
    pub keywords: Vec<String>,

    /// Fetch top headlines instead of searching by keyword
    #[arg(long)]
    pub headlines: bool,

    /// Country code for --headlines
    #[arg(long)]
    pub country: Option<String>,

    /// Category for --headlines (business, technology, science, ...)
    #[arg(long)]
    pub category: Option<String>,

    /// Language filter for keyword searches
    #[arg(short, long)]
    pub language: Option<String>,

    /// Number of articles per request (1-100)
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Result ordering for keyword searches
    #[arg(long, value_enum)]
    pub sort_by: Option<SortBy>,

    /// Page layout
    #[arg(long, value_enum)]
    pub layout: Option<Layout>,

    /// Page title shown in the masthead
    #[arg(short, long)]
    pub title: Option<String>,

    /// Language the summaries are written in ("ja" or "en")
    #[arg(long)]
    pub summary_language: Option<String>,

    /// Token limit for each summary
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Claude model used for summaries
    #[arg(long)]
    pub model: Option<String>,

    /// NewsAPI key
    #[arg(long, env = "NEWSAPI_KEY", hide_env_values = true)]
    pub newsapi_key: Option<String>,

    /// Anthropic API key used for summaries
    #[arg(long, env = "CLAUDE_API_KEY", hide_env_values = true)]
    pub claude_api_key: Option<String>,
}
