//! Runtime settings: CLI flags layered over an optional YAML file.
//!
//! Precedence is CLI flag, then `config.yaml`, then the built-in default.
//! Both API keys are required; a missing key is a fatal [`ConfigError`].
//!
//! ```yaml
//! output_dir: docs
//! keywords: [AI, robotics]
//! language: en
//! page_size: 20
//! layout: hybrid
//! summary_language: ja
//! locale:
//!   language: ja
//!   region: JP
//! ```

use crate::cli::Cli;
use crate::error::ConfigError;
use crate::llm::claude::DEFAULT_MODEL;
use crate::models::{DEFAULT_LANGUAGE, DEFAULT_REGION};
use crate::outputs::html::Layout;
use crate::sources::Query;
use crate::sources::newsapi::{HeadlineQuery, MAX_PAGE_SIZE, SearchQuery, SortBy};
use serde::Deserialize;
use std::fs;
use tracing::{debug, instrument};

pub const DEFAULT_OUTPUT_DIR: &str = "docs";
pub const DEFAULT_TITLE: &str = "AI News Daily";
pub const DEFAULT_KEYWORD: &str = "AI";
pub const DEFAULT_SEARCH_LANGUAGE: &str = "en";
pub const DEFAULT_COUNTRY: &str = "jp";
pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const DEFAULT_MAX_TOKENS: u32 = 300;

/// Language and region assigned to articles that do not state their own.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Locale {
    pub language: String,
    pub region: String,
}

impl Default for Locale {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            region: DEFAULT_REGION.to_string(),
        }
    }
}

/// Contents of `config.yaml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub output_dir: Option<String>,
    pub json_output_dir: Option<String>,
    pub keywords: Vec<String>,
    pub headlines: Option<bool>,
    pub country: Option<String>,
    pub category: Option<String>,
    pub language: Option<String>,
    pub page_size: Option<u32>,
    pub sort_by: Option<SortBy>,
    pub layout: Option<Layout>,
    pub title: Option<String>,
    pub summary_language: Option<String>,
    pub max_tokens: Option<u32>,
    pub model: Option<String>,
    pub locale: Option<Locale>,
}

impl FileConfig {
    /// Read and parse a YAML config file.
    #[instrument(level = "info")]
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        Self::parse(path, &text)
    }

    fn parse(path: &str, text: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub newsapi_key: String,
    pub claude_api_key: String,
    pub output_dir: String,
    pub json_output_dir: Option<String>,
    pub queries: Vec<Query>,
    pub layout: Layout,
    pub title: String,
    pub summary_language: String,
    pub max_tokens: u32,
    pub model: String,
    pub locale: Locale,
}

impl Settings {
    /// Merge CLI flags with the config file named by `--config`, if any.
    pub fn resolve(cli: &Cli) -> Result<Self, ConfigError> {
        let file = match cli.config.as_deref() {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Self::merge(cli, file)
    }

    /// Merge CLI flags over an already-loaded config file.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingKey`] when either API key is absent or blank
    /// - [`ConfigError::Invalid`] for a page size outside `1..=100` or a zero token limit
    pub fn merge(cli: &Cli, file: FileConfig) -> Result<Self, ConfigError> {
        let newsapi_key = secret(cli.newsapi_key.as_deref()).ok_or(ConfigError::MissingKey("NEWSAPI_KEY"))?;
        let claude_api_key =
            secret(cli.claude_api_key.as_deref()).ok_or(ConfigError::MissingKey("CLAUDE_API_KEY"))?;

        let page_size = cli
            .page_size
            .or(file.page_size)
            .unwrap_or(DEFAULT_PAGE_SIZE);
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::Invalid(format!(
                "page_size must be within 1-{MAX_PAGE_SIZE} (got {page_size})"
            )));
        }

        let max_tokens = cli
            .max_tokens
            .or(file.max_tokens)
            .unwrap_or(DEFAULT_MAX_TOKENS);
        if max_tokens == 0 {
            return Err(ConfigError::Invalid("max_tokens must be positive".into()));
        }

        let headlines = cli.headlines || file.headlines.unwrap_or(false);
        let queries = if headlines {
            vec![Query::Headlines(HeadlineQuery {
                country: cli
                    .country
                    .clone()
                    .or(file.country)
                    .unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
                category: cli.category.clone().or(file.category),
                page_size,
            })]
        } else {
            let keywords = if !cli.keywords.is_empty() {
                cli.keywords.clone()
            } else if !file.keywords.is_empty() {
                file.keywords
            } else {
                vec![DEFAULT_KEYWORD.to_string()]
            };
            let language = cli
                .language
                .clone()
                .or(file.language)
                .unwrap_or_else(|| DEFAULT_SEARCH_LANGUAGE.to_string());
            let sort_by = cli.sort_by.or(file.sort_by).unwrap_or_default();
            keywords
                .into_iter()
                .map(|keyword| {
                    Query::Search(SearchQuery {
                        keyword,
                        language: language.clone(),
                        page_size,
                        sort_by,
                    })
                })
                .collect()
        };

        let settings = Settings {
            newsapi_key,
            claude_api_key,
            output_dir: cli
                .output_dir
                .clone()
                .or(file.output_dir)
                .unwrap_or_else(|| DEFAULT_OUTPUT_DIR.to_string()),
            json_output_dir: cli.json_output_dir.clone().or(file.json_output_dir),
            queries,
            layout: cli.layout.or(file.layout).unwrap_or_default(),
            title: cli
                .title
                .clone()
                .or(file.title)
                .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            summary_language: cli
                .summary_language
                .clone()
                .or(file.summary_language)
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            max_tokens,
            model: cli
                .model
                .clone()
                .or(file.model)
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            locale: file.locale.unwrap_or_default(),
        };
        debug!(
            output_dir = %settings.output_dir,
            queries = settings.queries.len(),
            layout = ?settings.layout,
            "Resolved settings"
        );
        Ok(settings)
    }
}

fn secret(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
