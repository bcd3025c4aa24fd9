//! Error types for each pipeline stage.
//!
//! Configuration errors are fatal. Article and summarization errors are
//! recovered per record by the caller. Source and render errors abort the
//! invocation.

use thiserror::Error;

/// Errors raised while resolving settings and secrets.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required secret was not supplied by flag or environment.
    #[error("{0} is not set; export it or add it to .env")]
    MissingKey(&'static str),

    /// The config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid YAML for [`crate::config::FileConfig`].
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// A setting is outside its accepted range.
    #[error("invalid setting: {0}")]
    Invalid(String),
}

/// Errors raised when constructing or validating a [`crate::models::UniversalArticle`].
#[derive(Error, Debug)]
pub enum ArticleError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("{field} must be within 0-100 (got {value})")]
    ScoreOutOfRange { field: &'static str, value: i64 },

    #[error("published_at {published_at} is more than an hour in the future")]
    PublishedInFuture { published_at: String },

    #[error("fetched_at {fetched_at} precedes published_at {published_at}")]
    FetchedBeforePublished {
        fetched_at: String,
        published_at: String,
    },

    #[error("malformed article record: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Errors raised by a news source adapter.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("request to news API failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("news API error ({code}): {message}")]
    Api { code: String, message: String },

    #[error("malformed news API response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Errors raised by the summarizer.
#[derive(Error, Debug)]
pub enum SummarizeError {
    #[error("text to summarize is empty")]
    EmptyInput,

    #[error("request to model API failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model API error ({kind}): {message}")]
    Api { kind: String, message: String },

    #[error("model API returned no text content")]
    EmptyResponse,
}

/// Errors raised while rendering or writing output pages.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("article list is empty")]
    NoArticles,

    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize edition: {0}")]
    Json(#[from] serde_json::Error),
}
