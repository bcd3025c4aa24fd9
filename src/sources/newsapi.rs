//! [NewsAPI](https://newsapi.org) source adapter.
//!
//! Two endpoints are supported:
//! - `/v2/everything`: keyword search via [`NewsApiSource::fetch_articles`]
//! - `/v2/top-headlines`: per-country headlines via [`NewsApiSource::fetch_top_headlines`]
//!
//! Raw records are mapped onto [`UniversalArticle`] by [`NewsApiSource::normalize`].

use crate::config::Locale;
use crate::error::{ArticleError, SourceError};
use crate::models::{SourceType, UniversalArticle};
use crate::utils::{clean_text, detect_language};
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// Base URL of the NewsAPI v2 endpoints.
pub const NEWSAPI_BASE_URL: &str = "https://newsapi.org/v2";
/// Request timeout for NewsAPI calls.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Largest page NewsAPI will return.
pub const MAX_PAGE_SIZE: u32 = 100;

const UNTITLED: &str = "Untitled";
const UNKNOWN_SOURCE: &str = "Unknown";

/// Result ordering for keyword searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
pub enum SortBy {
    #[default]
    #[serde(rename = "publishedAt")]
    #[value(name = "publishedAt")]
    PublishedAt,
    #[serde(rename = "relevancy")]
    Relevancy,
    #[serde(rename = "popularity")]
    Popularity,
}

impl SortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::PublishedAt => "publishedAt",
            SortBy::Relevancy => "relevancy",
            SortBy::Popularity => "popularity",
        }
    }
}

/// Parameters for a `/v2/everything` request.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub keyword: String,
    pub language: String,
    pub page_size: u32,
    pub sort_by: SortBy,
}

/// Parameters for a `/v2/top-headlines` request.
#[derive(Debug, Clone)]
pub struct HeadlineQuery {
    pub country: String,
    pub category: Option<String>,
    pub page_size: u32,
}

/// Envelope returned by every NewsAPI endpoint.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub status: String,
    #[serde(default)]
    pub articles: Vec<Value>,
    #[serde(rename = "totalResults", default)]
    pub total_results: u64,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl SearchResponse {
    /// Unwrap the article list, turning a non-`ok` status into [`SourceError::Api`].
    pub fn into_articles(self) -> Result<Vec<Value>, SourceError> {
        if self.status != "ok" {
            return Err(SourceError::Api {
                code: self.code.unwrap_or_else(|| self.status.clone()),
                message: self.message.unwrap_or_else(|| "unknown error".to_string()),
            });
        }
        Ok(self.articles)
    }
}

/// Client for the NewsAPI endpoints.
#[derive(Debug, Clone)]
pub struct NewsApiSource {
    http: Client,
    api_key: String,
}

impl NewsApiSource {
    pub fn new(api_key: impl Into<String>) -> Result<Self, SourceError> {
        let http = Client::builder()
            .user_agent(concat!("ai_news_daily/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            api_key: api_key.into(),
        })
    }

    /// Search all articles matching a keyword.
    ///
    /// # Errors
    ///
    /// - [`SourceError::InvalidQuery`] for a blank keyword or a page size outside `1..=100`;
    ///   no request is made
    /// - [`SourceError::Http`] on timeout, connection failure, or undecodable body
    /// - [`SourceError::Api`] when NewsAPI answers with a non-`ok` status
    #[instrument(level = "info", skip_all, fields(keyword = %query.keyword, language = %query.language))]
    pub async fn fetch_articles(&self, query: &SearchQuery) -> Result<Vec<Value>, SourceError> {
        if query.keyword.trim().is_empty() {
            return Err(SourceError::InvalidQuery("keyword must not be empty".into()));
        }
        check_page_size(query.page_size)?;

        let url = format!(
            "{NEWSAPI_BASE_URL}/everything?q={}&language={}&pageSize={}&sortBy={}",
            urlencoding::encode(query.keyword.trim()),
            urlencoding::encode(&query.language),
            query.page_size,
            query.sort_by.as_str()
        );
        info!("Requesting NewsAPI search");
        let articles = self.request(&url).await?;
        info!(count = articles.len(), "Fetched NewsAPI search results");
        Ok(articles)
    }

    /// Fetch the current top headlines for a country.
    ///
    /// # Errors
    ///
    /// Same as [`Self::fetch_articles`]; a blank country is an invalid query.
    #[instrument(level = "info", skip_all, fields(country = %query.country, category = ?query.category))]
    pub async fn fetch_top_headlines(
        &self,
        query: &HeadlineQuery,
    ) -> Result<Vec<Value>, SourceError> {
        if query.country.trim().is_empty() {
            return Err(SourceError::InvalidQuery("country must not be empty".into()));
        }
        check_page_size(query.page_size)?;

        let mut url = format!(
            "{NEWSAPI_BASE_URL}/top-headlines?country={}&pageSize={}",
            urlencoding::encode(query.country.trim()),
            query.page_size
        );
        if let Some(category) = query.category.as_deref() {
            url.push_str("&category=");
            url.push_str(&urlencoding::encode(category));
        }
        info!("Requesting NewsAPI top headlines");
        let articles = self.request(&url).await?;
        info!(count = articles.len(), "Fetched NewsAPI top headlines");
        Ok(articles)
    }

    async fn request(&self, url: &str) -> Result<Vec<Value>, SourceError> {
        let response = self
            .http
            .get(url)
            .header("X-Api-Key", &self.api_key)
            .send()
            .await
            .inspect_err(|e| error!(error = %e, "NewsAPI request failed"))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .inspect_err(|e| error!(%status, error = %e, "Failed to read NewsAPI response"))?;
        parse_response(status, &body)
            .inspect_err(|e| error!(%status, error = %e, "NewsAPI reported an error"))
    }

    /// Search and normalize in one step. Records rejected by construction are skipped.
    pub async fn fetch_and_normalize(
        &self,
        query: &SearchQuery,
        locale: &Locale,
    ) -> Result<Vec<UniversalArticle>, SourceError> {
        let raw = self.fetch_articles(query).await?;
        Ok(normalize_batch(&raw, locale))
    }

    /// Fetch headlines and normalize in one step.
    pub async fn fetch_headlines_and_normalize(
        &self,
        query: &HeadlineQuery,
        locale: &Locale,
    ) -> Result<Vec<UniversalArticle>, SourceError> {
        let raw = self.fetch_top_headlines(query).await?;
        Ok(normalize_batch(&raw, locale))
    }

    /// Map one raw NewsAPI record onto the shared schema, fetched now.
    pub fn normalize(raw: &Value, locale: &Locale) -> Result<UniversalArticle, ArticleError> {
        Self::normalize_at(raw, locale, Utc::now())
    }

    /// Map one raw NewsAPI record onto the shared schema.
    ///
    /// Missing fields are replaced by defaults: `"Untitled"` for the title,
    /// `"Unknown"` for the source name, and the fetch instant for an absent or
    /// unparseable `publishedAt`. The article's own construction check is what
    /// rejects a record with no URL.
    pub fn normalize_at(
        raw: &Value,
        locale: &Locale,
        fetched_at: DateTime<Utc>,
    ) -> Result<UniversalArticle, ArticleError> {
        // Title and source name feed the id, so they are kept verbatim.
        let source_name = verbatim_field(&raw["source"], "name").unwrap_or(UNKNOWN_SOURCE);
        let raw_title = verbatim_field(raw, "title");
        let title = raw_title.unwrap_or(UNTITLED);
        let source_url = str_field(raw, "url").unwrap_or_default();

        let published_at = str_field(raw, "publishedAt")
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or(fetched_at);

        let description = str_field(raw, "description").map(clean_text);
        let content = str_field(raw, "content").map(clean_text);

        let sample = format!(
            "{} {}",
            raw_title.unwrap_or_default(),
            description.as_deref().unwrap_or_default()
        );
        let language = match str_field(raw, "language") {
            Some(language) => language.to_string(),
            None if sample.trim().is_empty() => locale.language.clone(),
            None => detect_language(&sample).to_string(),
        };

        let mut builder = UniversalArticle::builder(
            title,
            source_url,
            source_name,
            published_at,
            fetched_at,
            SourceType::NewsApi,
        )
        .language(language)
        .region(locale.region.clone())
        .description(description)
        .content(content)
        .image_url(str_field(raw, "urlToImage").map(str::to_string))
        .original_data(raw.clone());

        if let Some(author) = str_field(raw, "author") {
            builder = builder.authors(vec![author.to_string()]);
        }
        builder.build()
    }
}

/// Normalize every record, logging and dropping the ones that fail construction.
pub fn normalize_batch(raw: &[Value], locale: &Locale) -> Vec<UniversalArticle> {
    let fetched_at = Utc::now();
    raw.iter()
        .enumerate()
        .filter_map(|(i, record)| {
            match NewsApiSource::normalize_at(record, locale, fetched_at) {
                Ok(article) => Some(article),
                Err(e) => {
                    warn!(index = i, error = %e, "Dropping record that failed normalization");
                    None
                }
            }
        })
        .collect()
}

/// Map an HTTP status and body onto the article list or a [`SourceError`].
///
/// An error envelope (`{"status": "error", "code": ..., "message": ...}`)
/// reports its own code and message whatever the status. A non-success
/// status with an undecodable body reports the HTTP status as the code.
fn parse_response(status: StatusCode, body: &str) -> Result<Vec<Value>, SourceError> {
    let parsed = match serde_json::from_str::<SearchResponse>(body) {
        Ok(parsed) => parsed,
        Err(_) if !status.is_success() => return Err(http_error(status)),
        Err(e) => return Err(SourceError::Decode(e)),
    };
    if !status.is_success() && parsed.status == "ok" {
        return Err(http_error(status));
    }
    debug!(%status, total_results = parsed.total_results, "NewsAPI response received");
    parsed.into_articles()
}

fn http_error(status: StatusCode) -> SourceError {
    SourceError::Api {
        code: status.as_u16().to_string(),
        message: status.canonical_reason().unwrap_or("HTTP error").to_string(),
    }
}

fn check_page_size(page_size: u32) -> Result<(), SourceError> {
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(SourceError::InvalidQuery(format!(
            "page_size must be within 1-{MAX_PAGE_SIZE} (got {page_size})"
        )));
    }
    Ok(())
}

/// Non-blank string field, trimmed.
fn str_field<'a>(raw: &'a Value, key: &str) -> Option<&'a str> {
    verbatim_field(raw, key).map(str::trim)
}

/// Non-blank string field, surrounding whitespace preserved.
fn verbatim_field<'a>(raw: &'a Value, key: &str) -> Option<&'a str> {
    raw.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::derive_id;
    use chrono::TimeZone;
    use serde_json::json;

    fn locale() -> Locale {
        Locale {
            language: "ja".into(),
            region: "JP".into(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 29, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_normalize_full_record() {
        let raw = json!({
            "source": {"id": "techcrunch", "name": "TechCrunch"},
            "author": "Jane Doe",
            "title": "OpenAI releases GPT-5",
            "description": "The <b>new</b> model is here.",
            "url": "https://techcrunch.com/gpt5",
            "urlToImage": "https://techcrunch.com/gpt5.png",
            "publishedAt": "2026-01-29T08:00:00Z",
            "content": "Long body text… [+1200 chars]"
        });

        let article = NewsApiSource::normalize_at(&raw, &locale(), now()).unwrap();
        assert_eq!(article.id(), derive_id("OpenAI releases GPT-5", "TechCrunch"));
        assert_eq!(article.title(), "OpenAI releases GPT-5");
        assert_eq!(article.source_name(), "TechCrunch");
        assert_eq!(article.source_url(), "https://techcrunch.com/gpt5");
        assert_eq!(article.source_type(), SourceType::NewsApi);
        assert_eq!(article.category(), "unknown");
        assert_eq!(article.language(), "en");
        assert_eq!(article.region(), "JP");
        assert_eq!(article.description(), Some("The new model is here."));
        assert_eq!(article.content(), Some("Long body text"));
        assert_eq!(article.image_url(), Some("https://techcrunch.com/gpt5.png"));
        assert_eq!(article.authors(), Some(&["Jane Doe".to_string()][..]));
        assert_eq!(
            article.published_at(),
            Utc.with_ymd_and_hms(2026, 1, 29, 8, 0, 0).unwrap()
        );
        assert_eq!(article.fetched_at(), now());
        assert_eq!(article.original_data(), Some(&raw));
        assert_eq!(article.summary(), None);
        assert!(article.validate_at(now()).is_ok());
    }

    #[test]
    fn test_normalize_is_stable_across_fetches() {
        let raw = json!({
            "source": {"name": "NHK"},
            "title": "AI 規制法案が成立",
            "url": "https://nhk.or.jp/a"
        });
        let first = NewsApiSource::normalize_at(&raw, &locale(), now()).unwrap();
        let second =
            NewsApiSource::normalize_at(&raw, &locale(), now() + chrono::Duration::hours(3))
                .unwrap();
        assert_eq!(first.id(), second.id());
        assert_eq!(first.language(), "ja");
    }

    #[test]
    fn test_normalize_substitutes_defaults() {
        let raw = json!({
            "source": {"name": null},
            "title": null,
            "url": "https://example.com/x",
            "publishedAt": "not a date"
        });
        let article = NewsApiSource::normalize_at(&raw, &locale(), now()).unwrap();
        assert_eq!(article.title(), "Untitled");
        assert_eq!(article.source_name(), "Unknown");
        assert_eq!(article.published_at(), now());
        assert_eq!(article.description(), None);
        assert_eq!(article.authors(), None);
        assert_eq!(article.language(), "ja");
    }

    #[test]
    fn test_normalize_derives_id_from_verbatim_title() {
        let raw = json!({
            "source": {"name": "Wire "},
            "title": "  Padded headline ",
            "url": "https://wire.example/p"
        });
        let article = NewsApiSource::normalize_at(&raw, &locale(), now()).unwrap();
        assert_eq!(article.id(), derive_id("  Padded headline ", "Wire "));
        assert_eq!(article.title(), "  Padded headline ");

        let blank = json!({"source": {"name": "  "}, "title": " ", "url": "https://wire.example/b"});
        let article = NewsApiSource::normalize_at(&blank, &locale(), now()).unwrap();
        assert_eq!(article.title(), "Untitled");
        assert_eq!(article.source_name(), "Unknown");
    }

    #[test]
    fn test_normalize_rejects_missing_url() {
        let raw = json!({"source": {"name": "Src"}, "title": "No link"});
        let err = NewsApiSource::normalize_at(&raw, &locale(), now()).unwrap_err();
        assert!(matches!(err, ArticleError::MissingField("source_url")));
    }

    #[test]
    fn test_normalize_batch_drops_rejected_records() {
        let raw = vec![
            json!({"source": {"name": "A"}, "title": "One", "url": "https://a.example/1"}),
            json!({"source": {"name": "B"}, "title": "Two"}),
            json!({"source": {"name": "C"}, "title": "Three", "url": "https://c.example/3"}),
        ];
        let articles = normalize_batch(&raw, &locale());
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[1].title(), "Three");
    }

    #[test]
    fn test_search_response_ok() {
        let body: SearchResponse = serde_json::from_value(json!({
            "status": "ok",
            "totalResults": 42,
            "articles": [{"title": "a"}, {"title": "b"}]
        }))
        .unwrap();
        assert_eq!(body.total_results, 42);
        assert_eq!(body.into_articles().unwrap().len(), 2);
    }

    #[test]
    fn test_search_response_error() {
        let body: SearchResponse = serde_json::from_value(json!({
            "status": "error",
            "code": "apiKeyInvalid",
            "message": "Your API key is invalid"
        }))
        .unwrap();
        match body.into_articles() {
            Err(SourceError::Api { code, message }) => {
                assert_eq!(code, "apiKeyInvalid");
                assert_eq!(message, "Your API key is invalid");
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_response_ok() {
        let body = r#"{"status": "ok", "totalResults": 1, "articles": [{"title": "a"}]}"#;
        let articles = parse_response(StatusCode::OK, body).unwrap();
        assert_eq!(articles.len(), 1);
    }

    #[test]
    fn test_parse_response_error_envelope() {
        let body = r#"{"status": "error", "code": "rateLimited", "message": "Too many requests"}"#;
        match parse_response(StatusCode::TOO_MANY_REQUESTS, body) {
            Err(SourceError::Api { code, message }) => {
                assert_eq!(code, "rateLimited");
                assert_eq!(message, "Too many requests");
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_response_http_error_without_envelope() {
        match parse_response(StatusCode::BAD_GATEWAY, "<html>Bad Gateway</html>") {
            Err(SourceError::Api { code, message }) => {
                assert_eq!(code, "502");
                assert_eq!(message, "Bad Gateway");
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_response_malformed_success_body() {
        assert!(matches!(
            parse_response(StatusCode::OK, "not json"),
            Err(SourceError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_articles_rejects_invalid_query() {
        let source = NewsApiSource::new("test-key").unwrap();
        let mut query = SearchQuery {
            keyword: "   ".into(),
            language: "en".into(),
            page_size: 20,
            sort_by: SortBy::PublishedAt,
        };
        assert!(matches!(
            source.fetch_articles(&query).await,
            Err(SourceError::InvalidQuery(_))
        ));

        query.keyword = "AI".into();
        query.page_size = 0;
        assert!(matches!(
            source.fetch_articles(&query).await,
            Err(SourceError::InvalidQuery(_))
        ));

        query.page_size = 101;
        assert!(matches!(
            source.fetch_articles(&query).await,
            Err(SourceError::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_sort_by_names() {
        assert_eq!(SortBy::default().as_str(), "publishedAt");
        let parsed: SortBy = serde_yaml::from_str("relevancy").unwrap();
        assert_eq!(parsed, SortBy::Relevancy);
    }
}
