//! Data models for normalized news articles.
//!
//! This module defines the canonical record every source adapter produces:
//! - [`UniversalArticle`]: one article in the shared schema
//! - [`ArticleBuilder`]: validated construction of a [`UniversalArticle`]
//! - [`Score`]: an integer constrained to `0..=100`
//! - [`SourceType`]: which adapter produced the record
//!
//! An article is created once by a normalizer, has its summary set once by
//! the summarizer, and is read-only afterwards.

use crate::error::ArticleError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::Value;
use uuid::Uuid;

/// Category assigned when no classifier has run.
pub const DEFAULT_CATEGORY: &str = "unknown";
/// Language used when nothing better is known.
pub const DEFAULT_LANGUAGE: &str = "ja";
/// Region used when nothing better is known.
pub const DEFAULT_REGION: &str = "JP";

/// How far in the future `published_at` may lie before a record is rejected.
pub fn future_tolerance() -> Duration {
    Duration::hours(1)
}

/// Derive the stable identifier for an article.
///
/// The id is a UUID v5 in the DNS namespace over `"{title}-{source_name}"`,
/// so fetching the same story twice yields the same id.
pub fn derive_id(title: &str, source_name: &str) -> String {
    Uuid::new_v5(
        &Uuid::NAMESPACE_DNS,
        format!("{title}-{source_name}").as_bytes(),
    )
    .to_string()
}

/// The adapter a record originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    #[serde(rename = "newsapi")]
    NewsApi,
    Rss,
    Edinet,
    Arxiv,
}

/// An integer score in `0..=100`.
///
/// Out-of-range values cannot be represented, so a deserialized record with
/// a bad score fails to load with the offending field named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(into = "i64")]
pub struct Score(u8);

impl Score {
    pub fn new(field: &'static str, value: i64) -> Result<Self, ArticleError> {
        if (0..=100).contains(&value) {
            Ok(Score(value as u8))
        } else {
            Err(ArticleError::ScoreOutOfRange { field, value })
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl From<Score> for i64 {
    fn from(score: Score) -> Self {
        i64::from(score.0)
    }
}

fn score_field<'de, D>(field: &'static str, deserializer: D) -> Result<Option<Score>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<i64>::deserialize(deserializer)?
        .map(|value| Score::new(field, value))
        .transpose()
        .map_err(de::Error::custom)
}

fn relevance_score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Score>, D::Error> {
    score_field("relevance_score", deserializer)
}

fn credibility_score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Score>, D::Error> {
    score_field("credibility_score", deserializer)
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

/// A news article in the shared schema.
///
/// # Summary states
///
/// `summary` distinguishes three states:
/// - `None`: summarization never ran for this record
/// - `Some("")`: summarization was attempted but skipped or failed
/// - `Some(text)`: the generated summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniversalArticle {
    id: String,
    title: String,
    source_url: String,
    source_name: String,
    published_at: DateTime<Utc>,
    fetched_at: DateTime<Utc>,
    source_type: SourceType,
    #[serde(default = "default_category")]
    category: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    keywords: Option<Vec<String>>,
    #[serde(default, deserialize_with = "relevance_score")]
    relevance_score: Option<Score>,
    #[serde(default, deserialize_with = "credibility_score")]
    credibility_score: Option<Score>,
    #[serde(default)]
    original_data: Option<Value>,
    #[serde(default)]
    authors: Option<Vec<String>>,
    #[serde(default = "default_language")]
    language: String,
    #[serde(default = "default_region")]
    region: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    is_cached: bool,
    #[serde(default)]
    is_duplicate: bool,
}

impl UniversalArticle {
    /// Start building an article from its required attributes.
    ///
    /// The id defaults to [`derive_id`] over `title` and `source_name`.
    pub fn builder(
        title: impl Into<String>,
        source_url: impl Into<String>,
        source_name: impl Into<String>,
        published_at: DateTime<Utc>,
        fetched_at: DateTime<Utc>,
        source_type: SourceType,
    ) -> ArticleBuilder {
        ArticleBuilder {
            id: None,
            title: title.into(),
            source_url: source_url.into(),
            source_name: source_name.into(),
            published_at,
            fetched_at,
            source_type,
            category: default_category(),
            summary: None,
            keywords: None,
            relevance_score: None,
            credibility_score: None,
            original_data: None,
            authors: None,
            language: default_language(),
            region: default_region(),
            description: None,
            content: None,
            image_url: None,
            is_cached: false,
            is_duplicate: false,
        }
    }

    /// Load an article from its dictionary form, re-applying construction checks.
    pub fn from_value(value: Value) -> Result<Self, ArticleError> {
        let article: UniversalArticle = serde_json::from_value(value)?;
        article.check_required()?;
        Ok(article)
    }

    /// Dictionary form of the article. Timestamps serialize as RFC 3339.
    pub fn to_value(&self) -> Value {
        // Every field is a plain string, number, list, or map.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Check the record against the current clock. See [`Self::validate_at`].
    pub fn validate(&self) -> bool {
        self.validate_at(Utc::now()).is_ok()
    }

    /// Check required fields and timestamp ordering against `now`.
    pub fn validate_at(&self, now: DateTime<Utc>) -> Result<(), ArticleError> {
        self.check_required()?;

        if self.published_at > now + future_tolerance() {
            return Err(ArticleError::PublishedInFuture {
                published_at: self.published_at.to_rfc3339(),
            });
        }
        if self.fetched_at < self.published_at {
            return Err(ArticleError::FetchedBeforePublished {
                fetched_at: self.fetched_at.to_rfc3339(),
                published_at: self.published_at.to_rfc3339(),
            });
        }
        Ok(())
    }

    fn check_required(&self) -> Result<(), ArticleError> {
        for (field, value) in [
            ("id", &self.id),
            ("title", &self.title),
            ("source_url", &self.source_url),
            ("source_name", &self.source_name),
        ] {
            if value.trim().is_empty() {
                return Err(ArticleError::MissingField(field));
            }
        }
        Ok(())
    }

    /// Attach the summarizer's output. An empty string records a skipped attempt.
    pub fn set_summary(&mut self, summary: impl Into<String>) {
        self.summary = Some(summary.into());
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn published_at(&self) -> DateTime<Utc> {
        self.published_at
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    pub fn source_type(&self) -> SourceType {
        self.source_type
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn keywords(&self) -> Option<&[String]> {
        self.keywords.as_deref()
    }

    pub fn relevance_score(&self) -> Option<u8> {
        self.relevance_score.map(Score::get)
    }

    pub fn credibility_score(&self) -> Option<u8> {
        self.credibility_score.map(Score::get)
    }

    pub fn original_data(&self) -> Option<&Value> {
        self.original_data.as_ref()
    }

    pub fn authors(&self) -> Option<&[String]> {
        self.authors.as_deref()
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    pub fn is_cached(&self) -> bool {
        self.is_cached
    }

    pub fn is_duplicate(&self) -> bool {
        self.is_duplicate
    }

    /// Domain name before the TLD, e.g. `"https://www.theverge.com/x"` -> `"theverge"`.
    pub fn source_tag(&self) -> Option<String> {
        let parsed = url::Url::parse(&self.source_url).ok()?;
        let host = parsed.host_str()?;
        let parts: Vec<&str> = host.split('.').collect();
        if parts.len() >= 2 {
            Some(parts[parts.len() - 2].to_string())
        } else {
            None
        }
    }
}

/// Builder for [`UniversalArticle`]. Validation happens in [`ArticleBuilder::build`].
#[derive(Debug, Clone)]
pub struct ArticleBuilder {
    id: Option<String>,
    title: String,
    source_url: String,
    source_name: String,
    published_at: DateTime<Utc>,
    fetched_at: DateTime<Utc>,
    source_type: SourceType,
    category: String,
    summary: Option<String>,
    keywords: Option<Vec<String>>,
    relevance_score: Option<i64>,
    credibility_score: Option<i64>,
    original_data: Option<Value>,
    authors: Option<Vec<String>>,
    language: String,
    region: String,
    description: Option<String>,
    content: Option<String>,
    image_url: Option<String>,
    is_cached: bool,
    is_duplicate: bool,
}

impl ArticleBuilder {
    /// Override the derived id.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = Some(keywords);
        self
    }

    pub fn relevance_score(mut self, score: i64) -> Self {
        self.relevance_score = Some(score);
        self
    }

    pub fn credibility_score(mut self, score: i64) -> Self {
        self.credibility_score = Some(score);
        self
    }

    pub fn original_data(mut self, raw: Value) -> Self {
        self.original_data = Some(raw);
        self
    }

    pub fn authors(mut self, authors: Vec<String>) -> Self {
        self.authors = Some(authors);
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn content(mut self, content: Option<String>) -> Self {
        self.content = content;
        self
    }

    pub fn image_url(mut self, image_url: Option<String>) -> Self {
        self.image_url = image_url;
        self
    }

    pub fn cached(mut self, is_cached: bool) -> Self {
        self.is_cached = is_cached;
        self
    }

    pub fn duplicate(mut self, is_duplicate: bool) -> Self {
        self.is_duplicate = is_duplicate;
        self
    }

    /// Validate scores and required fields, then produce the article.
    ///
    /// # Errors
    ///
    /// - [`ArticleError::ScoreOutOfRange`] if either score lies outside `0..=100`
    /// - [`ArticleError::MissingField`] if id, title, source URL, or source name is blank
    pub fn build(self) -> Result<UniversalArticle, ArticleError> {
        let relevance_score = self
            .relevance_score
            .map(|v| Score::new("relevance_score", v))
            .transpose()?;
        let credibility_score = self
            .credibility_score
            .map(|v| Score::new("credibility_score", v))
            .transpose()?;
        let id = self
            .id
            .unwrap_or_else(|| derive_id(&self.title, &self.source_name));

        let article = UniversalArticle {
            id,
            title: self.title,
            source_url: self.source_url,
            source_name: self.source_name,
            published_at: self.published_at,
            fetched_at: self.fetched_at,
            source_type: self.source_type,
            category: self.category,
            summary: self.summary,
            keywords: self.keywords,
            relevance_score,
            credibility_score,
            original_data: self.original_data,
            authors: self.authors,
            language: self.language,
            region: self.region,
            description: self.description,
            content: self.content,
            image_url: self.image_url,
            is_cached: self.is_cached,
            is_duplicate: self.is_duplicate,
        };
        article.check_required()?;
        Ok(article)
    }
}
