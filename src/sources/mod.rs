//! News source adapters.
//!
//! Each adapter issues queries against an external API and maps its raw
//! records onto [`UniversalArticle`]. Only NewsAPI is implemented:
//!
//! | Source | Module | Endpoints |
//! |--------|--------|-----------|
//! | NewsAPI | [`newsapi`] | `/v2/everything`, `/v2/top-headlines` |
//!
//! Duplicates are detected by identity only: two records are the same
//! article when their derived ids match.

use crate::config::Locale;
use crate::error::SourceError;
use crate::models::UniversalArticle;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt, TryStreamExt};
use itertools::Itertools;
use tracing::{info, instrument, warn};

pub mod newsapi;

use newsapi::{HeadlineQuery, NewsApiSource, SearchQuery};

/// One request to run against NewsAPI.
#[derive(Debug, Clone)]
pub enum Query {
    Search(SearchQuery),
    Headlines(HeadlineQuery),
}

/// Run every query in order and return the normalized, de-duplicated articles.
///
/// Queries run one after another; the first transport failure aborts the run.
#[instrument(level = "info", skip_all, fields(queries = queries.len()))]
pub async fn collect_articles(
    source: &NewsApiSource,
    queries: &[Query],
    locale: &Locale,
) -> Result<Vec<UniversalArticle>, SourceError> {
    let batches: Vec<Vec<UniversalArticle>> = stream::iter(queries)
        .then(|query| async move {
            match query {
                Query::Search(q) => source.fetch_and_normalize(q, locale).await,
                Query::Headlines(q) => source.fetch_headlines_and_normalize(q, locale).await,
            }
        })
        .try_collect()
        .await?;

    let fetched: usize = batches.iter().map(Vec::len).sum();
    let articles = dedupe_by_id(batches.into_iter().flatten().collect());
    info!(
        fetched,
        unique = articles.len(),
        "Collected normalized articles"
    );
    Ok(articles)
}

/// Drop later records whose id was already seen, keeping first-seen order.
pub fn dedupe_by_id(articles: Vec<UniversalArticle>) -> Vec<UniversalArticle> {
    articles
        .into_iter()
        .unique_by(|a| a.id().to_string())
        .collect()
}

/// Drop articles that fail [`UniversalArticle::validate_at`], logging each one.
pub fn retain_valid(articles: &mut Vec<UniversalArticle>, now: DateTime<Utc>) {
    articles.retain(|a| match a.validate_at(now) {
        Ok(()) => true,
        Err(e) => {
            warn!(id = %a.id(), url = %a.source_url(), error = %e, "Dropping invalid article");
            false
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceType;
    use chrono::TimeZone;

    fn article(title: &str, source: &str, url: &str) -> UniversalArticle {
        let t = Utc.with_ymd_and_hms(2026, 1, 29, 9, 0, 0).unwrap();
        UniversalArticle::builder(title, url, source, t, t, SourceType::NewsApi)
            .build()
            .unwrap()
    }

    #[test]
    fn test_dedupe_by_id_keeps_first_occurrence() {
        let articles = vec![
            article("Same story", "Wire", "https://wire.example/1"),
            article("Other story", "Wire", "https://wire.example/2"),
            article("Same story", "Wire", "https://mirror.example/1"),
        ];
        let unique = dedupe_by_id(articles);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].source_url(), "https://wire.example/1");
        assert_eq!(unique[1].title(), "Other story");
    }

    #[test]
    fn test_retain_valid_drops_future_articles() {
        let now = Utc.with_ymd_and_hms(2026, 1, 29, 9, 30, 0).unwrap();
        let future = now + chrono::Duration::hours(2);
        let mut articles = vec![
            article("Current", "Wire", "https://wire.example/1"),
            UniversalArticle::builder("Ahead", "https://wire.example/2", "Wire", future, future, SourceType::NewsApi)
                .build()
                .unwrap(),
        ];
        retain_valid(&mut articles, now);
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title(), "Current");
    }

    #[test]
    fn test_dedupe_ignores_near_duplicates() {
        let articles = vec![
            article("Same story", "Wire", "https://wire.example/1"),
            article("Same story!", "Wire", "https://wire.example/1"),
            article("Same story", "Other Wire", "https://wire.example/1"),
        ];
        assert_eq!(dedupe_by_id(articles).len(), 3);
    }
}
