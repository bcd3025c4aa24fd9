//! JSON snapshot of a rendered edition.
//!
//! The snapshot carries every article in its dictionary form so other tools
//! can reload it with [`UniversalArticle::from_value`].
//!
//! # Output Path
//!
//! `{json_output_dir}/{stem}.json`, where `stem` matches the HTML page
//! (for example `news_20260129.json` next to `news_20260129.html`).

use crate::error::RenderError;
use crate::models::UniversalArticle;
use chrono::Local;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// One run's worth of articles.
#[derive(Debug, Serialize)]
pub struct Edition<'a> {
    /// The date of publication in `YYYY-MM-DD` format.
    pub local_date: String,
    /// The local time of publication in `HH:MM:SS` format.
    pub local_time: String,
    pub total_count: usize,
    pub articles: &'a [UniversalArticle],
}

impl<'a> Edition<'a> {
    pub fn now(articles: &'a [UniversalArticle]) -> Self {
        let now = Local::now();
        Self {
            local_date: now.format("%Y-%m-%d").to_string(),
            local_time: now.format("%H:%M:%S").to_string(),
            total_count: articles.len(),
            articles,
        }
    }
}

/// Write an [`Edition`] to `{json_output_dir}/{stem}.json`.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir.display(), %stem))]
pub async fn write_edition(
    edition: &Edition<'_>,
    json_output_dir: &Path,
    stem: &str,
) -> Result<PathBuf, RenderError> {
    let json = serde_json::to_string_pretty(edition)?;

    if let Err(e) = fs::create_dir_all(json_output_dir).await {
        error!(error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let path = json_output_dir.join(format!("{stem}.json"));
    fs::write(&path, json).await?;
    info!(path = %path.display(), articles = edition.total_count, "Wrote JSON snapshot");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceType;
    use chrono::{TimeZone, Utc};
    use serde_json::Value;

    #[tokio::test]
    async fn test_write_edition_reloads() {
        let t = Utc.with_ymd_and_hms(2026, 1, 29, 8, 0, 0).unwrap();
        let mut article = UniversalArticle::builder(
            "Snapshot",
            "https://example.com/s",
            "Example",
            t,
            t,
            SourceType::NewsApi,
        )
        .build()
        .unwrap();
        article.set_summary("");
        let articles = vec![article];

        let dir = tempfile::tempdir().unwrap();
        let edition = Edition::now(&articles);
        let path = write_edition(&edition, &dir.path().join("json"), "news_20260129")
            .await
            .unwrap();
        assert!(path.ends_with("json/news_20260129.json"));

        let written: Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(written["total_count"], 1);
        assert_eq!(written["local_date"], edition.local_date);

        let reloaded = UniversalArticle::from_value(written["articles"][0].clone()).unwrap();
        assert_eq!(reloaded, articles[0]);
        assert_eq!(reloaded.summary(), Some(""));
    }
}
