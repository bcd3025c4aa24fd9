//! Article summarization through a text-generation API.
//!
//! # Architecture
//!
//! - [`AskModel`]: one prompt in, one completion out
//! - [`claude::ClaudeClient`]: the Anthropic implementation of [`AskModel`]
//! - [`Summarizer`]: prompt construction plus the per-record degrade policy
//!
//! Summaries are generated one article at a time. A failure on one record
//! leaves that record with an empty summary and the batch moves on.

use crate::error::SummarizeError;
use crate::models::UniversalArticle;
use crate::utils::truncate_for_log;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

pub mod claude;

/// Combined inputs shorter than this many characters are not sent to the model.
pub const MIN_INPUT_CHARS: usize = 50;

/// Trait for a text-generation backend.
///
/// Implementors send one prompt and return the model's text. This is the
/// seam tests use to stand in for the real API.
pub trait AskModel {
    /// Send `prompt` and return the completion, capped at `max_tokens`.
    async fn ask(&self, prompt: &str, max_tokens: u32) -> Result<String, SummarizeError>;
}

/// Wrap `text` in the fixed prompt for `language`.
///
/// `"ja"` selects the Japanese instruction; any other value selects English.
pub fn build_prompt(text: &str, language: &str) -> String {
    if language == "ja" {
        format!(
            "以下のニュース記事を、簡潔な日本語で2-3文の要約にしてください。\n\
             重要なポイントだけを抽出し、読者が記事の内容をすぐに理解できるようにしてください。\n\
             \n\
             記事：\n\
             {text}\n\
             \n\
             要約："
        )
    } else {
        format!(
            "Please summarize the following news article in 2-3 concise sentences.\n\
             Extract only the key points so readers can quickly understand the content.\n\
             \n\
             Article:\n\
             {text}\n\
             \n\
             Summary:"
        )
    }
}

/// Concatenate an article's title, description, and content into summary input.
///
/// Field labels follow the summary language.
pub fn summary_input(article: &UniversalArticle, language: &str) -> String {
    let (title, description, content) = if language == "ja" {
        ("タイトル", "概要", "本文")
    } else {
        ("Title", "Description", "Content")
    };

    let mut parts = vec![format!("{title}: {}", article.title())];
    if let Some(d) = article.description().filter(|d| !d.is_empty()) {
        parts.push(format!("\n{description}: {d}"));
    }
    if let Some(c) = article.content().filter(|c| !c.is_empty()) {
        parts.push(format!("\n{content}: {c}"));
    }
    parts.join("\n")
}

/// Outcome counts for one summarization batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SummaryStats {
    pub summarized: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Generates summaries with any [`AskModel`] backend.
#[derive(Debug)]
pub struct Summarizer<C> {
    client: C,
}

impl<C: AskModel> Summarizer<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Summarize a block of text.
    ///
    /// # Errors
    ///
    /// - [`SummarizeError::EmptyInput`] if `text` is blank; no request is made
    /// - Any error from the backend, unchanged
    #[instrument(level = "info", skip_all, fields(language = %language, chars = text.chars().count()))]
    pub async fn summarize(
        &self,
        text: &str,
        max_tokens: u32,
        language: &str,
    ) -> Result<String, SummarizeError> {
        if text.trim().is_empty() {
            return Err(SummarizeError::EmptyInput);
        }
        let t0 = Instant::now();
        let prompt = build_prompt(text, language);
        let summary = self.client.ask(&prompt, max_tokens).await?;
        let summary = summary.trim().to_string();
        info!(
            elapsed_ms = t0.elapsed().as_millis() as u64,
            chars = summary.chars().count(),
            "Summary generated"
        );
        Ok(summary)
    }

    /// Attach a summary to every article, in order.
    ///
    /// Articles with too little text get an empty summary without a request.
    /// A failed request is logged and also leaves an empty summary.
    #[instrument(level = "info", skip_all, fields(total = articles.len(), language = %language))]
    pub async fn summarize_articles(
        &self,
        articles: &mut [UniversalArticle],
        max_tokens: u32,
        language: &str,
    ) -> SummaryStats {
        let mut stats = SummaryStats::default();
        let total = articles.len();

        for (i, article) in articles.iter_mut().enumerate() {
            debug!(index = i + 1, total, title = %truncate_for_log(article.title(), 80), "Summarizing article");
            let input = summary_input(article, language);

            if input.trim().chars().count() < MIN_INPUT_CHARS {
                warn!(index = i + 1, id = %article.id(), "Not enough content to summarize; skipping");
                article.set_summary("");
                stats.skipped += 1;
                continue;
            }

            match self.summarize(&input, max_tokens, language).await {
                Ok(summary) => {
                    article.set_summary(summary);
                    stats.summarized += 1;
                }
                Err(e) => {
                    warn!(index = i + 1, id = %article.id(), error = %e, "Summarization failed; leaving summary empty");
                    article.set_summary("");
                    stats.failed += 1;
                }
            }
        }

        info!(
            summarized = stats.summarized,
            skipped = stats.skipped,
            failed = stats.failed,
            "Completed summarization"
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceType;
    use chrono::{TimeZone, Utc};
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Replays canned answers and records every prompt it receives.
    #[derive(Default)]
    struct FakeModel {
        answers: RefCell<VecDeque<Result<String, SummarizeError>>>,
        prompts: RefCell<Vec<String>>,
    }

    impl FakeModel {
        fn answering(answers: Vec<Result<String, SummarizeError>>) -> Self {
            Self {
                answers: RefCell::new(answers.into()),
                prompts: RefCell::new(Vec::new()),
            }
        }
    }

    impl AskModel for FakeModel {
        async fn ask(&self, prompt: &str, _max_tokens: u32) -> Result<String, SummarizeError> {
            self.prompts.borrow_mut().push(prompt.to_string());
            self.answers
                .borrow_mut()
                .pop_front()
                .unwrap_or(Err(SummarizeError::EmptyResponse))
        }
    }

    fn article(title: &str, description: Option<&str>) -> UniversalArticle {
        let t = Utc.with_ymd_and_hms(2026, 1, 29, 9, 0, 0).unwrap();
        UniversalArticle::builder(title, "https://example.com/a", "Example", t, t, SourceType::NewsApi)
            .description(description.map(str::to_string))
            .build()
            .unwrap()
    }

    const LONG_DESCRIPTION: &str =
        "A long enough description of the story so that the combined input clears the minimum length.";

    #[test]
    fn test_build_prompt_languages() {
        let ja = build_prompt("本文", "ja");
        assert!(ja.starts_with("以下のニュース記事を"));
        assert!(ja.contains("記事：\n本文\n"));
        assert!(ja.ends_with("要約："));

        let en = build_prompt("Body", "en");
        assert!(en.starts_with("Please summarize"));
        assert!(en.contains("Article:\nBody\n"));
        assert!(en.ends_with("Summary:"));

        assert_eq!(build_prompt("Body", "fr"), en);
    }

    #[test]
    fn test_summary_input_concatenates_fields() {
        let a = article("Headline", Some("Desc"));
        assert_eq!(summary_input(&a, "ja"), "タイトル: Headline\n\n概要: Desc");
        assert_eq!(summary_input(&a, "en"), "Title: Headline\n\nDescription: Desc");
    }

    #[tokio::test]
    async fn test_summarize_rejects_blank_text() {
        let summarizer = Summarizer::new(FakeModel::default());
        let err = summarizer.summarize("   \n", 300, "ja").await.unwrap_err();
        assert!(matches!(err, SummarizeError::EmptyInput));
        assert!(summarizer.client.prompts.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_summarize_trims_answer() {
        let summarizer = Summarizer::new(FakeModel::answering(vec![Ok("  短い要約。\n".into())]));
        let summary = summarizer.summarize("記事の本文", 300, "ja").await.unwrap();
        assert_eq!(summary, "短い要約。");
    }

    #[tokio::test]
    async fn test_summarize_articles_degrades_per_record() {
        let fake = FakeModel::answering(vec![
            Ok("First summary.".into()),
            Err(SummarizeError::Api {
                kind: "overloaded_error".into(),
                message: "Overloaded".into(),
            }),
            Ok("Third summary.".into()),
        ]);
        let summarizer = Summarizer::new(fake);
        let mut articles = vec![
            article("One", Some(LONG_DESCRIPTION)),
            article("Two", Some(LONG_DESCRIPTION)),
            article("Short", None),
            article("Three", Some(LONG_DESCRIPTION)),
        ];

        let stats = summarizer.summarize_articles(&mut articles, 300, "en").await;

        assert_eq!(stats, SummaryStats { summarized: 2, skipped: 1, failed: 1 });
        assert_eq!(articles[0].summary(), Some("First summary."));
        assert_eq!(articles[1].summary(), Some(""));
        assert_eq!(articles[2].summary(), Some(""));
        assert_eq!(articles[3].summary(), Some("Third summary."));
        assert_eq!(summarizer.client.prompts.borrow().len(), 3);
    }

    #[tokio::test]
    async fn test_summarize_articles_empty_batch() {
        let summarizer = Summarizer::new(FakeModel::default());
        let stats = summarizer.summarize_articles(&mut [], 300, "ja").await;
        assert_eq!(stats, SummaryStats::default());
    }
}
