//! Static HTML page generation.
//!
//! Articles are sorted newest first, split into a lead group (the first
//! [`LEAD_COUNT`]) and the remainder, and rendered into one of the
//! [`Layout`] templates. An empty article list is an error rather than an
//! empty page.

use super::environment;
use crate::error::RenderError;
use crate::models::UniversalArticle;
use crate::utils::excerpt;
use chrono::{DateTime, Local};
use clap::ValueEnum;
use minijinja::{Environment, context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

/// Number of articles in the lead group.
pub const LEAD_COUNT: usize = 3;
/// Character limit for descriptions outside the lead group.
pub const EXCERPT_CHARS: usize = 150;

/// Available page layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Broadsheet front page: masthead, stacked lead stories, grid below.
    Classic,
    /// Sans-serif card grid with thumbnails and source tags.
    Modern,
    /// One hero story beside two secondary leads, compact grid below.
    #[default]
    Hybrid,
}

impl Layout {
    pub fn name(&self) -> &'static str {
        match self {
            Layout::Classic => "classic",
            Layout::Modern => "modern",
            Layout::Hybrid => "hybrid",
        }
    }

    fn template(&self) -> &'static str {
        match self {
            Layout::Classic => "classic.html",
            Layout::Modern => "modern.html",
            Layout::Hybrid => "hybrid.html",
        }
    }
}

/// Split an ordered slice into the lead group and the rest.
pub fn partition_lead<T>(articles: &[T]) -> (&[T], &[T]) {
    articles.split_at(articles.len().min(LEAD_COUNT))
}

/// `url` if it parses as an absolute `http` or `https` URL.
///
/// Anything else (`javascript:`, `data:`, relative paths) is rendered unlinked.
fn safe_link(url: &str) -> Option<&str> {
    let parsed = url::Url::parse(url).ok()?;
    matches!(parsed.scheme(), "http" | "https").then_some(url)
}

/// Article fields as the templates see them.
#[derive(Debug, Serialize)]
struct ArticleView<'a> {
    title: &'a str,
    link: Option<&'a str>,
    source_name: &'a str,
    source_tag: Option<String>,
    published: String,
    language: String,
    category: &'a str,
    summary: Option<&'a str>,
    description: Option<&'a str>,
    excerpt: Option<String>,
    image_url: Option<&'a str>,
}

impl<'a> From<&'a UniversalArticle> for ArticleView<'a> {
    fn from(a: &'a UniversalArticle) -> Self {
        Self {
            title: a.title(),
            link: safe_link(a.source_url()),
            source_name: a.source_name(),
            source_tag: a.source_tag(),
            published: a
                .published_at()
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M")
                .to_string(),
            language: a.language().to_uppercase(),
            category: a.category(),
            summary: a.summary().filter(|s| !s.is_empty()),
            description: a.description().filter(|d| !d.is_empty()),
            excerpt: a
                .description()
                .filter(|d| !d.is_empty())
                .map(|d| excerpt(d, EXCERPT_CHARS)),
            image_url: a.image_url(),
        }
    }
}

/// Renders article lists into HTML files under one output directory.
#[derive(Debug)]
pub struct HtmlRenderer {
    env: Environment<'static>,
    output_dir: PathBuf,
    layout: Layout,
}

impl HtmlRenderer {
    pub fn new(output_dir: impl Into<PathBuf>, layout: Layout) -> Result<Self, RenderError> {
        Ok(Self {
            env: environment()?,
            output_dir: output_dir.into(),
            layout,
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Render a complete HTML document.
    ///
    /// # Errors
    ///
    /// - [`RenderError::NoArticles`] if `articles` is empty
    /// - [`RenderError::Template`] if the layout fails to render
    pub fn render(
        &self,
        articles: &[UniversalArticle],
        title: &str,
        now: DateTime<Local>,
    ) -> Result<String, RenderError> {
        if articles.is_empty() {
            return Err(RenderError::NoArticles);
        }

        let mut sorted: Vec<&UniversalArticle> = articles.iter().collect();
        sorted.sort_by(|a, b| b.published_at().cmp(&a.published_at()));
        let views: Vec<ArticleView<'_>> = sorted.into_iter().map(ArticleView::from).collect();
        let (top_articles, other_articles) = partition_lead(&views);

        let template = self.env.get_template(self.layout.template())?;
        let html = template.render(context! {
            title => title,
            layout => self.layout.name(),
            date => now.format("%Y年%m月%d日").to_string(),
            time => now.format("%H:%M").to_string(),
            top_articles => top_articles,
            other_articles => other_articles,
            total_count => views.len(),
        })?;
        Ok(html)
    }

    /// Render `articles` and write the page into the output directory.
    ///
    /// Without a `filename`, the page is named `news_YYYYMMDD_HHMMSS.html`
    /// after the current local time. Returns the path written.
    #[instrument(level = "info", skip_all, fields(count = articles.len(), layout = self.layout.name()))]
    pub async fn generate(
        &self,
        articles: &[UniversalArticle],
        title: &str,
        filename: Option<&str>,
    ) -> Result<PathBuf, RenderError> {
        let now = Local::now();
        let html = self.render(articles, title, now)?;

        let filename = match filename {
            Some(name) => name.to_string(),
            None => now.format("news_%Y%m%d_%H%M%S.html").to_string(),
        };
        fs::create_dir_all(&self.output_dir).await?;
        let path = self.output_dir.join(filename);
        fs::write(&path, html).await?;
        info!(path = %path.display(), "Wrote HTML page");
        Ok(path)
    }
}
