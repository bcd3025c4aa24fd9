//! Utility functions for text cleanup, language detection, and file system checks.
//!
//! This module provides helper functions used throughout the application:
//! - Script-based language detection for normalized articles
//! - Markup stripping and whitespace cleanup for API text fields
//! - String truncation for logging and page excerpts
//! - File system validation for output directories

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Node};
use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
/// Elements whose boundaries separate words in rendered text.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption", "h1", "h2",
    "h3", "h4", "h5", "h6", "hr", "li", "ol", "p", "pre", "section", "table", "td", "th", "tr",
    "ul",
];

static TRUNCATION_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:…|\.\.\.)?\s*\[\+\d+ chars\]\s*$").unwrap());

/// Guess the language of `text` from the scripts it contains.
///
/// Any CJK punctuation, hiragana, katakana, or CJK ideograph (U+3000 to
/// U+9FFF) marks the text as Japanese; everything else is treated as English.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(detect_language("OpenAI が GPT-5 を発表"), "ja");
/// assert_eq!(detect_language("OpenAI releases GPT-5"), "en");
/// ```
pub fn detect_language(text: &str) -> &'static str {
    let has_japanese = text.chars().any(|c| {
        ('\u{3000}'..='\u{9fff}').contains(&c)
            || ('\u{3040}'..='\u{309f}').contains(&c)
            || ('\u{30a0}'..='\u{30ff}').contains(&c)
    });
    if has_japanese { "ja" } else { "en" }
}

/// Reduce an API text field to plain text.
///
/// Tags are dropped, entities decoded, whitespace collapsed, and the
/// `[+1234 chars]` marker NewsAPI appends to truncated content removed.
/// Inline markup leaves the surrounding text joined; block elements such as
/// `<p>`, `<li>` and `<br>` become a single space.
pub fn clean_text(raw: &str) -> String {
    let fragment = Html::parse_fragment(raw);
    let mut text = String::with_capacity(raw.len());
    for node in fragment.root_element().descendants() {
        match node.value() {
            Node::Text(t) => text.push_str(t),
            Node::Element(el) if BLOCK_ELEMENTS.contains(&el.name()) => text.push(' '),
            _ => {}
        }
    }
    let text = WHITESPACE.replace_all(&text, " ");
    let text = TRUNCATION_MARKER.replace(text.trim(), "");
    text.trim().to_string()
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` bytes (backed off to a character
/// boundary) with an ellipsis and byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log("a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…(+{} bytes)", &s[..end], s.len() - end)
    }
}

/// Keep the first `max` characters of `s`, appending `...` when anything was cut.
pub fn excerpt(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max).collect();
        format!("{head}...")
    }
}

/// Ensure a directory exists and is writable.
///
/// This function creates the directory if it doesn't exist, then performs
/// a write test by creating and immediately deleting a probe file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    if let Err(e) = fs::create_dir_all(path).await {
        return Err(Box::new(e));
    }
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_language() {
        assert_eq!(detect_language("OpenAI が GPT-5 を発表"), "ja");
        assert_eq!(detect_language("カタカナ"), "ja");
        assert_eq!(detect_language("人工知能"), "ja");
        assert_eq!(detect_language("OpenAI releases GPT-5"), "en");
        assert_eq!(detect_language(""), "en");
    }

    #[test]
    fn test_clean_text_strips_markup_and_marker() {
        let raw = "<ul><li>Apple&nbsp;unveiled   new chips</li></ul>\n today… [+2841 chars]";
        assert_eq!(clean_text(raw), "Apple unveiled new chips today");
    }

    #[test]
    fn test_clean_text_keeps_inline_markup_joined() {
        assert_eq!(clean_text("OpenAI ships GPT-<b>5</b> today"), "OpenAI ships GPT-5 today");
        assert_eq!(clean_text("the Wall St<em>reet</em> Journal"), "the Wall Street Journal");
    }

    #[test]
    fn test_clean_text_separates_block_elements() {
        assert_eq!(clean_text("<p>First</p><p>Second</p>"), "First Second");
        assert_eq!(clean_text("line one<br>line two"), "line one line two");
    }

    #[test]
    fn test_clean_text_plain() {
        assert_eq!(clean_text("  plain   text "), "plain text");
        assert_eq!(clean_text(""), "");
    }

    #[test]
    fn test_truncate_for_log_short_string() {
        let s = "Hello, world!";
        assert_eq!(truncate_for_log(s, 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_multibyte() {
        let s = "日本語のテキスト";
        let result = truncate_for_log(s, 4);
        assert!(result.starts_with("日"));
    }

    #[test]
    fn test_excerpt() {
        assert_eq!(excerpt("short", 150), "short");
        let long = "あ".repeat(151);
        let cut = excerpt(&long, 150);
        assert_eq!(cut.chars().count(), 153);
        assert!(cut.ends_with("..."));
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested/output");
        let target = target.to_str().unwrap();
        ensure_writable_dir(target).await.unwrap();
        assert!(std::path::Path::new(target).is_dir());
    }
}
