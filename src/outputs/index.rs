//! `index.html` redirect to the newest page.
//!
//! The index is replaced on every run so the site root always lands on the
//! latest edition.

use super::environment;
use crate::error::RenderError;
use minijinja::context;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

/// Render the redirect page pointing at `target` (a path relative to the index).
pub fn render_redirect(target: &str, title: &str) -> Result<String, RenderError> {
    let env = environment()?;
    let template = env.get_template("redirect.html")?;
    Ok(template.render(context! { target => target, title => title })?)
}

/// Write `output_dir/index.html` redirecting to `target`.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display(), %target))]
pub async fn write_index_redirect(
    output_dir: &Path,
    target: &str,
    title: &str,
) -> Result<PathBuf, RenderError> {
    let html = render_redirect(target, title)?;
    fs::create_dir_all(output_dir).await?;
    let path = output_dir.join("index.html");
    fs::write(&path, html).await?;
    info!(path = %path.display(), "Updated index redirect");
    Ok(path)
}
