//! Output generation for HTML pages, the index redirect, and JSON snapshots.
//!
//! # Submodules
//!
//! - [`html`]: Renders articles into one of the page layouts
//! - [`index`]: Points `index.html` at the newest page
//! - [`json`]: Writes the edition as JSON for other consumers
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── index.html            # redirect to the newest page
//! ├── news_20260129.html
//! └── news_20260130.html
//!
//! json_output_dir/
//! └── news_20260130.json
//! ```

use minijinja::Environment;

pub mod html;
pub mod index;
pub mod json;

/// Template environment with every page template registered.
///
/// Templates ending in `.html` are auto-escaped.
pub(crate) fn environment() -> Result<Environment<'static>, minijinja::Error> {
    let mut env = Environment::new();
    env.add_template("base.html", include_str!("templates/base.html"))?;
    env.add_template("macros.html", include_str!("templates/macros.html"))?;
    env.add_template("classic.html", include_str!("templates/classic.html"))?;
    env.add_template("modern.html", include_str!("templates/modern.html"))?;
    env.add_template("hybrid.html", include_str!("templates/hybrid.html"))?;
    env.add_template("redirect.html", include_str!("templates/redirect.html"))?;
    Ok(env)
}
