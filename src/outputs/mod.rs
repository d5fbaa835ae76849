//! Output generation: article documents, the posts index and the site listing.
//!
//! # Submodules
//!
//! - [`html`]: Renders an [`Article`] into a standalone HTML document
//! - [`json`]: Reads and appends the posts index (`posts/index.json`)
//! - [`indexes`]: Regenerates the listing section of the site index and prunes old documents
//!
//! # Output Structure
//!
//! ```text
//! site_dir/
//! ├── index.html                                  # <section id="latest-posts"> rewritten
//! └── posts/
//!     ├── index.json                              # PostEntry array
//!     └── storm-hits-coast_20250506_1405.html     # one document per article
//! ```

pub mod html;
pub mod indexes;
pub mod json;

use crate::error::PersistenceFailure;
use crate::models::{Article, PostEntry};
use chrono::{DateTime, Local};
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Write the document for `article` into `posts_dir` and record it in the
/// posts index.
#[instrument(level = "info", skip_all, fields(title = %article.topic.title))]
pub async fn publish_article(
    posts_dir: &Path,
    article: &Article,
    now: DateTime<Local>,
) -> Result<PostEntry, PersistenceFailure> {
    let (filename, document) = html::render_document(article, now.naive_local());
    let path = posts_dir.join(&filename);
    fs::write(&path, document)
        .await
        .map_err(|e| PersistenceFailure::io(&path, e))?;
    info!(path = %path.display(), "Wrote article document");

    let entry = PostEntry {
        filename,
        title: article.topic.title.clone(),
        timestamp: now.to_utc(),
        sources: article.attributions.iter().map(|a| a.domain.clone()).collect(),
        search_volume: article.topic.traffic_estimate.clone(),
    };
    json::append_post(&posts_dir.join(json::INDEX_FILE), entry.clone()).await?;
    Ok(entry)
}
