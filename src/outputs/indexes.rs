//! Site listing regeneration and document retention.
//!
//! # Listing
//!
//! The site's `index.html` carries a `<section id="latest-posts">` block. It
//! is replaced wholesale with the newest posts from the posts index: sorted
//! newest first, one entry per filename, capped at the listing limit.
//!
//! # Retention
//!
//! Documents in the posts directory whose modification time is older than
//! the retention window are deleted and dropped from the posts index.

use super::json::{load_posts, save_posts};
use crate::error::PersistenceFailure;
use crate::models::PostEntry;
use crate::utils::time_ago;
use chrono::{DateTime, Duration, Utc};
use html_escape::{encode_double_quoted_attribute, encode_text};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};
use std::fmt::Write;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument, warn};

static LATEST_POSTS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<section id="latest-posts">.*?</section>"#).expect("valid listing regex")
});

/// Newest posts first, one per filename, at most `limit`.
pub fn latest_posts(posts: &[PostEntry], limit: usize) -> Vec<PostEntry> {
    posts
        .iter()
        .sorted_by(|a, b| b.timestamp.cmp(&a.timestamp))
        .unique_by(|p| p.filename.clone())
        .take(limit)
        .cloned()
        .collect()
}

fn sources_text(sources: &[String]) -> String {
    if sources.is_empty() {
        return "Multiple sources".to_string();
    }
    let mut text = format!("Sources: {}", sources.iter().take(3).join(", "));
    if sources.len() > 3 {
        let _ = write!(text, " and {} more", sources.len() - 3);
    }
    text
}

/// The inner HTML of the listing section.
pub fn render_listing(posts: &[PostEntry], now: DateTime<Utc>) -> String {
    if posts.is_empty() {
        return "            <div class=\"no-posts\">\n                <p>No articles available yet. Check back soon!</p>\n            </div>\n".to_string();
    }

    let mut out = String::new();
    for post in posts {
        let href = format!("./posts/{}", encode_double_quoted_attribute(&post.filename));
        let title = encode_text(&post.title);
        let volume = if post.search_volume.is_empty() {
            "Trending"
        } else {
            post.search_volume.as_str()
        };
        let _ = write!(
            out,
            r#"            <article class="post-preview">
                <h2><a href="{href}">{title}</a></h2>
                <p class="post-summary">Latest updates on {summary}. Click to read the full report.</p>
                <div class="post-meta">
                    <span class="post-date">{ago}</span>
                    <span class="post-sources">{sources}</span>
                    <span class="search-volume">{volume}</span>
                </div>
            </article>
"#,
            summary = encode_text(&post.title.to_lowercase()),
            ago = time_ago(post.timestamp, now),
            sources = encode_text(&sources_text(&post.sources)),
            volume = encode_text(volume),
        );
    }
    out
}

/// Rewrite the listing section of the site index from the posts index.
///
/// Returns `Ok(false)` when the site index or its listing section is missing;
/// that is logged and otherwise ignored.
#[instrument(level = "info", skip_all, fields(site_index = %site_index.display()))]
pub async fn update_listing(
    site_index: &Path,
    posts_index: &Path,
    limit: usize,
    now: DateTime<Utc>,
) -> Result<bool, PersistenceFailure> {
    let content = match fs::read_to_string(site_index).await {
        Ok(content) => content,
        Err(e) => {
            warn!(error = %e, "Site index not found; listing not updated");
            return Ok(false);
        }
    };
    if !LATEST_POSTS.is_match(&content) {
        warn!("Site index has no latest-posts section; listing not updated");
        return Ok(false);
    }

    let posts = latest_posts(&load_posts(posts_index).await, limit);
    let section = format!(
        "<section id=\"latest-posts\">\n{}        </section>",
        render_listing(&posts, now)
    );
    let updated = LATEST_POSTS.replace(&content, NoExpand(&section));
    fs::write(site_index, updated.as_bytes())
        .await
        .map_err(|e| PersistenceFailure::io(site_index, e))?;
    info!(count = posts.len(), "Listing updated");
    Ok(true)
}

/// Delete documents older than `retention` and drop them from the posts index.
///
/// Returns the removed filenames.
#[instrument(level = "info", skip_all, fields(posts_dir = %posts_dir.display()))]
pub async fn prune_posts(
    posts_dir: &Path,
    posts_index: &Path,
    retention: Duration,
    now: DateTime<Utc>,
) -> Result<Vec<String>, PersistenceFailure> {
    let cutoff = now - retention;
    let mut removed = Vec::new();

    let mut entries = match fs::read_dir(posts_dir).await {
        Ok(entries) => entries,
        Err(e) => {
            warn!(error = %e, "Posts directory unreadable; nothing pruned");
            return Ok(removed);
        }
    };
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| PersistenceFailure::io(posts_dir, e))?
    {
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.ends_with(".html") {
            continue;
        }
        let modified = match entry.metadata().await.and_then(|m| m.modified()) {
            Ok(t) => DateTime::<Utc>::from(t),
            Err(e) => {
                warn!(file = %name, error = %e, "No modification time; kept");
                continue;
            }
        };
        if modified < cutoff {
            match fs::remove_file(entry.path()).await {
                Ok(()) => {
                    info!(file = %name, "Removed old post");
                    removed.push(name);
                }
                Err(e) => warn!(file = %name, error = %e, "Could not remove old post"),
            }
        }
    }

    if !removed.is_empty() {
        let posts = load_posts(posts_index).await;
        let before = posts.len();
        let kept: Vec<PostEntry> = posts
            .into_iter()
            .filter(|p| !removed.contains(&p.filename))
            .collect();
        if kept.len() != before {
            save_posts(posts_index, &kept).await?;
        }
    }
    Ok(removed)
}
