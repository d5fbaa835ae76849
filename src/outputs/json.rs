//! The posts index, `posts/index.json`.
//!
//! A JSON array of [`PostEntry`] records, one per produced document. It is
//! the machine-readable source of the listing section and is rewritten whole
//! on every change.

use crate::error::PersistenceFailure;
use crate::models::PostEntry;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument, warn};

pub const INDEX_FILE: &str = "index.json";

/// Read the index; a missing or corrupt file reads as empty.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub async fn load_posts(path: &Path) -> Vec<PostEntry> {
    let raw = match fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(_) => return Vec::new(),
    };
    serde_json::from_str(&raw).unwrap_or_else(|e| {
        warn!(error = %e, "Posts index corrupt; treating as empty");
        Vec::new()
    })
}

#[instrument(level = "debug", skip_all, fields(path = %path.display(), count = posts.len()))]
pub async fn save_posts(path: &Path, posts: &[PostEntry]) -> Result<(), PersistenceFailure> {
    let json = serde_json::to_string_pretty(posts)?;
    fs::write(path, json)
        .await
        .map_err(|e| PersistenceFailure::io(path, e))
}

/// Append one entry and write the index back.
#[instrument(level = "info", skip_all, fields(path = %path.display(), file = %entry.filename))]
pub async fn append_post(path: &Path, entry: PostEntry) -> Result<(), PersistenceFailure> {
    let mut posts = load_posts(path).await;
    posts.push(entry);
    save_posts(path, &posts).await?;
    info!(count = posts.len(), "Posts index updated");
    Ok(())
}
