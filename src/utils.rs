//! Utility functions for filenames, relative times, logging and file system checks.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

static NON_SLUG: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s-]").expect("valid regex"));
static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-\s]+").expect("valid regex"));

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with an ellipsis and a count of
/// the dropped characters appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 chars)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    let total = s.chars().count();
    if total <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max).collect();
        format!("{head}…(+{} chars)", total - max)
    }
}

/// Turn a title into the slug used for document filenames.
///
/// Punctuation is dropped, runs of hyphens or whitespace become a single
/// hyphen, and the result is cut to 50 characters and lowercased.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(clean_filename("Hello, World!"), "hello-world");
/// ```
pub fn clean_filename(title: &str) -> String {
    let stripped = NON_SLUG.replace_all(title, "");
    let hyphenated = SEPARATORS.replace_all(&stripped, "-");
    hyphenated
        .chars()
        .take(50)
        .collect::<String>()
        .to_lowercase()
}

/// Human-readable age of `timestamp` relative to `now`, e.g. `"3 hours ago"`.
pub fn time_ago(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now.signed_duration_since(timestamp);
    let (n, unit) = if diff.num_hours() < 1 {
        (diff.num_minutes().max(0), "minute")
    } else if diff.num_days() < 1 {
        (diff.num_hours(), "hour")
    } else {
        (diff.num_days(), "day")
    };
    let plural = if n == 1 { "" } else { "s" };
    format!("{n} {unit}{plural} ago")
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then writes and removes a probe file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    // Try a small sync write using std fs (simpler error surface)
    let probe_path = path.join("..__probe_write__");
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Output directory is writable");
    Ok(())
}
