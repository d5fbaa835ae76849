//! Bulk backfill of the on-this-day archive.
//!
//! The archive holds one JSON payload per calendar date (366 of them, Feb 29
//! included), keyed `MM-DD`. [`fetch_all`] walks every date in order, skips
//! dates already present, saves a checkpoint after every `checkpoint_every`
//! fetch attempts and finally makes a single retry pass over the dates that
//! failed. Cached dates do not count towards the cadence, so an interruption
//! loses at most `checkpoint_every` fetched dates.

use crate::config::Delays;
use crate::error::{FetchError, PersistenceFailure};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

/// Number of distinct calendar dates, leap day included.
pub const CALENDAR_DATES: usize = 366;

/// Source of one day's archive payload.
pub trait DayFetcher {
    async fn fetch_day(&self, month: u32, day: u32) -> Result<serde_json::Value, FetchError>;
}

/// A stored payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveEntry {
    pub data: serde_json::Value,
    pub fetched_date: DateTime<Utc>,
    #[serde(default = "first_attempt")]
    pub attempt: u8,
}

fn first_attempt() -> u8 {
    1
}

/// Every calendar date as `(month, day)`, in order.
pub fn calendar_dates() -> Vec<(u32, u32)> {
    // 2024 is a leap year, so it covers Feb 29.
    let Some(start) = NaiveDate::from_ymd_opt(2024, 1, 1) else {
        return Vec::new();
    };
    (0..CALENDAR_DATES as i64)
        .map(|offset| start + Duration::days(offset))
        .map(|d| (d.month(), d.day()))
        .collect()
}

pub fn date_key(month: u32, day: u32) -> String {
    format!("{month:02}-{day:02}")
}

/// The on-disk date archive.
#[derive(Debug, Clone)]
pub struct DateArchive {
    entries: BTreeMap<String, ArchiveEntry>,
    path: PathBuf,
}

impl DateArchive {
    /// Load the archive at `path`; anything unreadable yields an empty archive.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let entries = match fs::read_to_string(path).await {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(error = %e, "Archive corrupt; starting empty");
                BTreeMap::new()
            }),
            Err(e) => {
                debug!(error = %e, "No archive on disk; starting empty");
                BTreeMap::new()
            }
        };
        Self {
            entries,
            path: path.to_path_buf(),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    #[cfg(test)]
    pub fn get(&self, key: &str) -> Option<&ArchiveEntry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn insert(&mut self, key: String, entry: ArchiveEntry) {
        self.entries.insert(key, entry);
    }

    pub async fn save(&self) -> Result<(), PersistenceFailure> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| PersistenceFailure::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, json)
            .await
            .map_err(|e| PersistenceFailure::io(&self.path, e))
    }

    /// Summary of what the archive holds as of `now`.
    pub fn stats(&self, now: DateTime<Utc>) -> ArchiveStats {
        let mut by_year = BTreeMap::new();
        for entry in self.entries.values() {
            *by_year.entry(entry.fetched_date.year()).or_insert(0) += 1;
        }
        let current_year = by_year.get(&now.year()).copied().unwrap_or(0);
        ArchiveStats {
            total: self.entries.len(),
            current_year,
            previous_years: self.entries.len() - current_year,
            retried: self.entries.values().filter(|e| e.attempt > 1).count(),
            by_year,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveStats {
    pub total: usize,
    pub current_year: usize,
    pub previous_years: usize,
    /// Entries that only succeeded on the retry pass.
    pub retried: usize,
    pub by_year: BTreeMap<i32, usize>,
}

impl ArchiveStats {
    pub fn completion_pct(&self) -> f64 {
        self.total as f64 / CALENDAR_DATES as f64 * 100.0
    }

    pub fn remaining(&self) -> usize {
        CALENDAR_DATES.saturating_sub(self.total)
    }
}

/// Outcome of a [`fetch_all`] run.
#[derive(Debug, Default)]
pub struct BackfillReport {
    /// Dates present after the run, cached ones included.
    pub available: usize,
    pub cached: usize,
    pub recovered_on_retry: usize,
    pub checkpoints: usize,
    /// Dates that failed both passes.
    pub failed: Vec<(String, FetchError)>,
}

async fn fetch_into<F: DayFetcher>(
    fetcher: &F,
    archive: &mut DateArchive,
    (month, day): (u32, u32),
    attempt: u8,
) -> Result<(), FetchError> {
    let data = fetcher.fetch_day(month, day).await?;
    archive.insert(
        date_key(month, day),
        ArchiveEntry {
            data,
            fetched_date: Utc::now(),
            attempt,
        },
    );
    Ok(())
}

async fn checkpoint(archive: &DateArchive, report: &mut BackfillReport) {
    match archive.save().await {
        Ok(()) => {
            report.checkpoints += 1;
            info!(available = report.available, "Progress saved");
        }
        Err(e) => warn!(error = %e, "Checkpoint save failed"),
    }
}

/// Fill every missing date, then retry the failures once.
#[instrument(level = "info", skip_all, fields(cached = archive.len()))]
pub async fn fetch_all<F: DayFetcher>(
    fetcher: &F,
    archive: &mut DateArchive,
    delays: &Delays,
    checkpoint_every: usize,
) -> BackfillReport {
    let mut report = BackfillReport::default();
    let mut failed = Vec::new();
    let every = checkpoint_every.max(1);
    let mut fetched_since_save = 0;

    for date in calendar_dates() {
        let key = date_key(date.0, date.1);
        if archive.contains(&key) {
            report.cached += 1;
            report.available += 1;
            continue;
        }

        match fetch_into(fetcher, archive, date, 1).await {
            Ok(()) => {
                report.available += 1;
                debug!(%key, "Fetched");
            }
            Err(e) => {
                warn!(%key, error = %e, "Fetch failed");
                failed.push((date, e));
            }
        }

        fetched_since_save += 1;
        if fetched_since_save >= every {
            checkpoint(archive, &mut report).await;
            fetched_since_save = 0;
        }
        if !delays.between_dates().is_zero() {
            sleep(delays.between_dates()).await;
        }
    }

    if !failed.is_empty() {
        info!(count = failed.len(), "Retrying failed dates");
    }
    for (date, first_error) in failed {
        let key = date_key(date.0, date.1);
        match fetch_into(fetcher, archive, date, 2).await {
            Ok(()) => {
                report.available += 1;
                report.recovered_on_retry += 1;
            }
            Err(e) => {
                warn!(%key, first = %first_error, error = %e, "Retry failed");
                report.failed.push((key, e));
            }
        }
        if !delays.retry_pass().is_zero() {
            sleep(delays.retry_pass()).await;
        }
    }

    checkpoint(archive, &mut report).await;
    info!(
        available = report.available,
        total = CALENDAR_DATES,
        recovered = report.recovered_on_retry,
        failed = report.failed.len(),
        "Backfill complete"
    );
    report
}
