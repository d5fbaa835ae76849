//! The daily topic ledger.
//!
//! Records the normalized key of every topic selected "today" so a later run
//! on the same calendar day never picks the same story again. The ledger is a
//! plain value: loaded once at the start of a run, mutated in memory, saved at
//! well-defined points.
//!
//! # Storage
//!
//! ```text
//! { "date": "2025-05-06", "topics": ["earnings firm record reports tech", ...] }
//! ```
//!
//! Loading is fail-open: a missing, unreadable or corrupt file yields an empty
//! ledger for today, and a file written on another day is discarded.

use crate::error::PersistenceFailure;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument, warn};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Serialize, Deserialize)]
struct LedgerRecord {
    date: String,
    #[serde(default)]
    topics: Vec<String>,
}

/// Normalized keys selected on one calendar day.
#[derive(Debug, Clone)]
pub struct DailyTopicLedger {
    date: NaiveDate,
    keys: BTreeSet<String>,
    path: PathBuf,
}

impl DailyTopicLedger {
    /// An empty ledger for `today` that will be saved to `path`.
    pub fn empty(path: impl Into<PathBuf>, today: NaiveDate) -> Self {
        Self {
            date: today,
            keys: BTreeSet::new(),
            path: path.into(),
        }
    }

    /// Load the ledger stored at `path` for `today`.
    ///
    /// Never fails: anything unusable on disk is treated as an empty ledger.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display(), %today))]
    pub async fn load(path: impl AsRef<Path>, today: NaiveDate) -> Self {
        let path = path.as_ref();
        let mut ledger = Self::empty(path, today);

        let raw = match fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No ledger on disk; starting empty");
                return ledger;
            }
            Err(e) => {
                warn!(error = %e, "Ledger unreadable; starting empty");
                return ledger;
            }
        };

        let record: LedgerRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "Ledger corrupt; starting empty");
                return ledger;
            }
        };

        match NaiveDate::parse_from_str(&record.date, DATE_FORMAT) {
            Ok(stored) if stored == today => {
                ledger.keys.extend(record.topics);
                info!(count = ledger.keys.len(), "Loaded today's ledger");
            }
            Ok(stored) => {
                info!(%stored, "Ledger is from another day; discarding");
            }
            Err(e) => {
                warn!(error = %e, date = %record.date, "Ledger date unparseable; starting empty");
            }
        }
        ledger
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Merge keys into the in-memory set.
    pub fn record<I, S>(&mut self, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keys.extend(keys.into_iter().map(Into::into));
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    #[cfg(test)]
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    /// Persist the whole record, overwriting the file.
    pub async fn try_save(&self) -> Result<(), PersistenceFailure> {
        let record = LedgerRecord {
            date: self.date.format(DATE_FORMAT).to_string(),
            topics: self.keys.iter().cloned().collect(),
        };
        let json = serde_json::to_string_pretty(&record)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| PersistenceFailure::io(parent, e))?;
        }
        fs::write(&self.path, json)
            .await
            .map_err(|e| PersistenceFailure::io(&self.path, e))
    }

    /// Best-effort save. A failure is logged and reported as `false`; the run
    /// carries on with the in-memory set.
    #[instrument(level = "info", skip_all, fields(path = %self.path.display()))]
    pub async fn save(&self) -> bool {
        match self.try_save().await {
            Ok(()) => {
                info!(count = self.keys.len(), date = %self.date, "Saved daily ledger");
                true
            }
            Err(e) => {
                warn!(error = %e, "Could not save daily ledger; continuing in memory");
                false
            }
        }
    }
}
