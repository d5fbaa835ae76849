//! Error kinds for the topic pipeline.
//!
//! Every external failure is mapped to one of these values so callers can
//! decide on a fallback by matching the kind instead of catching everything:
//!
//! | Kind | Raised by | Handling |
//! |------|-----------|----------|
//! | [`SourceError`] | feeds, search | skip the source, continue the cascade |
//! | [`FetchError`] | page/archive fetches | recoverable, routed to a fallback |
//! | [`ExtractionFailure`] | page extraction | category fallback lines |
//! | [`PersistenceFailure`] | ledger, indexes, archive | logged, run continues |
//! | [`PipelineError::Exhaustion`] | topic selection | halts the run, no articles |

use thiserror::Error;

/// A topic or search source could not be used.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source {source_name} unavailable: {reason}")]
    Unavailable { source_name: String, reason: String },

    #[error("source {source_name} returned unparseable data: {reason}")]
    Parse { source_name: String, reason: String },
}

impl SourceError {
    pub fn unavailable(source_name: &str, reason: impl ToString) -> Self {
        Self::Unavailable {
            source_name: source_name.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn parse(source_name: &str, reason: impl ToString) -> Self {
        Self::Parse {
            source_name: source_name.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// A single HTTP round trip failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("HTTP status {0}")]
    Status(u16),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = e.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Connection(e.to_string())
        }
    }
}

/// A fetched page could not be turned into usable lines.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractionFailure {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("non-success status {0}")]
    Status(u16),

    #[error("content type {0:?} is not HTML")]
    NotHtml(String),

    #[error("no meaningful lines in page")]
    Empty,
}

/// Writing a ledger, index or archive failed.
#[derive(Debug, Error)]
pub enum PersistenceFailure {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl PersistenceFailure {
    pub fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Run-level failures.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("all topic tiers exhausted without a fresh topic (requested {requested})")]
    Exhaustion { requested: usize },

    #[error(transparent)]
    Persistence(#[from] PersistenceFailure),
}
