//! Data models handed between pipeline stages.
//!
//! This module defines the core data structures used throughout the application:
//! - [`FeedRecord`]: a raw entry from any topic source
//! - [`Topic`]: a selected news subject with its derived normalized key
//! - [`SourceExtract`] / [`ResearchBundle`]: what research gathered for a topic
//! - [`Article`]: the synthesized six-paragraph body plus attributions
//! - [`PostEntry`]: one produced document in the posts index
//!
//! Each value is created by one stage and moved into the next. Nothing here is
//! mutated after construction.

use crate::normalize::{clean_search_query, normalize};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A raw record as returned by a feed collaborator.
///
/// RSS items, Reddit posts and the curated pools all reduce to this shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedRecord {
    pub title: String,
    pub publish_time: Option<DateTime<Utc>>,
    pub summary: String,
    pub link: String,
    /// Discussion score, only set by social sources.
    pub engagement_score: Option<i64>,
    /// Approximate traffic reported by trend feeds (e.g. `"200K+"`).
    pub traffic: Option<String>,
}

#[cfg(test)]
impl FeedRecord {
    pub fn titled(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Default::default()
        }
    }
}

/// A candidate news subject.
///
/// Construct with [`Topic::new`], which derives the normalized key and the
/// search query so neither can be missing or stale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub title: String,
    pub normalized_key: String,
    pub traffic_estimate: String,
    pub source_tag: String,
    pub search_query: String,
    pub publish_time: DateTime<Utc>,
    pub description: String,
}

impl Topic {
    /// Build a topic from a title and its source metadata.
    ///
    /// Returns `None` when the title is blank.
    pub fn new(
        title: &str,
        source_tag: &str,
        traffic_estimate: &str,
        publish_time: DateTime<Utc>,
        description: &str,
    ) -> Option<Self> {
        let title = title.trim();
        if title.is_empty() {
            return None;
        }
        Some(Self {
            title: title.to_string(),
            normalized_key: normalize(title),
            traffic_estimate: traffic_estimate.to_string(),
            source_tag: source_tag.to_string(),
            search_query: clean_search_query(title),
            publish_time,
            description: description.to_string(),
        })
    }

    /// Replace the derived search query (curated pools ship their own).
    pub fn with_search_query(mut self, query: &str) -> Self {
        self.search_query = query.to_string();
        self
    }
}

/// Where the lines of a [`SourceExtract`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractOrigin {
    /// Lines were pulled out of the fetched page.
    Extracted,
    /// Lines were produced by the category fallback generator.
    Fallback,
}

/// Up to three lines gathered for one search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceExtract {
    pub domain: String,
    pub url: String,
    pub lines: Vec<String>,
    pub origin: ExtractOrigin,
}

impl SourceExtract {
    pub fn is_extracted(&self) -> bool {
        self.origin == ExtractOrigin::Extracted
    }
}

/// Everything research produced for a single topic.
#[derive(Debug, Clone)]
pub struct ResearchBundle {
    pub topic: Topic,
    pub extracts: BTreeMap<String, SourceExtract>,
    /// Domains in search-rank order.
    pub order: Vec<String>,
    pub external_summary: Option<String>,
}

impl ResearchBundle {
    pub fn new(topic: Topic) -> Self {
        Self {
            topic,
            extracts: BTreeMap::new(),
            order: Vec::new(),
            external_summary: None,
        }
    }

    /// Insert an extract; a repeated domain keeps its first rank.
    pub fn insert(&mut self, extract: SourceExtract) {
        if !self.extracts.contains_key(&extract.domain) {
            self.order.push(extract.domain.clone());
        }
        self.extracts.insert(extract.domain.clone(), extract);
    }

    /// Extracts in search-rank order.
    pub fn ranked(&self) -> impl Iterator<Item = &SourceExtract> {
        self.order.iter().filter_map(|d| self.extracts.get(d))
    }
}

/// One credited source of an article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribution {
    pub domain: String,
    pub url: String,
}

/// A synthesized article body: exactly six paragraphs in fixed slot order.
#[derive(Debug, Clone)]
pub struct Article {
    pub topic: Topic,
    pub paragraphs: [String; 6],
    pub attributions: Vec<Attribution>,
}

/// A produced document as recorded in the posts index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostEntry {
    pub filename: String,
    pub title: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub search_volume: String,
}

/// A search result candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub url: String,
    pub domain: String,
}

impl SearchHit {
    /// Build a hit from a URL, taking the host as domain.
    pub fn from_url(url: &str) -> Option<Self> {
        let parsed = url::Url::parse(url).ok()?;
        let domain = parsed.host_str()?.to_string();
        Some(Self {
            url: url.to_string(),
            domain,
        })
    }
}

/// A fetched page as seen by the extractor.
#[derive(Debug, Clone)]
pub struct PageResponse {
    pub status: u16,
    pub content_type: String,
    pub body: String,
}
