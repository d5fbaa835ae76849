//! Topic sources, one per tier of the selection cascade.
//!
//! Each tier turns raw feed records into [`Topic`] candidates. The selector
//! walks the tiers in [`TopicTier::CASCADE`] order and only moves to the next
//! tier while it still needs topics.
//!
//! # Tiers
//!
//! | Tier | Module | Input | Filters |
//! |------|--------|-------|---------|
//! | Trends | [`rss`] | trend RSS | first `2·N` entries |
//! | News | [`rss`] | curated RSS | top 2 per feed, ≤7 days old |
//! | Social | [`reddit`] | listing JSON | score > 500, ≤24h old, no media hosts |
//! | Expanded | [`rss`] | secondary RSS | first 10, title > 10 chars, ≤7 days old |
//! | Static | [`fallback`] | built in | none |
//! | Emergency | [`fallback`] | built in, date-stamped | none |
//!
//! Network access goes through the [`FeedFetcher`] collaborator so tiers can
//! be exercised against in-memory feeds.

pub mod fallback;
pub mod reddit;
pub mod rss;

use crate::config::{FeedSpec, GeneratorConfig};
use crate::error::SourceError;
use crate::models::{FeedRecord, Topic};
use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;

/// Wire format of a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFormat {
    Rss,
    RedditListing,
}

/// Read-only access to feeds.
pub trait FeedFetcher {
    /// Fetch and parse one feed into raw records.
    async fn fetch_feed(
        &self,
        feed: &FeedSpec,
        format: FeedFormat,
    ) -> Result<Vec<FeedRecord>, SourceError>;
}

/// One ranked source in the cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicTier {
    Trends,
    News,
    Social,
    Expanded,
    Static,
    Emergency,
}

impl TopicTier {
    pub const CASCADE: [TopicTier; 6] = [
        TopicTier::Trends,
        TopicTier::News,
        TopicTier::Social,
        TopicTier::Expanded,
        TopicTier::Static,
        TopicTier::Emergency,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TopicTier::Trends => "trends",
            TopicTier::News => "news",
            TopicTier::Social => "social",
            TopicTier::Expanded => "expanded",
            TopicTier::Static => "static",
            TopicTier::Emergency => "emergency",
        }
    }

    /// Feeds this tier reads; empty for the built-in tiers.
    pub fn feeds<'a>(&self, config: &'a GeneratorConfig) -> &'a [FeedSpec] {
        match self {
            TopicTier::Trends => &config.trend_feeds,
            TopicTier::News => &config.news_feeds,
            TopicTier::Social => &config.social_feeds,
            TopicTier::Expanded => &config.expanded_feeds,
            TopicTier::Static | TopicTier::Emergency => &[],
        }
    }

    pub fn format(&self) -> FeedFormat {
        match self {
            TopicTier::Social => FeedFormat::RedditListing,
            _ => FeedFormat::Rss,
        }
    }

    /// Turn the records of one feed into candidates for this tier.
    pub fn candidates<R: Rng>(
        &self,
        feed: &FeedSpec,
        records: Vec<FeedRecord>,
        num_topics: usize,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Vec<Topic> {
        match self {
            TopicTier::Trends => rss::trend_topics(feed, records, num_topics * 2, now),
            TopicTier::News => rss::news_topics(feed, records, now, rng),
            TopicTier::Social => reddit::social_topics(records, now),
            TopicTier::Expanded => rss::expanded_topics(feed, records, now, rng),
            TopicTier::Static | TopicTier::Emergency => self.builtin_candidates(now.date_naive(), now, rng),
        }
    }

    /// Candidates of a built-in tier, which needs no fetching. `today` is the
    /// ledger's day and dates the generated titles.
    pub fn builtin_candidates<R: Rng>(
        &self,
        today: NaiveDate,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Vec<Topic> {
        match self {
            TopicTier::Static => fallback::static_topics(today, now),
            TopicTier::Emergency => fallback::emergency_topics(today, now, rng),
            _ => Vec::new(),
        }
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, TopicTier::Static | TopicTier::Emergency)
    }
}

/// Cut a headline to 100 characters, ending in `"..."` when shortened.
pub fn clip_title(title: &str) -> String {
    let title = title.trim();
    if title.chars().count() > 100 {
        let head: String = title.chars().take(97).collect();
        format!("{head}...")
    } else {
        title.to_string()
    }
}

/// Truncate to at most `max` characters.
pub fn clip_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cascade_order() {
        let names: Vec<_> = TopicTier::CASCADE.iter().map(|t| t.name()).collect();
        assert_eq!(
            names,
            vec!["trends", "news", "social", "expanded", "static", "emergency"]
        );
    }

    #[test]
    fn test_builtin_tiers_have_no_feeds() {
        let config = GeneratorConfig::default();
        assert!(TopicTier::Static.feeds(&config).is_empty());
        assert!(TopicTier::Emergency.feeds(&config).is_empty());
        assert_eq!(TopicTier::News.feeds(&config).len(), 5);
        assert_eq!(TopicTier::Social.format(), FeedFormat::RedditListing);
    }

    #[test]
    fn test_clip_title() {
        assert_eq!(clip_title("  short  "), "short");
        let long = "x".repeat(150);
        let clipped = clip_title(&long);
        assert_eq!(clipped.chars().count(), 100);
        assert!(clipped.ends_with("..."));
    }
}
