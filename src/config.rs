//! Runtime configuration.
//!
//! Every knob has a default matching the production feeds and politeness
//! settings, so the binary runs without a config file. An optional YAML file
//! overrides any subset of fields:
//!
//! ```yaml
//! num_topics: 5
//! delays:
//!   between_topics_ms: 0
//! news_feeds:
//!   - name: BBC News
//!     url: https://feeds.bbci.co.uk/news/rss.xml
//! ```

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};

/// A named feed URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSpec {
    pub name: String,
    pub url: String,
}

impl FeedSpec {
    pub fn new(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
        }
    }
}

/// Per-call timeouts, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub feed_secs: u64,
    pub search_secs: u64,
    pub page_secs: u64,
    pub summary_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            feed_secs: 10,
            search_secs: 10,
            page_secs: 15,
            summary_secs: 10,
        }
    }
}

/// Politeness pauses between successive external calls, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Delays {
    pub between_urls_ms: u64,
    pub between_topics_ms: u64,
    pub between_dates_ms: u64,
    pub retry_pass_ms: u64,
}

impl Default for Delays {
    fn default() -> Self {
        Self {
            between_urls_ms: 1_000,
            between_topics_ms: 2_000,
            between_dates_ms: 300,
            retry_pass_ms: 500,
        }
    }
}

impl Delays {
    /// All pauses disabled.
    #[cfg(test)]
    pub fn none() -> Self {
        Self {
            between_urls_ms: 0,
            between_topics_ms: 0,
            between_dates_ms: 0,
            retry_pass_ms: 0,
        }
    }

    pub fn between_urls(&self) -> Duration {
        Duration::from_millis(self.between_urls_ms)
    }

    pub fn between_topics(&self) -> Duration {
        Duration::from_millis(self.between_topics_ms)
    }

    pub fn between_dates(&self) -> Duration {
        Duration::from_millis(self.between_dates_ms)
    }

    pub fn retry_pass(&self) -> Duration {
        Duration::from_millis(self.retry_pass_ms)
    }
}

/// Full generator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub num_topics: usize,
    pub search_results: usize,
    pub listing_limit: usize,
    pub retention_hours: i64,
    pub checkpoint_every: usize,
    pub user_agent: String,
    pub timeouts: Timeouts,
    pub delays: Delays,
    pub trend_feeds: Vec<FeedSpec>,
    pub news_feeds: Vec<FeedSpec>,
    pub social_feeds: Vec<FeedSpec>,
    pub expanded_feeds: Vec<FeedSpec>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            num_topics: 3,
            search_results: 3,
            listing_limit: 10,
            retention_hours: 24,
            checkpoint_every: 20,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36".to_string(),
            timeouts: Timeouts::default(),
            delays: Delays::default(),
            trend_feeds: vec![
                FeedSpec::new(
                    "Google Trends US",
                    "https://trends.google.com/trends/trendingsearches/daily/rss?geo=US",
                ),
                FeedSpec::new(
                    "Google Trends GB",
                    "https://trends.google.com/trends/trendingsearches/daily/rss?geo=GB",
                ),
            ],
            news_feeds: vec![
                FeedSpec::new("BBC News", "https://feeds.bbci.co.uk/news/rss.xml"),
                FeedSpec::new("CNN", "https://rss.cnn.com/rss/edition.rss"),
                FeedSpec::new("Reuters", "https://feeds.reuters.com/reuters/topNews"),
                FeedSpec::new("Associated Press", "https://feeds.ap.org/ap/rss/general.rss"),
                FeedSpec::new("The Guardian", "https://www.theguardian.com/world/rss"),
            ],
            social_feeds: vec![
                FeedSpec::new("reddit_news", "https://www.reddit.com/r/news/hot.json?limit=10"),
                FeedSpec::new(
                    "reddit_worldnews",
                    "https://www.reddit.com/r/worldnews/hot.json?limit=10",
                ),
            ],
            expanded_feeds: vec![
                FeedSpec::new("Reuters Technology", "https://feeds.reuters.com/reuters/technologyNews"),
                FeedSpec::new("Reuters Business", "https://feeds.reuters.com/reuters/businessNews"),
                FeedSpec::new("Reuters Health", "https://feeds.reuters.com/reuters/healthNews"),
                FeedSpec::new("Reuters Environment", "https://feeds.reuters.com/reuters/environment"),
                FeedSpec::new("Reuters Science", "https://feeds.reuters.com/reuters/scienceNews"),
                FeedSpec::new("Al Jazeera", "https://www.aljazeera.com/xml/rss/all.xml"),
                FeedSpec::new("Sky News World", "https://feeds.skynews.com/feeds/rss/world.xml"),
                FeedSpec::new(
                    "Sky News Technology",
                    "https://feeds.skynews.com/feeds/rss/technology.xml",
                ),
                FeedSpec::new("CNN Tech", "https://rss.cnn.com/rss/cnn_tech.rss"),
                FeedSpec::new("CNN Money", "https://rss.cnn.com/rss/money_latest.rss"),
            ],
        }
    }
}

impl GeneratorConfig {
    /// Load the YAML file at `path`, or the defaults when no path is given.
    #[instrument(level = "info", skip_all)]
    pub fn load(path: Option<&Path>) -> Result<Self, Box<dyn Error>> {
        match path {
            None => Ok(Self::default()),
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                let config: Self = serde_yaml::from_str(&raw)?;
                info!(path = %path.display(), num_topics = config.num_topics, "Loaded configuration");
                Ok(config)
            }
        }
    }
}
