//! Topic selection: the tiered source cascade.
//!
//! Tiers are consulted in [`TopicTier::CASCADE`] order. Every candidate is
//! reduced to its normalized key and accepted only if that key is new to both
//! the current batch and today's ledger. Selection stops as soon as the target
//! count is reached; later tiers and later feeds within a tier are not
//! fetched at all.
//!
//! A failing feed is skipped. The run only fails when the whole cascade,
//! emergency tier included, yields nothing fresh.

use crate::config::GeneratorConfig;
use crate::error::PipelineError;
use crate::ledger::DailyTopicLedger;
use crate::models::Topic;
use crate::sources::{FeedFetcher, TopicTier};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};

/// Topics accepted so far in this run.
#[derive(Debug, Default)]
struct Batch {
    accepted: Vec<Topic>,
    seen: HashSet<String>,
}

impl Batch {
    /// Accept a candidate unless its key is already taken.
    fn offer(&mut self, topic: Topic, ledger: &DailyTopicLedger) -> bool {
        let key = &topic.normalized_key;
        if key.is_empty() || self.seen.contains(key) || ledger.contains(key) {
            return false;
        }
        self.seen.insert(key.clone());
        self.accepted.push(topic);
        true
    }

    fn len(&self) -> usize {
        self.accepted.len()
    }
}

/// Picks fresh topics from the cascade.
pub struct TopicSelector<'a, F> {
    fetcher: &'a F,
    config: &'a GeneratorConfig,
    rng: StdRng,
}

impl<'a, F: FeedFetcher> TopicSelector<'a, F> {
    pub fn new(fetcher: &'a F, config: &'a GeneratorConfig, seed: u64) -> Self {
        Self {
            fetcher,
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Pick up to `num_topics` topics without touching the ledger.
    #[instrument(level = "info", skip_all, fields(num_topics = num_topics))]
    pub async fn pick(
        &mut self,
        num_topics: usize,
        ledger: &DailyTopicLedger,
        now: DateTime<Utc>,
    ) -> Vec<Topic> {
        let mut batch = Batch::default();
        info!(already_used = ledger.len(), "Selecting trending topics");

        for tier in TopicTier::CASCADE {
            if batch.len() >= num_topics {
                break;
            }
            let before = batch.len();

            if tier.is_builtin() {
                for topic in tier.builtin_candidates(ledger.date(), now, &mut self.rng) {
                    if batch.len() >= num_topics {
                        break;
                    }
                    batch.offer(topic, ledger);
                }
            } else {
                for feed in tier.feeds(self.config) {
                    if batch.len() >= num_topics {
                        break;
                    }
                    let records = match self.fetcher.fetch_feed(feed, tier.format()).await {
                        Ok(records) => records,
                        Err(e) => {
                            warn!(tier = tier.name(), feed = %feed.name, error = %e, "Feed unavailable; skipping");
                            continue;
                        }
                    };
                    debug!(tier = tier.name(), feed = %feed.name, records = records.len(), "Fetched feed");
                    let candidates =
                        tier.candidates(feed, records, num_topics, now, &mut self.rng);
                    for topic in candidates {
                        if batch.len() >= num_topics {
                            break;
                        }
                        batch.offer(topic, ledger);
                    }
                }
            }

            info!(
                tier = tier.name(),
                accepted = batch.len() - before,
                total = batch.len(),
                "Tier finished"
            );
        }

        batch.accepted
    }

    /// Pick topics, record their keys in the ledger and save it.
    ///
    /// Fails with [`PipelineError::Exhaustion`] only when nothing fresh was
    /// found anywhere in the cascade.
    pub async fn select(
        &mut self,
        num_topics: usize,
        ledger: &mut DailyTopicLedger,
        now: DateTime<Utc>,
    ) -> Result<Vec<Topic>, PipelineError> {
        let topics = self.pick(num_topics, ledger, now).await;
        if topics.is_empty() && num_topics > 0 {
            return Err(PipelineError::Exhaustion {
                requested: num_topics,
            });
        }
        if topics.len() < num_topics {
            warn!(found = topics.len(), requested = num_topics, "Fewer topics than requested");
        }

        ledger.record(topics.iter().map(|t| t.normalized_key.clone()));
        ledger.save().await;

        for (i, topic) in topics.iter().enumerate() {
            info!(index = i + 1, title = %topic.title, source = %topic.source_tag, "Selected topic");
        }
        Ok(topics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeedSpec;
    use crate::error::SourceError;
    use crate::models::FeedRecord;
    use crate::normalize::normalize;
    use crate::sources::FeedFormat;
    use chrono::{NaiveDate, TimeZone};
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// In-memory feeds keyed by URL; unknown URLs fail.
    #[derive(Default)]
    struct FakeFeeds {
        feeds: HashMap<String, Vec<FeedRecord>>,
        calls: RefCell<Vec<String>>,
    }

    impl FakeFeeds {
        fn with(mut self, url: &str, titles: &[&str]) -> Self {
            let records = titles
                .iter()
                .map(|t| FeedRecord {
                    title: t.to_string(),
                    publish_time: Some(now()),
                    engagement_score: Some(5_000),
                    ..Default::default()
                })
                .collect();
            self.feeds.insert(url.to_string(), records);
            self
        }
    }

    impl FeedFetcher for FakeFeeds {
        async fn fetch_feed(
            &self,
            feed: &FeedSpec,
            _format: FeedFormat,
        ) -> Result<Vec<FeedRecord>, SourceError> {
            self.calls.borrow_mut().push(feed.url.clone());
            self.feeds
                .get(&feed.url)
                .cloned()
                .ok_or_else(|| SourceError::unavailable(&feed.name, "connection refused"))
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 7, 12, 0, 0).unwrap()
    }

    fn ledger() -> DailyTopicLedger {
        DailyTopicLedger::empty("unused.json", NaiveDate::from_ymd_opt(2025, 5, 7).unwrap())
    }

    fn config() -> GeneratorConfig {
        GeneratorConfig {
            trend_feeds: vec![FeedSpec::new("trends", "mem://trends")],
            news_feeds: vec![
                FeedSpec::new("news-a", "mem://news-a"),
                FeedSpec::new("news-b", "mem://news-b"),
            ],
            social_feeds: vec![FeedSpec::new("social", "mem://social")],
            expanded_feeds: vec![FeedSpec::new("expanded", "mem://expanded")],
            ..GeneratorConfig::default()
        }
    }

    fn assert_distinct(topics: &[Topic]) {
        let keys: HashSet<_> = topics.iter().map(|t| t.normalized_key.as_str()).collect();
        assert_eq!(keys.len(), topics.len());
    }

    #[tokio::test]
    async fn test_same_story_twice_survives_once() {
        let feeds = FakeFeeds::default().with(
            "mem://trends",
            &[
                "Breaking: Tech Firm Reports Record Earnings",
                "Tech Firm Reports Record Earnings Today",
            ],
        );
        let config = config();
        let mut selector = TopicSelector::new(&feeds, &config, 1);
        let topics = selector.pick(2, &ledger(), now()).await;

        let matching: Vec<_> = topics
            .iter()
            .filter(|t| t.normalized_key == "earnings firm record reports tech")
            .collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].title, "Breaking: Tech Firm Reports Record Earnings");
        assert_eq!(topics.len(), 2);
        assert_distinct(&topics);
    }

    #[tokio::test]
    async fn test_exact_count_with_internal_duplicates() {
        // 8 raw candidates, 4 distinct keys, N = 3.
        let feeds = FakeFeeds::default().with(
            "mem://trends",
            &[
                "Storm hits coast",
                "Breaking: Storm hits coast",
                "Coast hits storm",
                "Election results announced",
                "Update: Election results announced today",
                "Bridge reopens after repairs",
                "Bridge reopens after repairs now",
                "Museum unveils painting",
            ],
        );
        let config = GeneratorConfig {
            news_feeds: vec![],
            social_feeds: vec![],
            expanded_feeds: vec![],
            ..config()
        };
        let mut selector = TopicSelector::new(&feeds, &config, 1);
        let topics = selector.pick(3, &ledger(), now()).await;
        assert_eq!(topics.len(), 3);
        assert_distinct(&topics);
        assert_eq!(topics[0].title, "Storm hits coast");
        assert_eq!(topics[1].title, "Election results announced");
        assert_eq!(topics[2].title, "Bridge reopens after repairs");
    }

    #[tokio::test]
    async fn test_ledger_keys_are_skipped() {
        let feeds = FakeFeeds::default().with(
            "mem://trends",
            &["Storm hits coast", "Election results announced"],
        );
        let config = config();
        let mut ledger = ledger();
        ledger.record([normalize("Storm hits coast")]);

        let mut selector = TopicSelector::new(&feeds, &config, 1);
        let topics = selector.pick(1, &ledger, now()).await;
        assert_eq!(topics.len(), 1);
        assert_eq!(topics[0].title, "Election results announced");
    }

    #[tokio::test]
    async fn test_later_tiers_not_fetched_once_target_met() {
        let feeds = FakeFeeds::default().with(
            "mem://trends",
            &["Storm hits coast", "Election results announced"],
        );
        let config = config();
        let mut selector = TopicSelector::new(&feeds, &config, 1);
        let topics = selector.pick(2, &ledger(), now()).await;
        assert_eq!(topics.len(), 2);
        assert_eq!(*feeds.calls.borrow(), vec!["mem://trends".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_feeds_fall_through_to_next_tier() {
        // Trends and the first news feed are down.
        let feeds = FakeFeeds::default()
            .with("mem://news-b", &["Council approves new transit plan"])
            .with("mem://social", &["Volcano erupts near village"]);
        let config = config();
        let mut selector = TopicSelector::new(&feeds, &config, 1);
        let topics = selector.pick(2, &ledger(), now()).await;

        let titles: Vec<_> = topics.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Council approves new transit plan", "Volcano erupts near village"]
        );
        assert_eq!(topics[1].source_tag, "reddit_news");
    }

    #[tokio::test]
    async fn test_total_outage_uses_static_pool() {
        let feeds = FakeFeeds::default();
        let config = config();
        let mut selector = TopicSelector::new(&feeds, &config, 1);
        let topics = selector.pick(3, &ledger(), now()).await;
        assert_eq!(topics.len(), 3);
        assert!(topics.iter().all(|t| t.source_tag == "fallback"));
    }

    #[tokio::test]
    async fn test_emergency_tier_after_static_pool_used() {
        let feeds = FakeFeeds::default();
        let config = config();
        let mut ledger = ledger();
        let mut rng = StdRng::seed_from_u64(0);
        let today = ledger.date();
        ledger.record(
            TopicTier::Static
                .builtin_candidates(today, now(), &mut rng)
                .into_iter()
                .map(|t| t.normalized_key),
        );

        let mut selector = TopicSelector::new(&feeds, &config, 1);
        let topics = selector.pick(3, &ledger, now()).await;
        assert_eq!(topics.len(), 3);
        assert!(topics.iter().all(|t| t.source_tag == "emergency"));
        assert!(topics.iter().all(|t| t.title.contains("May 07, 2025")));
    }

    #[tokio::test]
    async fn test_emergency_titles_use_ledger_day() {
        let feeds = FakeFeeds::default();
        let config = config();
        // Local day still the 6th while UTC has moved on to the 7th.
        let mut ledger =
            DailyTopicLedger::empty("unused.json", NaiveDate::from_ymd_opt(2025, 5, 6).unwrap());
        let mut rng = StdRng::seed_from_u64(0);
        let today = ledger.date();
        ledger.record(
            TopicTier::Static
                .builtin_candidates(today, now(), &mut rng)
                .into_iter()
                .map(|t| t.normalized_key),
        );

        let mut selector = TopicSelector::new(&feeds, &config, 1);
        let topics = selector.pick(2, &ledger, now()).await;
        assert_eq!(topics.len(), 2);
        assert!(topics.iter().all(|t| t.title.ends_with("May 06, 2025")));
    }

    #[tokio::test]
    async fn test_select_records_and_saves_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daily_topics.json");
        let today = NaiveDate::from_ymd_opt(2025, 5, 7).unwrap();
        let mut ledger = DailyTopicLedger::load(&path, today).await;

        let feeds = FakeFeeds::default().with("mem://trends", &["Storm hits coast"]);
        let config = config();
        let mut selector = TopicSelector::new(&feeds, &config, 1);
        let topics = selector.select(1, &mut ledger, now()).await.unwrap();

        assert_eq!(topics.len(), 1);
        assert!(ledger.contains("coast hits storm"));
        let reloaded = DailyTopicLedger::load(&path, today).await;
        assert!(reloaded.contains("coast hits storm"));
    }

    #[tokio::test]
    async fn test_exhaustion_when_everything_used() {
        let feeds = FakeFeeds::default();
        let config = config();
        let mut ledger = ledger();
        let mut rng = StdRng::seed_from_u64(0);
        let today = ledger.date();
        for tier in [TopicTier::Static, TopicTier::Emergency] {
            ledger.record(
                tier.builtin_candidates(today, now(), &mut rng)
                    .into_iter()
                    .map(|t| t.normalized_key),
            );
        }

        let mut selector = TopicSelector::new(&feeds, &config, 1);
        let result = selector.select(3, &mut ledger, now()).await;
        assert!(matches!(
            result,
            Err(PipelineError::Exhaustion { requested: 3 })
        ));
    }
}
