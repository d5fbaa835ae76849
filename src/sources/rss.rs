//! RSS feeds: trend feeds, curated news and the expanded secondary pool.
//!
//! Parsing uses `quick-xml`'s serde support. Only RSS 2.0 `channel/item`
//! documents are understood; Google Trends' `ht:approx_traffic` extension is
//! read when present.

use super::{clip_chars, clip_title};
use crate::config::FeedSpec;
use crate::models::{FeedRecord, Topic};
use chrono::{DateTime, Duration, Utc};
use quick_xml::de::from_str;
use rand::Rng;
use serde::Deserialize;
use tracing::debug;

const NEWS_PER_FEED: usize = 2;
const EXPANDED_PER_FEED: usize = 10;
const RECENCY_DAYS: i64 = 7;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
    #[serde(rename = "ht:approx_traffic", alias = "approx_traffic")]
    approx_traffic: Option<String>,
}

/// Parse an RSS 2.0 document into raw records.
pub fn parse_rss(xml: &str) -> Result<Vec<FeedRecord>, quick_xml::DeError> {
    let rss: Rss = from_str(xml)?;
    Ok(rss
        .channel
        .items
        .into_iter()
        .filter_map(|it| {
            let title = it.title?.trim().to_string();
            if title.is_empty() {
                return None;
            }
            Some(FeedRecord {
                title,
                publish_time: it.pub_date.as_deref().and_then(parse_date),
                summary: it.description.unwrap_or_default(),
                link: it.link.unwrap_or_default().trim().to_string(),
                engagement_score: None,
                traffic: it.approx_traffic,
            })
        })
        .collect())
}

/// Parse an RFC 2822 (RSS) or RFC 3339 (Atom-style) timestamp.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn within_days(publish_time: Option<DateTime<Utc>>, now: DateTime<Utc>, days: i64) -> bool {
    match publish_time {
        Some(t) => now - t <= Duration::days(days),
        None => true,
    }
}

/// Trend tier: the first `limit` entries, traffic as reported by the feed.
pub fn trend_topics(
    feed: &FeedSpec,
    records: Vec<FeedRecord>,
    limit: usize,
    now: DateTime<Utc>,
) -> Vec<Topic> {
    debug!(feed = %feed.name, records = records.len(), "Building trend candidates");
    records
        .into_iter()
        .take(limit)
        .filter_map(|r| {
            let traffic = r.traffic.as_deref().unwrap_or("1K+");
            Topic::new(
                &r.title,
                "google_trends",
                traffic,
                r.publish_time.unwrap_or(now),
                &r.summary,
            )
        })
        .collect()
}

/// News tier: top entries of a curated feed, skipping anything older than a week.
pub fn news_topics<R: Rng>(
    feed: &FeedSpec,
    records: Vec<FeedRecord>,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Vec<Topic> {
    records
        .into_iter()
        .take(NEWS_PER_FEED)
        .filter(|r| within_days(r.publish_time, now, RECENCY_DAYS))
        .filter_map(|r| {
            let traffic = format!("{}K+", rng.random_range(500..=2000));
            Topic::new(
                &clip_title(&r.title),
                &feed.name,
                &traffic,
                r.publish_time.unwrap_or(now),
                &clip_chars(&r.summary, 300),
            )
        })
        .collect()
}

/// Expanded tier: a deeper look at secondary feeds with a 7-day window.
pub fn expanded_topics<R: Rng>(
    feed: &FeedSpec,
    records: Vec<FeedRecord>,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Vec<Topic> {
    records
        .into_iter()
        .take(EXPANDED_PER_FEED)
        .filter(|r| r.title.chars().count() > 10)
        .filter(|r| within_days(r.publish_time, now, RECENCY_DAYS))
        .filter_map(|r| {
            let traffic = format!("{}K+", rng.random_range(100..=999));
            Topic::new(
                &r.title,
                &feed.name,
                &traffic,
                r.publish_time.unwrap_or(now),
                &r.summary,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:ht="https://trends.google.com/trends/trendingsearches/daily">
  <channel>
    <title>Daily Search Trends</title>
    <link>https://trends.google.com</link>
    <item>
      <title>Solar eclipse</title>
      <ht:approx_traffic>200K+</ht:approx_traffic>
      <description><![CDATA[Sky watchers gather]]></description>
      <link>https://example.com/eclipse</link>
      <pubDate>Tue, 06 May 2025 10:00:00 -0700</pubDate>
    </item>
    <item>
      <title>Cup final &amp; parade</title>
      <pubDate>not a date</pubDate>
    </item>
    <item>
      <title>   </title>
    </item>
  </channel>
</rss>"#;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 7, 12, 0, 0).unwrap()
    }

    fn record(title: &str, age_days: Option<i64>) -> FeedRecord {
        FeedRecord {
            title: title.to_string(),
            publish_time: age_days.map(|d| now() - Duration::days(d)),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_rss_items() {
        let records = parse_rss(SAMPLE).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "Solar eclipse");
        assert_eq!(records[0].traffic.as_deref(), Some("200K+"));
        assert_eq!(records[0].summary, "Sky watchers gather");
        assert_eq!(
            records[0].publish_time,
            Some(Utc.with_ymd_and_hms(2025, 5, 6, 17, 0, 0).unwrap())
        );
        assert_eq!(records[1].title, "Cup final & parade");
        assert!(records[1].publish_time.is_none());
    }

    #[test]
    fn test_parse_rss_rejects_garbage() {
        assert!(parse_rss("<html><body>nope</body></html>").is_err());
    }

    #[test]
    fn test_parse_date_formats() {
        assert!(parse_date("Tue, 06 May 2025 10:00:00 GMT").is_some());
        assert!(parse_date("2025-05-06T10:00:00Z").is_some());
        assert!(parse_date("yesterday").is_none());
    }

    #[test]
    fn test_trend_topics_limit_and_default_traffic() {
        let feed = FeedSpec::new("Google Trends US", "https://example.com");
        let records = vec![record("One", None), record("Two", None), record("Three", None)];
        let topics = trend_topics(&feed, records, 2, now());
        assert_eq!(topics.len(), 2);
        assert_eq!(topics[0].traffic_estimate, "1K+");
        assert_eq!(topics[0].source_tag, "google_trends");
    }

    #[test]
    fn test_news_topics_top_two_and_recent() {
        let feed = FeedSpec::new("BBC News", "https://example.com");
        let mut rng = StdRng::seed_from_u64(7);
        let records = vec![
            record("Old story from last month", Some(30)),
            record("Fresh story from this morning", Some(0)),
            record("Third story never considered", Some(0)),
        ];
        let topics = news_topics(&feed, records, now(), &mut rng);
        assert_eq!(topics.len(), 1);
        assert_eq!(topics[0].title, "Fresh story from this morning");
        assert_eq!(topics[0].source_tag, "BBC News");
        assert!(topics[0].traffic_estimate.ends_with("K+"));
    }

    #[test]
    fn test_expanded_topics_filters() {
        let feed = FeedSpec::new("Al Jazeera", "https://example.com");
        let mut rng = StdRng::seed_from_u64(7);
        let records = vec![
            record("Too short", Some(0)),
            record("Eight days old and out of window", Some(8)),
            record("Six days old and inside window", Some(6)),
            record("Undated entries are accepted", None),
        ];
        let titles: Vec<_> = expanded_topics(&feed, records, now(), &mut rng)
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(
            titles,
            vec!["Six days old and inside window", "Undated entries are accepted"]
        );
    }
}
