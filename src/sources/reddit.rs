//! Social-discussion tier backed by Reddit's public listing JSON.

use super::{clip_chars, clip_title};
use crate::models::{FeedRecord, Topic};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

const POSTS_PER_LISTING: usize = 5;
const MIN_SCORE: i64 = 500;
const RECENCY_HOURS: i64 = 24;
const MEDIA_HOSTS: &[&str] = &["https://i.redd.it", "https://v.redd.it"];

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: Post,
}

#[derive(Debug, Deserialize)]
struct Post {
    #[serde(default)]
    title: String,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    created_utc: f64,
    #[serde(default)]
    url: String,
    #[serde(default)]
    selftext: String,
}

/// Parse a subreddit listing into raw records.
pub fn parse_listing(json: &str) -> Result<Vec<FeedRecord>, serde_json::Error> {
    let listing: Listing = serde_json::from_str(json)?;
    Ok(listing
        .data
        .children
        .into_iter()
        .map(|c| {
            let post = c.data;
            FeedRecord {
                title: post.title.trim().to_string(),
                publish_time: DateTime::from_timestamp(post.created_utc as i64, 0),
                summary: post.selftext,
                link: post.url,
                engagement_score: Some(post.score),
                traffic: None,
            }
        })
        .collect())
}

/// Traffic label derived from the discussion score.
fn traffic_from_score(score: i64) -> String {
    if score > 10_000 {
        format!("{}K+", score / 100)
    } else {
        format!("{}K+", score / 10)
    }
}

/// Social tier: well-engaged, recent, non-media posts from the top of a listing.
pub fn social_topics(records: Vec<FeedRecord>, now: DateTime<Utc>) -> Vec<Topic> {
    let cutoff = now - Duration::hours(RECENCY_HOURS);
    records
        .into_iter()
        .take(POSTS_PER_LISTING)
        .filter(|r| r.engagement_score.unwrap_or(0) > MIN_SCORE)
        .filter(|r| !MEDIA_HOSTS.iter().any(|host| r.link.starts_with(host)))
        .filter(|r| r.publish_time.is_some_and(|t| t > cutoff))
        .filter_map(|r| {
            let description = if r.summary.trim().is_empty() {
                "Breaking news story from Reddit".to_string()
            } else {
                clip_chars(&r.summary, 300)
            };
            Topic::new(
                &clip_title(&r.title),
                "reddit_news",
                &traffic_from_score(r.engagement_score.unwrap_or(0)),
                r.publish_time.unwrap_or(now),
                &description,
            )
        })
        .collect()
}
