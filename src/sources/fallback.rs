//! Built-in tiers: a curated static pool and date-stamped emergency topics.
//!
//! Neither tier touches the network. The emergency tier embeds today's date
//! in every title, so its keys are always fresh on a new day. "Today" is the
//! ledger's calendar day, which is local time, not the UTC date of `now`.

use crate::models::Topic;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rand::Rng;

/// (title, traffic, search query stem). The current year is appended to the stem.
const STATIC_POOL: &[(&str, &str, &str)] = &[
    ("Tech Companies Report Strong Q4 Earnings Despite Market Volatility", "1.2M+", "tech earnings Q4"),
    ("New Climate Policy Announced at International Summit", "890K+", "climate policy summit"),
    ("NASA Announces Major Discovery in Mars Exploration Mission", "750K+", "NASA Mars discovery"),
    ("Global Markets React to Federal Reserve Interest Rate Decision", "680K+", "federal reserve rates"),
    ("Breakthrough in Cancer Treatment Shows Promising Results in Trials", "520K+", "cancer treatment breakthrough"),
    ("Major Data Breach Affects Millions of Users Worldwide", "470K+", "data breach cybersecurity"),
    ("Renewable Energy Reaches New Milestone in Global Adoption", "410K+", "renewable energy milestone"),
    ("Electric Vehicle Sales Surge as New Models Hit Market", "390K+", "electric vehicle sales"),
    ("AI Technology Breakthrough Revolutionizes Healthcare Industry", "350K+", "AI healthcare breakthrough"),
    ("International Trade Agreement Reached After Months of Negotiations", "300K+", "trade agreement"),
    ("Major Archaeological Discovery Rewrites Ancient History", "280K+", "archaeological discovery"),
    ("Quantum Computing Milestone Achieved by Research Team", "250K+", "quantum computing breakthrough"),
];

/// Headline stems; the date is appended as `"{stem} {date}"`.
const EMERGENCY_TEMPLATES: &[&str] = &[
    "Breaking: Major Development in Global Markets on",
    "Technology Sector Update: Key Changes Announced",
    "Healthcare Breakthrough Reported This Week -",
    "Environmental Policy Changes Take Effect",
    "Financial Markets Analysis: Weekly Report",
    "Scientific Research Update: New Findings",
    "International Relations: Latest Developments",
    "Energy Sector News: Market Changes",
    "Education System Updates: Policy Changes",
    "Transportation Industry: New Announcements",
];

/// The curated static pool for `today`.
pub fn static_topics(today: NaiveDate, now: DateTime<Utc>) -> Vec<Topic> {
    let month = today.format("%B %Y");
    STATIC_POOL
        .iter()
        .filter_map(|(title, traffic, query)| {
            let description = format!(
                "Latest developments and trends in {} as of {month}",
                title.to_lowercase()
            );
            Topic::new(title, "fallback", traffic, now, &description)
                .map(|t| t.with_search_query(&format!("{query} {}", today.year())))
        })
        .collect()
}

/// Emergency topics: fixed templates suffixed with today's date.
pub fn emergency_topics<R: Rng>(today: NaiveDate, now: DateTime<Utc>, rng: &mut R) -> Vec<Topic> {
    let date = today.format("%B %d, %Y").to_string();
    EMERGENCY_TEMPLATES
        .iter()
        .filter_map(|stem| {
            let title = format!("{stem} {date}");
            let traffic = format!("{}K+", rng.random_range(50..=200));
            Topic::new(
                &title,
                "emergency",
                &traffic,
                now,
                &format!("Emergency topic generated for {date}"),
            )
        })
        .collect()
}
