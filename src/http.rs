//! Network collaborators backed by a shared `reqwest` client.
//!
//! [`HttpClient`] implements every outbound trait of the pipeline: feeds,
//! search, page downloads, encyclopedic summaries and the on-this-day
//! archive. Each call carries its own timeout from [`Timeouts`]; nothing is
//! retried here.

use crate::backfill::DayFetcher;
use crate::config::{FeedSpec, Timeouts};
use crate::error::{FetchError, SourceError};
use crate::models::{FeedRecord, PageResponse, SearchHit};
use crate::research::{PageFetcher, SearchProvider, SummaryProvider, is_readable};
use crate::sources::{FeedFetcher, FeedFormat, reddit, rss};
use crate::utils::truncate_for_log;
use itertools::Itertools;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use scraper::{Html, Selector};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};
use url::Url;

const SEARCH_ENDPOINT: &str = "https://html.duckduckgo.com/html/?q=";
const SUMMARY_ENDPOINT: &str = "https://en.wikipedia.org/api/rest_v1/page/summary/";
const ONTHISDAY_ENDPOINT: &str = "https://api.wikimedia.org/feed/v1/wikipedia/en/onthisday/all";

/// HTTP implementation of the pipeline's network traits.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    timeouts: Timeouts,
}

impl HttpClient {
    pub fn new(user_agent: &str, timeouts: Timeouts) -> Result<Self, reqwest::Error> {
        let client = Client::builder().user_agent(user_agent).build()?;
        Ok(Self { client, timeouts })
    }

    async fn get_text(&self, url: &str, timeout_secs: u64) -> Result<String, FetchError> {
        let t0 = Instant::now();
        let resp = self
            .client
            .get(url)
            .timeout(Duration::from_secs(timeout_secs))
            .send()
            .await?
            .error_for_status()?;
        let body = resp.text().await?;
        debug!(%url, bytes = body.len(), elapsed_ms = t0.elapsed().as_millis() as u64, "GET ok");
        Ok(body)
    }
}

impl FeedFetcher for HttpClient {
    #[instrument(level = "info", skip_all, fields(feed = %feed.name))]
    async fn fetch_feed(
        &self,
        feed: &FeedSpec,
        format: FeedFormat,
    ) -> Result<Vec<FeedRecord>, SourceError> {
        let body = self
            .get_text(&feed.url, self.timeouts.feed_secs)
            .await
            .map_err(|e| SourceError::unavailable(&feed.name, e))?;
        let records = match format {
            FeedFormat::Rss => rss::parse_rss(&body).map_err(|e| SourceError::parse(&feed.name, e))?,
            FeedFormat::RedditListing => {
                reddit::parse_listing(&body).map_err(|e| SourceError::parse(&feed.name, e))?
            }
        };
        info!(count = records.len(), "Fetched feed");
        Ok(records)
    }
}

impl SearchProvider for HttpClient {
    #[instrument(level = "info", skip(self))]
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, SourceError> {
        let url = format!("{SEARCH_ENDPOINT}{}", urlencoding::encode(query));
        let body = self
            .get_text(&url, self.timeouts.search_secs)
            .await
            .map_err(|e| SourceError::unavailable("search", e))?;
        let hits = parse_search_results(&body, limit);
        info!(count = hits.len(), "Search complete");
        Ok(hits)
    }
}

impl PageFetcher for HttpClient {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str) -> Result<PageResponse, FetchError> {
        let resp = self
            .client
            .get(url)
            .timeout(Duration::from_secs(self.timeouts.page_secs))
            .send()
            .await?;
        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !is_readable(status, &content_type) {
            debug!(status, %content_type, "Skipping body of unusable page");
            return Ok(PageResponse {
                status,
                content_type,
                body: String::new(),
            });
        }
        let body = resp.text().await?;
        Ok(PageResponse {
            status,
            content_type,
            body,
        })
    }
}

#[derive(Debug, Deserialize)]
struct PageSummary {
    #[serde(default)]
    extract: String,
}

impl SummaryProvider for HttpClient {
    #[instrument(level = "info", skip(self))]
    async fn summary(&self, query: &str) -> Option<String> {
        let url = format!("{SUMMARY_ENDPOINT}{}", urlencoding::encode(query));
        let body = match self.get_text(&url, self.timeouts.summary_secs).await {
            Ok(body) => body,
            Err(e) => {
                debug!(error = %e, "No summary available");
                return None;
            }
        };
        match serde_json::from_str::<PageSummary>(&body) {
            Ok(s) if !s.extract.trim().is_empty() => Some(s.extract),
            Ok(_) => None,
            Err(e) => {
                warn!(
                    error = %e,
                    response_preview = %truncate_for_log(&body, 200),
                    "Summary response was not understood"
                );
                None
            }
        }
    }
}

impl DayFetcher for HttpClient {
    #[instrument(level = "debug", skip(self))]
    async fn fetch_day(&self, month: u32, day: u32) -> Result<serde_json::Value, FetchError> {
        let url = format!("{ONTHISDAY_ENDPOINT}/{month:02}/{day:02}");
        let body = self.get_text(&url, self.timeouts.page_secs).await?;
        serde_json::from_str(&body).map_err(|e| FetchError::Connection(e.to_string()))
    }
}

/// Pull result links out of a DuckDuckGo HTML results page.
///
/// Result anchors point at a redirect (`/l/?uddg=<target>`); the target is
/// unwrapped. Duplicate domains keep their first hit.
pub fn parse_search_results(html: &str, limit: usize) -> Vec<SearchHit> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a.result__a[href]") else {
        return Vec::new();
    };
    let base = Url::parse("https://duckduckgo.com/").ok();

    document
        .select(&selector)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| resolve_result_link(base.as_ref(), href))
        .filter_map(|url| SearchHit::from_url(&url))
        .filter(|hit| !hit.domain.ends_with("duckduckgo.com"))
        .unique_by(|hit| hit.domain.clone())
        .take(limit)
        .collect()
}

fn resolve_result_link(base: Option<&Url>, href: &str) -> Option<String> {
    let url = match base {
        Some(base) => base.join(href).ok()?,
        None => Url::parse(href).ok()?,
    };
    let target = url
        .query_pairs()
        .find(|(k, _)| k == "uddg")
        .map(|(_, v)| v.into_owned());
    Some(target.unwrap_or_else(|| url.to_string()))
}
