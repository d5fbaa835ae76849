//! Per-topic research: search, content extraction and category fallback.
//!
//! For each selected topic the gatherer runs a bounded search, then visits the
//! result pages one at a time and keeps up to three meaningful lines from
//! each. Whatever goes wrong with a page (timeout, bad status, non-HTML body,
//! nothing usable left after filtering) the page still yields a
//! [`SourceExtract`], built by the category fallback generator and tagged
//! [`ExtractOrigin::Fallback`]. An encyclopedic summary is fetched once,
//! best-effort.

use crate::category::Category;
use crate::error::{ExtractionFailure, FetchError, SourceError};
use crate::models::{ExtractOrigin, PageResponse, ResearchBundle, SearchHit, SourceExtract, Topic};
use crate::sources::clip_chars;
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Node};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

/// Elements whose text never counts as content.
const STRUCTURAL_TAGS: &[&str] = &["script", "style", "nav", "header", "footer"];

/// Lines containing any of these are boilerplate.
const BOILERPLATE: &[&str] = &[
    "menu",
    "login",
    "sign up",
    "cookie",
    "privacy",
    "subscribe",
    "newsletter",
    "advertisement",
];

const MAX_LINES: usize = 3;
const MIN_LINE_CHARS: usize = 30;
const MAX_LINE_CHARS: usize = 500;
const KEPT_LINE_CHARS: usize = 300;
const SUMMARY_CHARS: usize = 300;

/// Used as search results when the provider fails or finds nothing.
static FALLBACK_HITS: Lazy<Vec<SearchHit>> = Lazy::new(|| {
    ["bbc.com", "cnn.com", "reuters.com", "apnews.com", "theguardian.com"]
        .iter()
        .map(|d| SearchHit {
            url: format!("https://{d}/news"),
            domain: d.to_string(),
        })
        .collect()
});

/// Web search collaborator.
pub trait SearchProvider {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, SourceError>;
}

/// Page download collaborator.
pub trait PageFetcher {
    async fn fetch(&self, url: &str) -> Result<PageResponse, FetchError>;
}

/// Encyclopedic summary collaborator. Absence is not an error.
pub trait SummaryProvider {
    async fn summary(&self, query: &str) -> Option<String>;
}

/// Whether a page is worth reading at all: a success status and an HTML
/// content type. Anything else is rejected without looking at the body.
pub fn is_readable(status: u16, content_type: &str) -> bool {
    (200..300).contains(&status) && content_type.to_lowercase().contains("html")
}

/// Pull up to three content lines out of a fetched page.
pub fn extract_lines(page: &PageResponse) -> Result<Vec<String>, ExtractionFailure> {
    if !(200..300).contains(&page.status) {
        return Err(ExtractionFailure::Status(page.status));
    }
    if !page.content_type.to_lowercase().contains("html") {
        return Err(ExtractionFailure::NotHtml(page.content_type.clone()));
    }

    let document = Html::parse_document(&page.body);
    let mut text = String::new();
    collect_text(document.root_element(), &mut text);

    let lines: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| {
            let len = line.chars().count();
            len > MIN_LINE_CHARS && len < MAX_LINE_CHARS
        })
        .filter(|line| {
            let lower = line.to_lowercase();
            !BOILERPLATE.iter().any(|word| lower.contains(word))
        })
        .take(MAX_LINES)
        .map(|line| clip_chars(line, KEPT_LINE_CHARS))
        .collect();

    if lines.is_empty() {
        Err(ExtractionFailure::Empty)
    } else {
        Ok(lines)
    }
}

/// Concatenate text nodes, skipping structural subtrees.
fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) if STRUCTURAL_TAGS.contains(&el.name()) => {}
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_text(child_el, out);
                }
            }
            _ => {}
        }
    }
}

/// Three deterministic lines for a topic whose page could not be used.
///
/// Every line set ends with a sentence crediting `domain`, which the
/// synthesizer recognises as fallback-marker text.
pub fn fallback_lines(topic: &Topic, domain: &str) -> Vec<String> {
    let title = &topic.title;
    let lower = title.to_lowercase();
    let lines = match Category::classify(title) {
        Category::Enforcement => [
            format!("Authorities are investigating the circumstances surrounding {lower}, according to sources familiar with the matter."),
            "Law enforcement officials have confirmed they are treating this as a priority case requiring immediate attention and thorough investigation.".to_string(),
            format!("The investigation involves multiple departments working together to gather evidence and interview key witnesses, according to {domain} reports."),
        ],
        Category::Casualty => [
            format!("Multiple fatalities have been confirmed in an incident involving {lower}, emergency services report."),
            "First responders arrived at the scene within minutes of receiving initial emergency calls, immediately beginning rescue and recovery operations.".to_string(),
            format!("Medical personnel and law enforcement are working together to secure the area and provide assistance to those affected, sources tell {domain}."),
        ],
        Category::Government => [
            format!("Government officials have announced significant policy changes regarding {lower}, marking a major shift in official position."),
            "The announcement comes after extensive consultation with stakeholders and represents a comprehensive approach to addressing the issue.".to_string(),
            format!("Cabinet ministers have expressed their full support for the new measures, which are expected to have wide-ranging implications, {domain} reports."),
        ],
        Category::Judicial => [
            format!("Legal proceedings are advancing in the case involving {lower}, with both sides preparing comprehensive arguments."),
            "Court officials have confirmed that all proper procedures are being followed to ensure a fair and thorough hearing of the matter.".to_string(),
            format!("The case has attracted significant attention from legal experts who note its potential to set important precedents, according to {domain}."),
        ],
        Category::Default => [
            format!("Developing story: {title} continues to unfold as authorities and stakeholders respond to the evolving situation."),
            "Multiple agencies are coordinating their response efforts to address the complex circumstances surrounding this developing story.".to_string(),
            format!("Officials have promised regular updates as more information becomes available, with transparency maintained throughout the process, {domain} reports."),
        ],
    };
    lines.to_vec()
}

/// Gathers a [`ResearchBundle`] for each topic, sequentially.
pub struct ResearchGatherer<'a, S, P, W> {
    search: &'a S,
    pages: &'a P,
    summaries: &'a W,
    results: usize,
    pause: Duration,
}

impl<'a, S, P, W> ResearchGatherer<'a, S, P, W>
where
    S: SearchProvider,
    P: PageFetcher,
    W: SummaryProvider,
{
    pub fn new(search: &'a S, pages: &'a P, summaries: &'a W, results: usize, pause: Duration) -> Self {
        Self {
            search,
            pages,
            summaries,
            results,
            pause,
        }
    }

    /// Search hits for a topic, falling back to fixed news domains.
    async fn candidate_hits(&self, topic: &Topic) -> Vec<SearchHit> {
        let hits = match self.search.search(&topic.search_query, self.results).await {
            Ok(hits) if !hits.is_empty() => hits,
            Ok(_) => {
                warn!(query = %topic.search_query, "Search returned nothing; using fallback sources");
                Vec::new()
            }
            Err(e) => {
                warn!(query = %topic.search_query, error = %e, "Search unavailable; using fallback sources");
                Vec::new()
            }
        };
        let hits = if hits.is_empty() { FALLBACK_HITS.clone() } else { hits };
        hits.into_iter()
            .unique_by(|h| h.domain.clone())
            .take(self.results)
            .collect()
    }

    /// Extract one result; never fails.
    #[instrument(level = "info", skip_all, fields(url = %hit.url))]
    async fn extract_source(&self, topic: &Topic, hit: SearchHit) -> SourceExtract {
        let outcome = match self.pages.fetch(&hit.url).await {
            Ok(page) => extract_lines(&page),
            Err(e) => Err(ExtractionFailure::from(e)),
        };
        match outcome {
            Ok(lines) => {
                debug!(lines = lines.len(), "Extracted page content");
                SourceExtract {
                    domain: hit.domain,
                    url: hit.url,
                    lines,
                    origin: ExtractOrigin::Extracted,
                }
            }
            Err(e) => {
                warn!(error = %e, "Extraction failed; using category fallback");
                SourceExtract {
                    lines: fallback_lines(topic, &hit.domain),
                    domain: hit.domain,
                    url: hit.url,
                    origin: ExtractOrigin::Fallback,
                }
            }
        }
    }

    /// Research one topic.
    #[instrument(level = "info", skip_all, fields(title = %topic.title))]
    pub async fn gather(&self, topic: Topic) -> ResearchBundle {
        let hits = self.candidate_hits(&topic).await;
        let pause = self.pause;

        let extracts: Vec<SourceExtract> = stream::iter(hits.into_iter().enumerate())
            .then(|(i, hit)| {
                let topic = &topic;
                async move {
                    if i > 0 && !pause.is_zero() {
                        sleep(pause).await;
                    }
                    self.extract_source(topic, hit).await
                }
            })
            .collect()
            .await;

        let external_summary = self
            .summaries
            .summary(&topic.search_query)
            .await
            .map(|s| clip_chars(&s, SUMMARY_CHARS))
            .filter(|s| !s.trim().is_empty());

        let mut bundle = ResearchBundle::new(topic);
        let extracted = extracts.iter().filter(|e| e.is_extracted()).count();
        for extract in extracts {
            bundle.insert(extract);
        }
        bundle.external_summary = external_summary;

        info!(
            sources = bundle.extracts.len(),
            extracted,
            has_summary = bundle.external_summary.is_some(),
            "Research gathered"
        );
        bundle
    }
}


#[cfg(test)]
mod tests {
    use super::fakes::*;
    use super::*;
    use chrono::Utc;

    const ARTICLE: &str = r#"<html><head><title>x</title><script>var cookie = "a very long script line that should never be read";</script></head>
<body>
<header>Site header with a very long tagline that is not content at all</header>
<nav>Home | World | Business | Technology | Science | Sport | Culture</nav>
<p>The regional council voted on Tuesday to approve a new transit corridor plan.</p>
<p>Short line.</p>
<p>Please accept our cookie policy to continue reading this website today.</p>
<p>Construction is expected to begin next spring and to take about three years.</p>
<p>Officials said the corridor would cut average commute times by a fifth.</p>
<p>A fourth qualifying line that should be ignored because three were found.</p>
<footer>Copyright notice and a long footer line with legal text in it</footer>
</body></html>"#;

    fn html_page(body: &str) -> PageResponse {
        PageResponse {
            status: 200,
            content_type: "text/html".to_string(),
            body: body.to_string(),
        }
    }

    fn topic(title: &str) -> Topic {
        Topic::new(title, "test", "1K+", Utc::now(), "").unwrap()
    }

    fn hit(url: &str) -> SearchHit {
        SearchHit::from_url(url).unwrap()
    }

    #[test]
    fn test_extract_lines_filters_structure_and_boilerplate() {
        let lines = extract_lines(&html_page(ARTICLE)).unwrap();
        assert_eq!(
            lines,
            vec![
                "The regional council voted on Tuesday to approve a new transit corridor plan.",
                "Construction is expected to begin next spring and to take about three years.",
                "Officials said the corridor would cut average commute times by a fifth.",
            ]
        );
    }

    #[test]
    fn test_extract_lines_rejects_non_html() {
        let page = PageResponse {
            status: 200,
            content_type: "application/pdf".to_string(),
            body: String::new(),
        };
        assert_eq!(
            extract_lines(&page),
            Err(ExtractionFailure::NotHtml("application/pdf".to_string()))
        );
    }

    #[test]
    fn test_is_readable() {
        assert!(is_readable(200, "text/html; charset=utf-8"));
        assert!(is_readable(204, "application/xhtml+xml"));
        assert!(!is_readable(200, "application/pdf"));
        assert!(!is_readable(200, "video/mp4"));
        assert!(!is_readable(404, "text/html"));
    }

    #[test]
    fn test_extract_lines_rejects_bad_status() {
        let page = PageResponse {
            status: 403,
            ..html_page(ARTICLE)
        };
        assert_eq!(extract_lines(&page), Err(ExtractionFailure::Status(403)));
    }

    #[test]
    fn test_extract_lines_empty() {
        let page = html_page("<html><body><p>tiny</p></body></html>");
        assert_eq!(extract_lines(&page), Err(ExtractionFailure::Empty));
    }

    #[test]
    fn test_extract_lines_length_bounds() {
        let long = "y".repeat(600);
        let edge = "z".repeat(450);
        let body = format!("<html><body><p>{long}</p>\n<p>{edge}</p></body></html>");
        let lines = extract_lines(&html_page(&body)).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].chars().count(), 300);
    }

    #[test]
    fn test_fallback_lines_by_category() {
        let lines = fallback_lines(&topic("Police investigation into warehouse fire"), "bbc.com");
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("according to sources familiar with the matter"));
        assert!(lines[2].ends_with("according to bbc.com reports."));

        let lines = fallback_lines(&topic("Major Data Breach Affects Millions of Users Worldwide"), "cnn.com");
        assert!(lines[0].starts_with("Developing story: Major Data Breach"));
        assert!(lines[2].ends_with("cnn.com reports."));
    }

    #[tokio::test]
    async fn test_gather_mixes_extracted_and_fallback() {
        let search = FakeSearch {
            hits: vec![hit("https://good.example/a"), hit("https://down.example/b")],
        };
        let pages = FakePages::default().html("https://good.example/a", ARTICLE);
        let summary = FakeSummary(Some("s".repeat(400)));
        let gatherer = ResearchGatherer::new(&search, &pages, &summary, 3, Duration::ZERO);

        let bundle = gatherer.gather(topic("Transit corridor approved")).await;
        assert_eq!(bundle.order, vec!["good.example", "down.example"]);
        assert!(bundle.extracts["good.example"].is_extracted());
        assert_eq!(bundle.extracts["down.example"].origin, ExtractOrigin::Fallback);
        assert_eq!(bundle.extracts["down.example"].lines.len(), 3);
        assert_eq!(bundle.external_summary.as_deref().map(|s| s.len()), Some(300));
    }

    #[tokio::test]
    async fn test_gather_search_failure_uses_fixed_domains() {
        let search = FakeSearch::default();
        let pages = FakePages::default();
        let summary = FakeSummary(None);
        let gatherer = ResearchGatherer::new(&search, &pages, &summary, 3, Duration::ZERO);

        let bundle = gatherer.gather(topic("Bridge reopens after repairs")).await;
        assert_eq!(bundle.order, vec!["bbc.com", "cnn.com", "reuters.com"]);
        assert!(bundle.extracts.values().all(|e| !e.is_extracted()));
        assert!(bundle.external_summary.is_none());
    }

    #[tokio::test]
    async fn test_gather_deduplicates_domains() {
        let search = FakeSearch {
            hits: vec![
                hit("https://same.example/1"),
                hit("https://same.example/2"),
                hit("https://other.example/3"),
            ],
        };
        let pages = FakePages::default();
        let summary = FakeSummary(None);
        let gatherer = ResearchGatherer::new(&search, &pages, &summary, 3, Duration::ZERO);

        let bundle = gatherer.gather(topic("Bridge reopens after repairs")).await;
        assert_eq!(bundle.order, vec!["same.example", "other.example"]);
        assert_eq!(bundle.extracts["same.example"].url, "https://same.example/1");
    }
}
