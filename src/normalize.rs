//! Title normalization for duplicate detection.
//!
//! Two headlines describing the same story rarely match byte for byte: feeds
//! prepend labels ("Breaking:", "LIVE:"), reorder clauses and sprinkle filler
//! words. [`normalize`] reduces a title to a canonical key that ignores case,
//! punctuation, label prefixes, common stopwords and word order. The same key
//! is used for intra-batch dedup and for ledger membership.
//!
//! Because word order is discarded, two distinct stories built from the same
//! significant words collapse to one key. That over-merging is accepted.

use once_cell::sync::Lazy;
use regex::Regex;

/// A leading run of label words terminated by a colon, e.g. `"breaking news: "`.
static LABEL_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(?:breaking|update|news|trending|live|urgent)\s*)+:\s*").unwrap()
});

/// Label words stripped from search queries (colon optional).
static QUERY_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:breaking|news|update|trending):?\s*").unwrap());

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").unwrap());

const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "today", "yesterday", "now", "new", "latest", "major",
];

/// Reduce a title to its normalized key.
///
/// Total and idempotent: `normalize(&normalize(x)) == normalize(x)` for every
/// input, and the empty string maps to itself.
///
/// ```ignore
/// assert_eq!(normalize("Breaking: Tech Firm Reports Record Earnings"),
///            "earnings firm record reports tech");
/// ```
pub fn normalize(title: &str) -> String {
    let lowered = title.to_lowercase();
    let stripped = LABEL_PREFIX.replace(lowered.trim(), "");
    let words_only = NON_WORD.replace_all(&stripped, "");

    let mut tokens: Vec<&str> = words_only
        .split_whitespace()
        .filter(|t| !STOPWORDS.contains(t))
        .collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Derive a search query from a headline: drop a leading label and trim.
pub fn clean_search_query(title: &str) -> String {
    QUERY_PREFIX.replace(title.trim(), "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_golden_label_and_filler() {
        let a = normalize("Breaking: Tech Firm Reports Record Earnings");
        let b = normalize("Tech Firm Reports Record Earnings Today");
        assert_eq!(a, "earnings firm record reports tech");
        assert_eq!(a, b);
    }

    #[test]
    fn test_normalize_golden_short_form() {
        assert_eq!(normalize("Breaking: X reports Y"), "reports x y");
        assert_eq!(normalize("X reports Y today"), "reports x y");
    }

    #[test]
    fn test_normalize_multi_word_label() {
        assert_eq!(
            normalize("BREAKING NEWS: Government Announces New Policy"),
            "announces government policy"
        );
        assert_eq!(normalize("Live: Climate Summit Updates"), "climate summit updates");
        assert_eq!(
            normalize("Trending: Climate Summit Latest News"),
            "climate news summit"
        );
    }

    #[test]
    fn test_normalize_fixed_pool_title() {
        assert_eq!(
            normalize("Major Data Breach Affects Millions of Users Worldwide"),
            "affects breach data millions users worldwide"
        );
    }

    #[test]
    fn test_normalize_empty_and_blank() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \t\n"), "");
        assert_eq!(normalize("!!!"), "");
        assert_eq!(normalize("Breaking:"), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let samples = [
            "",
            "Breaking: Tech Firm Reports Record Earnings",
            "Why breaking news is breaking: a study",
            "Update: The U.S. and the E.U. sign a deal — finally!",
            "news: news news",
            "Crème brûlée wins: Paris bakers' cup",
            "   spaced    out   title   ",
            "İstanbul Live Coverage",
        ];
        for s in samples {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "not idempotent for {s:?}");
        }
    }

    #[test]
    fn test_normalize_ignores_word_order() {
        assert_eq!(
            normalize("Company reports earnings"),
            normalize("Earnings reports company")
        );
    }

    #[test]
    fn test_label_without_colon_is_kept() {
        // Only a colon-terminated label run is stripped.
        assert_eq!(normalize("Live Nation sues promoter"), "live nation promoter sues");
    }

    #[test]
    fn test_clean_search_query() {
        assert_eq!(
            clean_search_query("Breaking: Tech Firm Reports Record Earnings"),
            "Tech Firm Reports Record Earnings"
        );
        assert_eq!(clean_search_query("NEWS Storm hits coast"), "Storm hits coast");
        assert_eq!(clean_search_query("  Quiet day  "), "Quiet day");
    }
}
