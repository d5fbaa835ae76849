//! Keyword routing of topic titles into story categories.
//!
//! The same heuristic drives research fallback lines and synthesized
//! paragraphs. Rules are checked in declaration order; the first match wins.

/// Story category derived from a title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Police work and investigations.
    Enforcement,
    /// Deaths and fatal incidents.
    Casualty,
    /// Government, ministers and policy.
    Government,
    /// Courts, trials and lawsuits.
    Judicial,
    Default,
}

const RULES: &[(Category, &[&str])] = &[
    (Category::Enforcement, &["police", "investigation"]),
    (Category::Casualty, &["dead", "killed", "died"]),
    (Category::Government, &["government", "minister", "policy", "president"]),
    (Category::Judicial, &["court", "trial", "lawsuit"]),
];

impl Category {
    /// Classify a title by substring keywords, case-insensitively.
    pub fn classify(title: &str) -> Self {
        let lower = title.to_lowercase();
        RULES
            .iter()
            .find(|(_, words)| words.iter().any(|w| lower.contains(w)))
            .map(|(category, _)| *category)
            .unwrap_or(Category::Default)
    }
}

/// Wider framing used by the broader-context paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Enforcement,
    International,
    Economic,
    General,
}

impl Theme {
    pub fn classify(title: &str) -> Self {
        let lower = title.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));
        if has(&["police", "investigation"]) {
            Theme::Enforcement
        } else if has(&["international", "global"]) {
            Theme::International
        } else if has(&["economic", "financial"]) {
            Theme::Economic
        } else {
            Theme::General
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_each_category() {
        assert_eq!(Category::classify("Police open investigation into fire"), Category::Enforcement);
        assert_eq!(Category::classify("Three killed in highway crash"), Category::Casualty);
        assert_eq!(Category::classify("Minister unveils housing plan"), Category::Government);
        assert_eq!(Category::classify("Court blocks merger"), Category::Judicial);
        assert_eq!(
            Category::classify("Major Data Breach Affects Millions of Users Worldwide"),
            Category::Default
        );
    }

    #[test]
    fn test_first_rule_wins() {
        assert_eq!(Category::classify("Police say two dead after standoff"), Category::Enforcement);
    }

    #[test]
    fn test_theme() {
        assert_eq!(Theme::classify("Global Markets React"), Theme::International);
        assert_eq!(Theme::classify("Financial Markets Analysis"), Theme::Economic);
        assert_eq!(Theme::classify("Police investigation widens"), Theme::Enforcement);
        assert_eq!(Theme::classify("Bridge reopens"), Theme::General);
    }
}
