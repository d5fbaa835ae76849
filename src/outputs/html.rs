//! Plain HTML rendering of a synthesized article.

use crate::models::Article;
use crate::utils::clean_filename;
use chrono::NaiveDateTime;
use html_escape::{encode_double_quoted_attribute, encode_text};
use std::fmt::Write;

/// Filename of the document for `title` produced at `stamp`.
pub fn document_filename(title: &str, stamp: NaiveDateTime) -> String {
    format!("{}_{}.html", clean_filename(title), stamp.format("%Y%m%d_%H%M"))
}

/// Render an article into `(filename, html)`.
pub fn render_document(article: &Article, stamp: NaiveDateTime) -> (String, String) {
    let topic = &article.topic;
    let title = encode_text(&topic.title);
    let lead: String = article.paragraphs[0].chars().take(160).collect();
    let description = encode_double_quoted_attribute(&lead);

    let mut body = String::new();
    for paragraph in &article.paragraphs {
        let _ = writeln!(body, "        <p>{}</p>", encode_text(paragraph));
    }

    let mut sources = String::new();
    for source in &article.attributions {
        let _ = writeln!(
            sources,
            "            <li><a href=\"{}\">{}</a></li>",
            encode_double_quoted_attribute(&source.url),
            encode_text(&source.domain)
        );
    }

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <meta name="description" content="{description}">
</head>
<body>
    <article>
        <h1>{title}</h1>
        <p class="meta"><time datetime="{iso}">{published}</time> · {traffic}</p>
{body}        <section class="sources">
            <h2>Sources</h2>
            <ul>
{sources}            </ul>
        </section>
    </article>
</body>
</html>
"#,
        iso = stamp.format("%Y-%m-%dT%H:%M"),
        published = stamp.format("%B %d, %Y %H:%M"),
        traffic = encode_text(&topic.traffic_estimate),
    );

    (document_filename(&topic.title, stamp), html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Attribution, Topic};
    use chrono::{NaiveDate, Utc};

    fn stamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, 6)
            .unwrap()
            .and_hms_opt(14, 5, 0)
            .unwrap()
    }

    fn article(title: &str) -> Article {
        Article {
            topic: Topic::new(title, "test", "470K+", Utc::now(), "").unwrap(),
            paragraphs: std::array::from_fn(|i| format!("Paragraph {i} with <b>markup</b> & more.")),
            attributions: vec![Attribution {
                domain: "bbc.com".to_string(),
                url: "https://bbc.com/news?a=1&b=2".to_string(),
            }],
        }
    }

    #[test]
    fn test_document_filename() {
        assert_eq!(
            document_filename("Storm hits coast: 3 towns flooded", stamp()),
            "storm-hits-coast-3-towns-flooded_20250506_1405.html"
        );
    }

    #[test]
    fn test_render_escapes_and_lists_sources() {
        let (filename, html) = render_document(&article("Prices <rise> again"), stamp());
        assert_eq!(filename, "prices-rise-again_20250506_1405.html");
        assert!(html.contains("<title>Prices &lt;rise&gt; again</title>"));
        assert_eq!(html.matches("<p>Paragraph").count(), 6);
        assert!(html.contains("&lt;b&gt;markup&lt;/b&gt; &amp; more."));
        assert!(html.contains(r#"<a href="https://bbc.com/news?a=1&amp;b=2">bbc.com</a>"#));
        assert!(!html.contains("<b>markup</b>"));
    }

    #[test]
    fn test_description_attribute_escapes_quotes() {
        let mut a = article("Quoted lead");
        a.paragraphs[0] = r#"Officials said "no comment" & left."#.to_string();
        let (_, html) = render_document(&a, stamp());
        assert!(html.contains(
            r#"<meta name="description" content="Officials said &quot;no comment&quot; &amp; left.">"#
        ));
    }
}
