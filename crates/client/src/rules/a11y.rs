//! Accessibility rule checks: image alts, heading hierarchy, link text.

use pagecheck_core::RuleReport;
use scraper::{Html, Selector};

const GENERIC_PHRASES: &[&str] = &["click here", "read more", "here", "more", "link"];

/// Run all accessibility rule checks on a page.
pub fn check_a11y(html: &str, _text: &str) -> RuleReport {
    let document = Html::parse_document(html);
    let mut report = RuleReport::default();

    let alts = check_image_alts(&document);
    report.scores.insert("image_alts".to_string(), alts.score);
    report.metrics.insert("images_total".to_string(), alts.total as f64);
    report.metrics.insert("images_with_alt".to_string(), alts.with_alt as f64);
    report.issues.extend(alts.issues);

    let headings = check_heading_hierarchy(&document);
    report.scores.insert("heading_hierarchy".to_string(), headings.score);
    report.issues.extend(headings.issues);

    let links = check_link_text(&document);
    report.scores.insert("link_text".to_string(), links.score);
    report.metrics.insert("links_total".to_string(), links.total as f64);
    report.metrics.insert("links_with_text".to_string(), links.with_text as f64);
    report.issues.extend(links.issues);

    report.finalize()
}

struct AltResult {
    score: i64,
    total: usize,
    with_alt: usize,
    issues: Vec<String>,
}

/// Every image should carry an alt attribute (empty alt counts: it
/// marks the image decorative).
fn check_image_alts(document: &Html) -> AltResult {
    let selector = Selector::parse("img").expect("invalid selector");

    let images: Vec<_> = document.select(&selector).collect();
    let total = images.len();

    if total == 0 {
        return AltResult { score: 100, total, with_alt: 0, issues: Vec::new() };
    }

    let with_alt = images.iter().filter(|img| img.value().attr("alt").is_some()).count();
    let alt_percentage = with_alt as f64 / total as f64 * 100.0;

    let missing = total - with_alt;
    let issue = format!("{missing} images missing alt text ({alt_percentage:.1}% have alt)");

    let (score, issues) = if alt_percentage == 100.0 {
        (100, Vec::new())
    } else if alt_percentage >= 80.0 {
        (75, vec![issue])
    } else if alt_percentage >= 50.0 {
        (50, vec![issue])
    } else {
        (25, vec![issue])
    };

    AltResult { score, total, with_alt, issues }
}

struct CheckResult {
    score: i64,
    issues: Vec<String>,
}

/// Heading levels should not skip (an H2 followed by an H4).
fn check_heading_hierarchy(document: &Html) -> CheckResult {
    let mut levels = Vec::new();
    for level in 1..=6u8 {
        let selector = Selector::parse(&format!("h{level}")).expect("invalid selector");
        let count = document.select(&selector).count();
        levels.extend(std::iter::repeat_n(level, count));
    }

    if levels.is_empty() {
        return CheckResult { score: 50, issues: vec!["No headings found".to_string()] };
    }

    for pair in levels.windows(2) {
        if pair[1] - pair[0] > 1 {
            return CheckResult {
                score: 50,
                issues: vec![format!(
                    "Heading hierarchy skips from H{} to H{}",
                    pair[0], pair[1]
                )],
            };
        }
    }

    CheckResult { score: 100, issues: Vec::new() }
}

struct LinkResult {
    score: i64,
    total: usize,
    with_text: usize,
    issues: Vec<String>,
}

/// Links need text, and the text should say where they go.
fn check_link_text(document: &Html) -> LinkResult {
    let selector = Selector::parse("a").expect("invalid selector");

    let links: Vec<_> = document.select(&selector).collect();
    let total = links.len();

    if total == 0 {
        return LinkResult { score: 100, total, with_text: 0, issues: Vec::new() };
    }

    let mut with_text = 0usize;
    let mut generic_count = 0usize;

    for link in &links {
        let text = link.text().collect::<String>().trim().to_lowercase();
        if !text.is_empty() {
            with_text += 1;
            if GENERIC_PHRASES.contains(&text.as_str()) {
                generic_count += 1;
            }
        }
    }

    let text_percentage = with_text as f64 / total as f64 * 100.0;

    if text_percentage < 80.0 {
        let missing = total - with_text;
        LinkResult {
            score: 25,
            total,
            with_text,
            issues: vec![format!(
                "{missing} links without text ({text_percentage:.1}% have text)"
            )],
        }
    } else if generic_count as f64 > total as f64 * 0.2 {
        LinkResult {
            score: 50,
            total,
            with_text,
            issues: vec![format!(
                "{generic_count} links use generic text (e.g., 'click here', 'read more')"
            )],
        }
    } else {
        LinkResult { score: 100, total, with_text, issues: Vec::new() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(content: &str) -> String {
        format!("<html><body>{content}</body></html>")
    }

    #[test]
    fn test_clean_page() {
        let html = body(
            r#"<h1>Main</h1><h2>Section</h2>
               <img src="a.png" alt="A diagram">
               <a href="/docs">Documentation for the feature</a>"#,
        );
        let report = check_a11y(&html, "");
        assert_eq!(report.scores["image_alts"], 100);
        assert_eq!(report.scores["heading_hierarchy"], 100);
        assert_eq!(report.scores["link_text"], 100);
        assert_eq!(report.overall_score, 100.0);
    }

    #[test]
    fn test_no_images_scores_full() {
        let report = check_a11y(&body("<p>text</p>"), "");
        assert_eq!(report.scores["image_alts"], 100);
        assert_eq!(report.metrics["images_total"], 0.0);
    }

    #[test]
    fn test_missing_alt_bands() {
        // 1 of 2 images has alt: 50% band.
        let html = body(r#"<img src="a.png" alt="ok"><img src="b.png">"#);
        let report = check_a11y(&html, "");
        assert_eq!(report.scores["image_alts"], 50);
        assert_eq!(report.metrics["images_with_alt"], 1.0);
        assert!(report.issues.iter().any(|i| i.contains("missing alt text")));

        // 4 of 5: 80% band.
        let html = body(
            r#"<img alt=""><img alt=""><img alt=""><img alt=""><img src="x.png">"#,
        );
        let report = check_a11y(&html, "");
        assert_eq!(report.scores["image_alts"], 75);

        // 0 of 3: worst band.
        let html = body("<img><img><img>");
        let report = check_a11y(&html, "");
        assert_eq!(report.scores["image_alts"], 25);
    }

    #[test]
    fn test_empty_alt_counts_as_present() {
        let html = body(r#"<img src="decorative.png" alt="">"#);
        let report = check_a11y(&html, "");
        assert_eq!(report.scores["image_alts"], 100);
    }

    #[test]
    fn test_no_headings() {
        let report = check_a11y(&body("<p>text only</p>"), "");
        assert_eq!(report.scores["heading_hierarchy"], 50);
        assert!(report.issues.iter().any(|i| i == "No headings found"));
    }

    #[test]
    fn test_heading_skip() {
        let report = check_a11y(&body("<h1>One</h1><h3>Three</h3>"), "");
        assert_eq!(report.scores["heading_hierarchy"], 50);
        assert!(report
            .issues
            .iter()
            .any(|i| i == "Heading hierarchy skips from H1 to H3"));
    }

    #[test]
    fn test_links_without_text() {
        let html = body(r#"<a href="/a"></a><a href="/b"></a><a href="/c">ok</a>"#);
        let report = check_a11y(&html, "");
        assert_eq!(report.scores["link_text"], 25);
        assert!(report.issues.iter().any(|i| i.contains("links without text")));
    }

    #[test]
    fn test_generic_link_text() {
        let html = body(
            r#"<a href="/a">click here</a><a href="/b">read more</a>
               <a href="/c">pricing details</a><a href="/d">annual report</a>"#,
        );
        let report = check_a11y(&html, "");
        assert_eq!(report.scores["link_text"], 50);
        assert!(report.issues.iter().any(|i| i.contains("generic text")));
    }

    #[test]
    fn test_no_links_scores_full() {
        let report = check_a11y(&body("<h1>Hello</h1>"), "");
        assert_eq!(report.scores["link_text"], 100);
        assert_eq!(report.metrics["links_total"], 0.0);
    }
}
