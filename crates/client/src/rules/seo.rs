//! SEO rule checks: title, meta description, H1, canonical, word count.

use pagecheck_core::RuleReport;
use scraper::{Html, Selector};

struct CheckResult {
    score: i64,
    issues: Vec<String>,
}

/// Run all SEO rule checks on a page.
pub fn check_seo(html: &str, text: &str) -> RuleReport {
    let document = Html::parse_document(html);
    let mut report = RuleReport::default();

    let (title, title_length) = check_title_tag(&document);
    report.scores.insert("title".to_string(), title.score);
    report.metrics.insert("title_length".to_string(), title_length as f64);
    report.issues.extend(title.issues);

    let (meta, meta_length) = check_meta_description(&document);
    report.scores.insert("meta_description".to_string(), meta.score);
    report.metrics.insert("meta_desc_length".to_string(), meta_length as f64);
    report.issues.extend(meta.issues);

    let (h1, h1_count) = check_h1_tags(&document);
    report.scores.insert("h1".to_string(), h1.score);
    report.metrics.insert("h1_count".to_string(), h1_count as f64);
    report.issues.extend(h1.issues);

    let canonical = check_canonical(&document);
    report.scores.insert("canonical".to_string(), canonical.score);
    report.issues.extend(canonical.issues);

    let (words, word_count) = check_word_count(text);
    report.scores.insert("word_count".to_string(), words.score);
    report.metrics.insert("word_count".to_string(), word_count as f64);
    report.issues.extend(words.issues);

    report.finalize()
}

/// Title should exist and run 30-60 characters.
fn check_title_tag(document: &Html) -> (CheckResult, usize) {
    let selector = Selector::parse("title").expect("invalid selector");

    let Some(title) = document.select(&selector).next() else {
        return (CheckResult { score: 0, issues: vec!["Missing title tag".to_string()] }, 0);
    };

    let text = title.text().collect::<String>();
    let length = text.trim().chars().count();

    let result = match length {
        0 => CheckResult { score: 0, issues: vec!["Empty title tag".to_string()] },
        1..30 => CheckResult {
            score: 50,
            issues: vec![format!("Title too short ({length} chars, recommended 30-60)")],
        },
        30..=60 => CheckResult { score: 100, issues: Vec::new() },
        _ => CheckResult {
            score: 75,
            issues: vec![format!("Title too long ({length} chars, recommended 30-60)")],
        },
    };

    (result, length)
}

/// Meta description should exist and run 120-160 characters.
fn check_meta_description(document: &Html) -> (CheckResult, usize) {
    let selector = Selector::parse(r#"meta[name="description"]"#).expect("invalid selector");

    let content = document
        .select(&selector)
        .next()
        .and_then(|meta| meta.value().attr("content"));

    let Some(content) = content else {
        return (CheckResult { score: 0, issues: vec!["Missing meta description".to_string()] }, 0);
    };

    let length = content.chars().count();

    let result = match length {
        0 => CheckResult { score: 0, issues: vec!["Empty meta description".to_string()] },
        1..120 => CheckResult {
            score: 50,
            issues: vec![format!("Meta description too short ({length} chars, recommended 120-160)")],
        },
        120..=160 => CheckResult { score: 100, issues: Vec::new() },
        _ => CheckResult {
            score: 75,
            issues: vec![format!("Meta description too long ({length} chars, recommended 120-160)")],
        },
    };

    (result, length)
}

/// Exactly one H1 per page.
fn check_h1_tags(document: &Html) -> (CheckResult, usize) {
    let selector = Selector::parse("h1").expect("invalid selector");
    let count = document.select(&selector).count();

    let result = match count {
        0 => CheckResult { score: 0, issues: vec!["Missing H1 tag".to_string()] },
        1 => CheckResult { score: 100, issues: Vec::new() },
        _ => CheckResult {
            score: 75,
            issues: vec![format!("Multiple H1 tags found ({count}, recommended 1)")],
        },
    };

    (result, count)
}

/// Canonical link should be present with a non-empty href.
fn check_canonical(document: &Html) -> CheckResult {
    let selector = Selector::parse(r#"link[rel="canonical"]"#).expect("invalid selector");

    let has_canonical = document
        .select(&selector)
        .next()
        .and_then(|link| link.value().attr("href"))
        .is_some_and(|href| !href.is_empty());

    if has_canonical {
        CheckResult { score: 100, issues: Vec::new() }
    } else {
        CheckResult { score: 0, issues: vec!["Missing canonical URL".to_string()] }
    }
}

/// Substantial content scores best at 600+ words.
fn check_word_count(text: &str) -> (CheckResult, usize) {
    let count = text.split_whitespace().count();

    let result = if count < 300 {
        CheckResult {
            score: 25,
            issues: vec![format!("Low word count ({count}, recommended 300+)")],
        }
    } else if count < 600 {
        CheckResult { score: 75, issues: Vec::new() }
    } else {
        CheckResult { score: 100, issues: Vec::new() }
    };

    (result, count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(head: &str, body: &str) -> String {
        format!("<html><head>{head}</head><body>{body}</body></html>")
    }

    #[test]
    fn test_well_formed_page_scores_clean() {
        let html = page(
            r#"<title>A perfectly sized page title for testing rules</title>
               <meta name="description" content="A meta description that is long enough to land inside the recommended range of one hundred twenty to one hundred sixty characters total.">
               <link rel="canonical" href="https://example.com/">"#,
            "<h1>One Heading</h1>",
        );
        let text = "word ".repeat(700);

        let report = check_seo(&html, &text);
        assert_eq!(report.scores["title"], 100);
        assert_eq!(report.scores["meta_description"], 100);
        assert_eq!(report.scores["h1"], 100);
        assert_eq!(report.scores["canonical"], 100);
        assert_eq!(report.scores["word_count"], 100);
        assert_eq!(report.overall_score, 100.0);
        assert!(report.issues.is_empty());
    }

    #[test]
    fn test_missing_title() {
        let report = check_seo(&page("", "<p>hi</p>"), "hi");
        assert_eq!(report.scores["title"], 0);
        assert!(report.issues.iter().any(|i| i == "Missing title tag"));
        assert_eq!(report.metrics["title_length"], 0.0);
    }

    #[test]
    fn test_short_title() {
        let report = check_seo(&page("<title>Short</title>", ""), "");
        assert_eq!(report.scores["title"], 50);
        assert!(report.issues.iter().any(|i| i.starts_with("Title too short")));
    }

    #[test]
    fn test_long_title() {
        let title = "x".repeat(80);
        let report = check_seo(&page(&format!("<title>{title}</title>"), ""), "");
        assert_eq!(report.scores["title"], 75);
        assert_eq!(report.metrics["title_length"], 80.0);
    }

    #[test]
    fn test_meta_description_bands() {
        let short = page(r#"<meta name="description" content="too short">"#, "");
        assert_eq!(check_seo(&short, "").scores["meta_description"], 50);

        let long_content = "d".repeat(200);
        let long = page(&format!(r#"<meta name="description" content="{long_content}">"#), "");
        assert_eq!(check_seo(&long, "").scores["meta_description"], 75);

        let missing = page("", "");
        let report = check_seo(&missing, "");
        assert_eq!(report.scores["meta_description"], 0);
        assert!(report.issues.iter().any(|i| i == "Missing meta description"));
    }

    #[test]
    fn test_multiple_h1() {
        let report = check_seo(&page("", "<h1>One</h1><h1>Two</h1>"), "");
        assert_eq!(report.scores["h1"], 75);
        assert_eq!(report.metrics["h1_count"], 2.0);
    }

    #[test]
    fn test_canonical_empty_href_counts_as_missing() {
        let report = check_seo(&page(r#"<link rel="canonical" href="">"#, ""), "");
        assert_eq!(report.scores["canonical"], 0);
    }

    #[test]
    fn test_word_count_bands() {
        let report = check_seo("<html></html>", &"w ".repeat(100));
        assert_eq!(report.scores["word_count"], 25);
        assert!(report.issues.iter().any(|i| i.starts_with("Low word count")));

        let report = check_seo("<html></html>", &"w ".repeat(400));
        assert_eq!(report.scores["word_count"], 75);
    }

    #[test]
    fn test_empty_text_still_scores() {
        let report = check_seo("<html></html>", "");
        assert_eq!(report.metrics["word_count"], 0.0);
        assert_eq!(report.scores["word_count"], 25);
    }
}
