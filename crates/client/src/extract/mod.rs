//! Plain-text extraction from HTML.
//!
//! Strips script/style subtrees and collapses whitespace, yielding the
//! text the rule checks and the tone analysis score against. An empty
//! result is reported as an extraction failure; the pipeline degrades
//! that to empty-content scoring with an issue flag instead of failing
//! the item.

use pagecheck_core::Error;
use regex::Regex;
use scraper::{Html, Node};
use std::sync::LazyLock;

/// Default cap on extracted text length, in characters.
pub const DEFAULT_MAX_CHARS: usize = 50_000;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("invalid regex"));

/// Extract clean text content from HTML.
///
/// Tag subtrees that never render (`script`, `style`, `noscript`,
/// `template`) are dropped, runs of whitespace collapse to single
/// spaces, and the result is truncated to `max_chars` characters.
///
/// # Errors
///
/// Returns `Error::ExtractFailed` if no text content remains.
pub fn extract_text(html: &str, max_chars: usize) -> Result<String, Error> {
    let document = Html::parse_document(html);

    let mut raw = String::new();
    for node in document.tree.root().descendants() {
        if let Node::Text(text) = node.value() {
            let hidden = node.ancestors().any(|ancestor| match ancestor.value() {
                Node::Element(element) => {
                    matches!(element.name(), "script" | "style" | "noscript" | "template")
                }
                _ => false,
            });
            if !hidden {
                raw.push_str(text);
                raw.push(' ');
            }
        }
    }

    let text = WHITESPACE.replace_all(raw.trim(), " ").into_owned();

    if text.is_empty() {
        return Err(Error::ExtractFailed("no text content".to_string()));
    }

    if text.chars().count() > max_chars {
        let truncated: String = text.chars().take(max_chars).collect();
        tracing::debug!("text truncated to {} characters", max_chars);
        return Ok(truncated);
    }

    tracing::debug!("extracted {} characters of text", text.len());
    Ok(text)
}
