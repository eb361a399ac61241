//! Text extraction from rendered page HTML
//!
//! This module handles parsing HTML snapshots taken from a live page to extract:
//! - Candidate title text for a CSS selector
//! - The human-visible body text (for block-page detection)
//!
//! Everything here is synchronous: parsed documents never cross an await point.

use crate::{HarvestError, HarvestResult};
use scraper::{ElementRef, Html, Selector};

/// Elements whose text content is never rendered
const INVISIBLE_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Parses a CSS selector, mapping failure to a browser error
pub fn parse_selector(selector: &str) -> HarvestResult<Selector> {
    Selector::parse(selector)
        .map_err(|e| HarvestError::Browser(format!("invalid selector '{}': {:?}", selector, e)))
}

/// Extracts the trimmed text of every element matching `selector`
///
/// Empty texts are skipped; document order is preserved and duplicates kept.
///
/// # Example
///
/// ```
/// use driftnet::browser::extract_text;
///
/// let html = r#"<a slot="title"> First post title here </a><a slot="title">Second</a>"#;
/// let texts = extract_text(html, r#"a[slot="title"]"#).unwrap();
/// assert_eq!(texts, vec!["First post title here", "Second"]);
/// ```
pub fn extract_text(html: &str, selector: &str) -> HarvestResult<Vec<String>> {
    let selector = parse_selector(selector)?;
    let document = Html::parse_document(html);

    Ok(document
        .select(&selector)
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
        .collect())
}

/// Returns true if any element matches `selector`
pub fn contains_selector(html: &str, selector: &str) -> HarvestResult<bool> {
    let selector = parse_selector(selector)?;
    let document = Html::parse_document(html);
    let found = document.select(&selector).next().is_some();
    Ok(found)
}

/// Returns the visible text of the document body, whitespace-collapsed
pub fn visible_text(html: &str) -> String {
    let document = Html::parse_document(html);

    let body = Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next())
        .unwrap_or_else(|| document.root_element());

    let mut words = Vec::new();
    for node in body.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ElementRef::wrap(ancestor)
                .is_some_and(|element| INVISIBLE_ELEMENTS.contains(&element.value().name()))
        });
        if !hidden {
            words.extend(text.split_whitespace());
        }
    }

    words.join(" ")
}
