//! Strict parsing of the adapter's digest response

use crate::summary::{Category, SummaryItem};
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

/// Number of entries in every digest
pub const DIGEST_LEN: usize = 10;

fn line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*(\d{1,2})\.\s+(.+?)\s+\(([^()]+)\)\s+-\s+(.+?)\s*$").expect("valid regex")
    })
}

/// Parses one `<rank>. <title> (<category>) - <rationale>` line
///
/// The printed rank is checked for shape only; an unknown category is
/// mapped to `Other`.
fn parse_line(line: &str) -> Option<(String, Category, String)> {
    let captures = line_pattern().captures(line)?;
    let text = captures.get(2)?.as_str().trim();
    let label = captures.get(3)?.as_str();
    let rationale = captures.get(4)?.as_str().trim();

    if text.is_empty() || rationale.is_empty() {
        return None;
    }

    let category = Category::from_label(label).unwrap_or_else(|| {
        debug!("Unknown category '{}' mapped to Other", label);
        Category::Other
    });

    Some((text.to_string(), category, rationale.to_string()))
}

/// Keeps the first ten well-formed lines of `response`, ranked by position
pub fn parse_summary(response: &str) -> Vec<SummaryItem> {
    response
        .lines()
        .filter_map(parse_line)
        .take(DIGEST_LEN)
        .enumerate()
        .map(|(index, (text, category, rationale))| {
            SummaryItem::new(index as u8 + 1, text, category, rationale)
        })
        .collect()
}

/// Truncates or pads `items` to exactly ten entries, filling with
/// placeholders at the missing ranks
pub fn pad_summary(mut items: Vec<SummaryItem>) -> Vec<SummaryItem> {
    items.truncate(DIGEST_LEN);
    for rank in items.len() + 1..=DIGEST_LEN {
        items.push(SummaryItem::placeholder(rank as u8));
    }
    items
}
