//! Title cleaning and batch preparation

use std::collections::HashSet;

/// Characters kept besides letters and spaces
const KEPT_PUNCTUATION: &[char] = &['?', '!', '¿', '¡'];

/// Minimum words a cleaned title needs to be sent to the adapter
pub const MIN_CLEAN_WORDS: usize = 3;

/// Strips everything except letters (accented included), `? ! ¿ ¡` and
/// spaces, then collapses runs of whitespace
pub fn clean_title(title: &str) -> String {
    let kept: String = title
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .filter(|c| c.is_alphabetic() || *c == ' ' || KEPT_PUNCTUATION.contains(c))
        .collect();

    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cleans `titles`, drops those under `MIN_CLEAN_WORDS` words, removes
/// duplicates and keeps the first `limit`
pub fn prepare_batch<S: AsRef<str>>(titles: &[S], limit: usize) -> Vec<String> {
    let mut seen = HashSet::new();

    titles
        .iter()
        .map(|title| clean_title(title.as_ref()))
        .filter(|title| title.split_whitespace().count() >= MIN_CLEAN_WORDS)
        .filter(|title| seen.insert(title.clone()))
        .take(limit)
        .collect()
}
