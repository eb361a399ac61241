//! Title validity predicate

use crate::config::HarvestConfig;

/// Accepts candidate titles that look like real post titles
///
/// A candidate is accepted when its trimmed form has at least `min_chars`
/// characters, at least `min_words` whitespace-separated words, and contains
/// none of the boilerplate phrases (case-insensitive).
#[derive(Debug, Clone)]
pub struct TitleFilter {
    min_chars: usize,
    min_words: usize,
    boilerplate: Vec<String>,
}

impl TitleFilter {
    pub fn new<I, S>(min_chars: usize, min_words: usize, boilerplate: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            min_chars,
            min_words,
            boilerplate: boilerplate
                .into_iter()
                .map(|phrase| phrase.as_ref().trim().to_lowercase())
                .filter(|phrase| !phrase.is_empty())
                .collect(),
        }
    }

    pub fn from_config(config: &HarvestConfig) -> Self {
        Self::new(
            config.min_title_chars,
            config.min_title_words,
            &config.boilerplate,
        )
    }

    pub fn accepts(&self, candidate: &str) -> bool {
        let title = candidate.trim();

        if title.chars().count() < self.min_chars {
            return false;
        }
        if title.split_whitespace().count() < self.min_words {
            return false;
        }

        let lowered = title.to_lowercase();
        !self
            .boilerplate
            .iter()
            .any(|phrase| lowered.contains(phrase.as_str()))
    }
}

impl Default for TitleFilter {
    fn default() -> Self {
        Self::from_config(&HarvestConfig::default())
    }
}
