//! Bounded, ordered, duplicate-free title collection

use std::collections::HashSet;

/// Ordered set of unique titles with a fixed capacity
///
/// Titles are normalized by trimming (case is preserved). The set only
/// grows: there is no removal, and inserting a present title is a no-op.
#[derive(Debug, Clone)]
pub struct TitleSet {
    titles: Vec<String>,
    seen: HashSet<String>,
    limit: usize,
}

impl TitleSet {
    pub fn new(limit: usize) -> Self {
        Self {
            titles: Vec::new(),
            seen: HashSet::new(),
            limit,
        }
    }

    /// Normalized form used for membership
    pub fn normalize(title: &str) -> &str {
        title.trim()
    }

    /// Inserts `title` if it is new and the set is not full
    ///
    /// Returns true if the title was added.
    pub fn insert(&mut self, title: &str) -> bool {
        if self.is_full() {
            return false;
        }
        let normalized = Self::normalize(title);
        if normalized.is_empty() || self.seen.contains(normalized) {
            return false;
        }

        self.seen.insert(normalized.to_string());
        self.titles.push(normalized.to_string());
        true
    }

    pub fn contains(&self, title: &str) -> bool {
        self.seen.contains(Self::normalize(title))
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn is_full(&self) -> bool {
        self.titles.len() >= self.limit
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.titles.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.titles
    }

    pub fn into_vec(self) -> Vec<String> {
        self.titles
    }
}
