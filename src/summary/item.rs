//! Ranked digest entries

use serde::Serialize;
use std::fmt;

/// Closed set of digest categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    News,
    Question,
    Discussion,
    Opinion,
    Humor,
    Guide,
    Showcase,
    Other,
}

impl Category {
    const ALL: [Category; 8] = [
        Category::News,
        Category::Question,
        Category::Discussion,
        Category::Opinion,
        Category::Humor,
        Category::Guide,
        Category::Showcase,
        Category::Other,
    ];

    pub fn all() -> &'static [Category] {
        &Self::ALL
    }

    /// Case-insensitive lookup of a category label
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|category| category.as_str().eq_ignore_ascii_case(label))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::News => "News",
            Self::Question => "Question",
            Self::Discussion => "Discussion",
            Self::Opinion => "Opinion",
            Self::Humor => "Humor",
            Self::Guide => "Guide",
            Self::Showcase => "Showcase",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const PLACEHOLDER_TEXT: &str = "Analysis unavailable";
const PLACEHOLDER_RATIONALE: &str = "title did not meet criteria";

/// One ranked entry of a digest
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryItem {
    /// Position in the digest, 1..=10
    pub rank: u8,
    pub text: String,
    pub category: Category,
    pub rationale: String,
    /// True for entries standing in for a missing or malformed line
    pub placeholder: bool,
}

impl SummaryItem {
    pub fn new(
        rank: u8,
        text: impl Into<String>,
        category: Category,
        rationale: impl Into<String>,
    ) -> Self {
        Self {
            rank,
            text: text.into(),
            category,
            rationale: rationale.into(),
            placeholder: false,
        }
    }

    /// The deterministic stand-in for rank `rank`
    pub fn placeholder(rank: u8) -> Self {
        Self {
            rank,
            text: PLACEHOLDER_TEXT.to_string(),
            category: Category::Other,
            rationale: PLACEHOLDER_RATIONALE.to_string(),
            placeholder: true,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    /// Renders the entry in the digest line format
    pub fn to_line(&self) -> String {
        if self.placeholder {
            format!("{}. {} - {}", self.rank, self.text, self.rationale)
        } else {
            format!(
                "{}. {} ({}) - {}",
                self.rank, self.text, self.category, self.rationale
            )
        }
    }
}

impl fmt::Display for SummaryItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_line())
    }
}
