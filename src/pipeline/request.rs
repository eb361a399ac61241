//! Run input and output types

use crate::harvest::StopReason;
use crate::summary::SummaryItem;
use crate::{HarvestError, HarvestResult};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;

/// Default maximum titles per run
pub const DEFAULT_MAX_ITEMS: usize = 50;

/// Default maximum scroll iterations per run
pub const DEFAULT_SCROLL_BUDGET: u32 = 10;

fn source_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid regex"))
}

/// One harvesting request; immutable once built
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrapeRequest {
    source_id: String,
    max_items: usize,
    scroll_budget: u32,
}

impl ScrapeRequest {
    /// Validates and builds a request
    ///
    /// # Errors
    ///
    /// `InvalidRequest` if the source id is not `[A-Za-z0-9_-]+` or either
    /// limit is zero.
    pub fn new(source_id: &str, max_items: usize, scroll_budget: u32) -> HarvestResult<Self> {
        if !source_pattern().is_match(source_id) {
            return Err(HarvestError::InvalidRequest(format!(
                "source id '{}' must match [A-Za-z0-9_-]+",
                source_id
            )));
        }
        if max_items == 0 {
            return Err(HarvestError::InvalidRequest(
                "max items must be positive".to_string(),
            ));
        }
        if scroll_budget == 0 {
            return Err(HarvestError::InvalidRequest(
                "scroll budget must be positive".to_string(),
            ));
        }

        Ok(Self {
            source_id: source_id.to_string(),
            max_items,
            scroll_budget,
        })
    }

    /// Builds a request with the default limits
    pub fn with_defaults(source_id: &str) -> HarvestResult<Self> {
        Self::new(source_id, DEFAULT_MAX_ITEMS, DEFAULT_SCROLL_BUDGET)
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn max_items(&self) -> usize {
        self.max_items
    }

    pub fn scroll_budget(&self) -> u32 {
        self.scroll_budget
    }
}

/// Terminal status of a run that did not fail outright
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Ok,
    EmptyExtraction,
    SummarizationFailed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::EmptyExtraction => "empty_extraction",
            Self::SummarizationFailed => "summarization_failed",
        }
    }

    /// Human-readable explanation shown to users
    pub fn message(&self) -> &'static str {
        match self {
            Self::Ok => "Digest generated",
            Self::EmptyExtraction => "No qualifying posts were found on the page",
            Self::SummarizationFailed => "Titles were collected but the digest could not be generated",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counters describing how a run went
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Sessions discarded because the source blocked them
    pub rotations: u32,
    pub scroll_iterations: u32,
    pub stop_reason: Option<StopReason>,
}

/// Outcome of a completed run
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeResult {
    pub source: String,
    pub titles: Vec<String>,
    /// Exactly ten entries when present
    pub summary: Option<Vec<SummaryItem>>,
    pub status: RunStatus,
    /// Adapter error text when `status` is `SummarizationFailed`
    pub summary_error: Option<String>,
    pub stats: RunStats,
    pub finished_at: DateTime<Utc>,
}

impl ScrapeResult {
    pub fn is_ok(&self) -> bool {
        self.status == RunStatus::Ok
    }
}
