//! Scroll/extract/merge loop

use crate::browser::{extract_text, Session};
use crate::harvest::TitleSet;
use crate::HarvestResult;
use std::time::Duration;
use tracing::{debug, info};

/// Why the scroll loop ended. None of these is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The set reached `max_items`
    MaxItemsReached,
    /// An iteration added no new titles
    Stagnated,
    /// `scroll_budget` iterations completed
    BudgetExhausted,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MaxItemsReached => "max_items_reached",
            Self::Stagnated => "stagnated",
            Self::BudgetExhausted => "budget_exhausted",
        }
    }
}

/// Outcome of one collection pass
#[derive(Debug, Clone)]
pub struct Collection {
    pub titles: TitleSet,
    pub iterations: u32,
    pub stop_reason: StopReason,
}

/// Drives the scroll loop against a live session
#[derive(Debug, Clone)]
pub struct ScrollCollector {
    selector: String,
    settle_delay: Duration,
}

impl ScrollCollector {
    pub fn new(selector: impl Into<String>, settle_delay: Duration) -> Self {
        Self {
            selector: selector.into(),
            settle_delay,
        }
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// Scrolls, waits for lazy content, extracts and merges candidate titles
    ///
    /// Each iteration scrolls to the bottom, sleeps for the settle delay,
    /// extracts every node matching the selector and merges the candidates
    /// that are not yet present and pass `validate`. After the merge the
    /// loop stops when the set is full, when nothing new was added, or when
    /// the budget is spent, checked in that order.
    ///
    /// A `max_items` or `scroll_budget` of zero yields an empty collection
    /// without touching the page.
    pub async fn collect(
        &self,
        session: &Session,
        max_items: usize,
        scroll_budget: u32,
        validate: &(dyn Fn(&str) -> bool + Send + Sync),
    ) -> HarvestResult<Collection> {
        let mut titles = TitleSet::new(max_items);

        if max_items == 0 {
            return Ok(Collection {
                titles,
                iterations: 0,
                stop_reason: StopReason::MaxItemsReached,
            });
        }

        let mut iterations = 0;
        let mut stop_reason = StopReason::BudgetExhausted;

        while iterations < scroll_budget {
            iterations += 1;

            session.page().scroll_to_bottom().await?;
            tokio::time::sleep(self.settle_delay).await;

            let html = session.page().content().await?;
            let candidates = extract_text(&html, &self.selector)?;

            let mut added = 0;
            for candidate in &candidates {
                if titles.is_full() {
                    break;
                }
                if titles.contains(candidate) || !validate(candidate) {
                    continue;
                }
                if titles.insert(candidate) {
                    added += 1;
                }
            }

            debug!(
                "Scroll {}/{}: {} candidates, {} new, {} total",
                iterations,
                scroll_budget,
                candidates.len(),
                added,
                titles.len()
            );

            if titles.is_full() {
                stop_reason = StopReason::MaxItemsReached;
                break;
            }
            if added == 0 {
                stop_reason = StopReason::Stagnated;
                break;
            }
        }

        info!(
            "Collected {} titles in {} scrolls ({})",
            titles.len(),
            iterations,
            stop_reason.as_str()
        );

        Ok(Collection {
            titles,
            iterations,
            stop_reason,
        })
    }
}
