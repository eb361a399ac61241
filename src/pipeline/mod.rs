//! Run pipeline
//!
//! This module sequences a run through its states:
//! - Open a session behind a rotated proxy and random user agent
//! - Navigate and check for a block page, rotating a bounded number of times
//! - Collect titles with the scroll loop
//! - Hand titles to the sink and produce the digest
//!
//! Runs honor a cancellation token at every suspension point and always
//! release their session before returning.

mod orchestrator;
mod request;
mod state;

pub use orchestrator::Orchestrator;
pub use request::{
    RunStats, RunStatus, ScrapeRequest, ScrapeResult, DEFAULT_MAX_ITEMS, DEFAULT_SCROLL_BUDGET,
};
pub use state::RunState;
