//! Scroll-driven title harvesting
//!
//! This module provides:
//! - `TitleFilter`, the validity predicate applied to every candidate
//! - `TitleSet`, the bounded growth-only collection of accepted titles
//! - `ScrollCollector`, the scroll/extract/merge loop over a live session

mod collector;
mod title_set;
mod validate;

pub use collector::{Collection, ScrollCollector, StopReason};
pub use title_set::TitleSet;
pub use validate::TitleFilter;
