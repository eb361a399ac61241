//! Integration tests for full harvesting runs
//!
//! These tests drive the orchestrator end-to-end with scripted browser
//! sessions, proxy rotation and language-model replies.

mod scenarios;
mod support;
