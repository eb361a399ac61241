//! Run state machine
//!
//! A run moves `Idle → SessionOpen → Checking → Collecting → Summarizing →
//! Done`. A block sends `Checking → Blocked → SessionOpen` for another
//! attempt. `Collecting → Done` skips summarization on an empty result.
//! `Failed` is reachable from every non-terminal state.

use crate::{HarvestError, HarvestResult};
use serde::Serialize;
use std::fmt;

/// Current step of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    SessionOpen,
    Checking,
    Blocked,
    Collecting,
    Summarizing,

    // ===== Terminal States =====
    Done,
    Failed,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Returns true if `self → next` is an edge of the machine
    pub fn can_transition_to(&self, next: RunState) -> bool {
        use RunState::*;

        if next == Failed {
            return !self.is_terminal();
        }

        matches!(
            (self, next),
            (Idle, SessionOpen)
                | (SessionOpen, Checking)
                | (Checking, Blocked)
                | (Checking, Collecting)
                | (Blocked, SessionOpen)
                | (Collecting, Summarizing)
                | (Collecting, Done)
                | (Summarizing, Done)
        )
    }

    /// Moves to `next`, or fails with `InvalidTransition`
    pub fn transition(&mut self, next: RunState) -> HarvestResult<()> {
        if !self.can_transition_to(next) {
            return Err(HarvestError::InvalidTransition {
                from: *self,
                to: next,
            });
        }
        *self = next;
        Ok(())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::SessionOpen => "session_open",
            Self::Checking => "checking",
            Self::Blocked => "blocked",
            Self::Collecting => "collecting",
            Self::Summarizing => "summarizing",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
