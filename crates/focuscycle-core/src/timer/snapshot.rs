//! The persisted timer state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::phase::Phase;

/// Complete serializable state of the timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct TimerSnapshot {
    pub phase: Phase,
    pub phase_started_at: Option<DateTime<Utc>>,
    pub is_paused: bool,
    pub paused_remaining_ms: Option<u64>,
    pub completed_cycles: u32,
    pub category_id: Option<String>,
}

impl TimerSnapshot {
    /// The all-Idle default.
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn is_idle(&self) -> bool {
        self.phase == Phase::Idle
    }

    /// Check the structural invariants that every stored snapshot must hold.
    pub fn is_consistent(&self) -> bool {
        let idle = self.phase == Phase::Idle;
        if idle {
            return self.phase_started_at.is_none()
                && self.category_id.is_none()
                && !self.is_paused
                && self.paused_remaining_ms.is_none();
        }
        let has_category = self
            .category_id
            .as_deref()
            .is_some_and(|c| !c.trim().is_empty());
        // A paused phase is fully described by its frozen remaining time.
        has_category
            && (self.is_paused || self.phase_started_at.is_some())
            && self.is_paused == self.paused_remaining_ms.is_some()
    }

    /// Parse a stored value into a snapshot.
    ///
    /// Any shape or invariant mismatch yields `None`, which callers treat as
    /// "no prior snapshot".
    pub fn from_value(value: serde_json::Value) -> Option<Self> {
        match serde_json::from_value::<TimerSnapshot>(value) {
            Ok(snapshot) if snapshot.is_consistent() => Some(snapshot),
            Ok(snapshot) => {
                tracing::warn!(?snapshot, "discarding inconsistent timer snapshot");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "discarding malformed timer snapshot");
                None
            }
        }
    }
}
