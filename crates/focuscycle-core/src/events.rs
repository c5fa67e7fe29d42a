use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{Phase, TimerSnapshot};

/// Every command and completed phase produces an Event.
/// Front-ends print or forward them; nothing inside the core consumes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        category_id: String,
        duration_ms: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        phase: Phase,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        phase: Phase,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    /// The current phase was abandoned early. Never credited.
    PhaseSkipped {
        from: Phase,
        to: Phase,
        completed_cycles: u32,
        at: DateTime<Utc>,
    },
    /// The current phase ran out.
    PhaseCompleted {
        from: Phase,
        to: Phase,
        completed_cycles: u32,
        /// Minutes credited to the category, if the credit went through.
        credited_minutes: Option<u32>,
        at: DateTime<Utc>,
    },
    /// Startup replay of phases that elapsed while the process was away.
    CaughtUp {
        phases_replayed: u32,
        intervals_credited: u32,
        minutes_credited: u64,
        phase: Phase,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: TimerSnapshot,
        remaining_ms: u64,
        total_ms: u64,
        at: DateTime<Utc>,
    },
}
