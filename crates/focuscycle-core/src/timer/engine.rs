//! Timer engine implementation.
//!
//! The timer engine is a wall-clock-based state machine. It does not use
//! internal threads - the caller is responsible for calling `tick()`
//! periodically while [`TimerEngine::is_ticking`] is true (see
//! [`super::driver`] for a ready-made loop).
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Active -> ShortRest | LongRest -> Active -> ... -> (reset) Idle
//! ```
//!
//! Any non-Idle phase can additionally be paused. Elapsed Active phases are
//! credited to the session's category; skipped or reset ones never are.
//!
//! ## Usage
//!
//! ```ignore
//! let (mut engine, caught_up) = TimerEngine::restore(context);
//! engine.start("category-id")?;
//! // In a loop:
//! engine.tick(); // Returns Some(Event) when a phase completes
//! ```

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use super::clock::{Clock, SystemClock};
use super::phase::{next_phase, Phase};
use super::snapshot::TimerSnapshot;
use crate::categories::Accumulator;
use crate::error::{Result, ValidationError};
use crate::events::Event;
use crate::notify::{Listeners, NoopSink, NotificationSink, Subscription};
use crate::settings::PhaseDurations;
use crate::storage::{keys, KeyValueStore};

/// Collaborators injected into a [`TimerEngine`].
#[derive(Clone)]
pub struct TimerContext {
    pub store: Arc<dyn KeyValueStore>,
    pub durations: Arc<dyn PhaseDurations>,
    pub accumulator: Arc<dyn Accumulator>,
    pub sink: Arc<dyn NotificationSink>,
    pub clock: Arc<dyn Clock>,
}

impl TimerContext {
    /// Context using the system clock and a sink that drops notifications.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        durations: Arc<dyn PhaseDurations>,
        accumulator: Arc<dyn Accumulator>,
    ) -> Self {
        Self {
            store,
            durations,
            accumulator,
            sink: Arc::new(NoopSink),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

/// Time left in the phase described by `state` at `now`.
pub fn remaining_at(state: &TimerSnapshot, now: DateTime<Utc>, durations: &dyn PhaseDurations) -> u64 {
    if state.phase == Phase::Idle {
        return 0;
    }
    if state.is_paused {
        return state.paused_remaining_ms.unwrap_or(0);
    }
    let Some(started) = state.phase_started_at else {
        return 0;
    };
    let total = i64::try_from(durations.duration_ms(state.phase)).unwrap_or(i64::MAX);
    let elapsed = (now - started).num_milliseconds();
    u64::try_from(total.saturating_sub(elapsed)).unwrap_or(0)
}

/// Core timer engine.
///
/// Owns the single [`TimerSnapshot`] and persists it after every change.
pub struct TimerEngine {
    state: TimerSnapshot,
    ticking: bool,
    ctx: TimerContext,
    listeners: Listeners<TimerSnapshot>,
}

impl TimerEngine {
    /// Create an Idle engine without reading any stored snapshot.
    pub fn new(ctx: TimerContext) -> Self {
        Self {
            state: TimerSnapshot::idle(),
            ticking: false,
            ctx,
            listeners: Listeners::new(),
        }
    }

    /// Load the stored snapshot and replay every phase that elapsed while
    /// the process was not running.
    ///
    /// Returns the engine and, if any phase was replayed, a `CaughtUp` event.
    pub fn restore(ctx: TimerContext) -> (Self, Option<Event>) {
        let mut engine = Self::new(ctx);
        let saved = engine
            .ctx
            .store
            .get(keys::TIMER_STATE)
            .and_then(TimerSnapshot::from_value);

        let event = match saved {
            Some(saved) if !saved.is_idle() => engine.catch_up(saved),
            _ => None,
        };
        (engine, event)
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Copy of the current state.
    pub fn state(&self) -> TimerSnapshot {
        self.state.clone()
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    /// Whether the periodic completion check should run.
    pub fn is_ticking(&self) -> bool {
        self.ticking
    }

    pub fn remaining_ms(&self) -> u64 {
        remaining_at(&self.state, self.ctx.clock.now(), self.ctx.durations.as_ref())
    }

    /// Full length of the current phase.
    pub fn total_ms(&self) -> u64 {
        self.ctx.durations.duration_ms(self.state.phase)
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            state: self.state(),
            remaining_ms: self.remaining_ms(),
            total_ms: self.total_ms(),
            at: self.ctx.clock.now(),
        }
    }

    /// Register a listener called with the new state after every change.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&TimerSnapshot) + Send + Sync + 'static,
    {
        self.listeners.subscribe(listener)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a fresh session crediting `category_id`.
    ///
    /// # Errors
    /// `ValidationError::MissingCategory` if the id is blank; state is
    /// untouched in that case.
    pub fn start(&mut self, category_id: &str) -> Result<Event> {
        let category_id = category_id.trim();
        if category_id.is_empty() {
            return Err(ValidationError::MissingCategory.into());
        }

        let now = self.ctx.clock.now();
        self.state = TimerSnapshot {
            phase: Phase::Active,
            phase_started_at: Some(now),
            is_paused: false,
            paused_remaining_ms: None,
            completed_cycles: 0,
            category_id: Some(category_id.to_string()),
        };
        self.ticking = true;
        self.persist();
        self.listeners.notify(&self.state);
        tracing::debug!(category_id, "timer started");

        Ok(Event::TimerStarted {
            category_id: category_id.to_string(),
            duration_ms: self.total_ms(),
            at: now,
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        if self.state.is_idle() || self.state.is_paused {
            return None;
        }
        let remaining_ms = self.remaining_ms();
        self.state.is_paused = true;
        self.state.paused_remaining_ms = Some(remaining_ms);
        self.ticking = false;
        self.persist();
        self.listeners.notify(&self.state);
        tracing::debug!(phase = %self.state.phase, remaining_ms, "timer paused");

        Some(Event::TimerPaused {
            phase: self.state.phase,
            remaining_ms,
            at: self.ctx.clock.now(),
        })
    }

    pub fn resume(&mut self) -> Option<Event> {
        if !self.state.is_paused {
            return None;
        }
        let now = self.ctx.clock.now();
        let mut remaining_ms = self.state.paused_remaining_ms.unwrap_or(0);
        // Signed so a frozen value longer than the (since shortened) phase
        // still resumes exactly where it paused.
        let already_elapsed = i64::try_from(self.total_ms()).unwrap_or(i64::MAX)
            - i64::try_from(remaining_ms).unwrap_or(i64::MAX);
        let started = Duration::try_milliseconds(already_elapsed)
            .and_then(|elapsed| now.checked_sub_signed(elapsed));
        self.state.phase_started_at = match started {
            Some(started) => Some(started),
            None => {
                tracing::warn!(
                    phase = %self.state.phase,
                    remaining_ms,
                    "paused remaining time out of range; restarting phase"
                );
                remaining_ms = self.total_ms();
                Some(now)
            }
        };
        self.state.is_paused = false;
        self.state.paused_remaining_ms = None;
        self.ticking = true;
        self.persist();
        self.listeners.notify(&self.state);
        tracing::debug!(phase = %self.state.phase, remaining_ms, "timer resumed");

        Some(Event::TimerResumed {
            phase: self.state.phase,
            remaining_ms,
            at: now,
        })
    }

    /// Drop the session without crediting the phase in progress.
    pub fn reset(&mut self) -> Event {
        self.ticking = false;
        self.state = TimerSnapshot::idle();
        self.persist();
        self.listeners.notify(&self.state);
        tracing::debug!("timer reset");
        Event::TimerReset {
            at: self.ctx.clock.now(),
        }
    }

    /// Abandon the current phase and move on.
    ///
    /// Skipping focus counts toward the long-rest cadence but is never
    /// credited. A paused phase may be skipped; the next phase runs.
    pub fn skip_phase(&mut self) -> Option<Event> {
        if self.state.is_idle() {
            return None;
        }
        let from = self.state.phase;
        let to = if from == Phase::Active {
            self.state.completed_cycles += 1;
            next_phase(
                from,
                self.state.completed_cycles,
                self.ctx.durations.cycles_before_long_rest(),
            )
        } else {
            Phase::Active
        };

        let now = self.ctx.clock.now();
        self.state.phase = to;
        self.state.phase_started_at = Some(now);
        self.state.is_paused = false;
        self.state.paused_remaining_ms = None;
        self.persist();
        self.ticking = true;
        self.listeners.notify(&self.state);
        self.ctx.sink.phase_completed(to);
        tracing::debug!(%from, %to, cycles = self.state.completed_cycles, "phase skipped");

        Some(Event::PhaseSkipped {
            from,
            to,
            completed_cycles: self.state.completed_cycles,
            at: now,
        })
    }

    /// Call periodically. Returns `Some(Event::PhaseCompleted)` when the
    /// current phase has run out.
    pub fn tick(&mut self) -> Option<Event> {
        if !self.ticking || self.state.is_idle() || self.state.is_paused {
            return None;
        }
        if self.remaining_ms() > 0 {
            return None;
        }
        Some(self.complete_phase())
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete_phase(&mut self) -> Event {
        let from = self.state.phase;
        let mut credited_minutes = None;
        if from == Phase::Active {
            credited_minutes = self.credit_focus(self.state.category_id.as_deref());
            self.state.completed_cycles += 1;
        }
        let to = next_phase(
            from,
            self.state.completed_cycles,
            self.ctx.durations.cycles_before_long_rest(),
        );

        let now = self.ctx.clock.now();
        self.state.phase = to;
        self.state.phase_started_at = Some(now);
        self.persist();
        self.listeners.notify(&self.state);
        self.ctx.sink.phase_completed(to);
        tracing::debug!(%from, %to, cycles = self.state.completed_cycles, "phase completed");

        Event::PhaseCompleted {
            from,
            to,
            completed_cycles: self.state.completed_cycles,
            credited_minutes,
            at: now,
        }
    }

    /// Replay phases that elapsed between the saved snapshot and now.
    fn catch_up(&mut self, saved: TimerSnapshot) -> Option<Event> {
        if saved.is_paused {
            // No time passes while paused, however long the process was gone.
            tracing::debug!(phase = %saved.phase, "restored paused timer");
            self.state = saved;
            self.ticking = false;
            return None;
        }

        let now = self.ctx.clock.now();
        let started = saved.phase_started_at.unwrap_or(now);
        // A clock that moved backwards counts as no time passed.
        let mut elapsed = u64::try_from((now - started).num_milliseconds()).unwrap_or(0);
        let mut phase = saved.phase;
        let mut cycles = saved.completed_cycles;
        let category_id = saved.category_id;

        let mut phases_replayed = 0u32;
        let mut intervals_credited = 0u32;
        let mut minutes_credited = 0u64;

        while phase != Phase::Idle {
            let duration = self.ctx.durations.duration_ms(phase);
            if duration == 0 {
                tracing::error!(%phase, "phase has zero duration; restarting it instead of replaying");
                elapsed = 0;
                break;
            }
            if elapsed < duration {
                break;
            }
            elapsed -= duration;
            if phase == Phase::Active {
                if let Some(minutes) = self.credit_focus(category_id.as_deref()) {
                    intervals_credited += 1;
                    minutes_credited += u64::from(minutes);
                }
                cycles += 1;
            }
            phase = next_phase(phase, cycles, self.ctx.durations.cycles_before_long_rest());
            phases_replayed += 1;
        }

        let remainder = Duration::milliseconds(i64::try_from(elapsed).unwrap_or(i64::MAX));
        self.state = TimerSnapshot {
            phase,
            phase_started_at: Some(now - remainder),
            is_paused: false,
            paused_remaining_ms: None,
            completed_cycles: cycles,
            category_id,
        };
        self.persist();
        self.ticking = phase != Phase::Idle;

        if phases_replayed == 0 {
            tracing::debug!(%phase, "restored running timer");
            return None;
        }
        tracing::info!(
            phases_replayed,
            intervals_credited,
            minutes_credited,
            %phase,
            "caught up on phases elapsed while away"
        );
        Some(Event::CaughtUp {
            phases_replayed,
            intervals_credited,
            minutes_credited,
            phase,
            at: now,
        })
    }

    /// Credit one focus interval. Failures are logged and swallowed.
    fn credit_focus(&self, category_id: Option<&str>) -> Option<u32> {
        let minutes = self.ctx.durations.minutes_of(Phase::Active);
        let Some(category_id) = category_id else {
            tracing::warn!("focus interval completed without a category; not credited");
            return None;
        };
        match self.ctx.accumulator.credit_minutes(category_id, minutes) {
            Ok(()) => Some(minutes),
            Err(e) => {
                tracing::warn!(category_id, minutes, error = %e, "failed to credit focus time");
                None
            }
        }
    }

    fn persist(&self) {
        let result = serde_json::to_value(&self.state)
            .map_err(crate::error::CoreError::from)
            .and_then(|value| {
                self.ctx
                    .store
                    .set(keys::TIMER_STATE, &value)
                    .map_err(Into::into)
            });
        if let Err(e) = result {
            tracing::warn!(error = %e, "failed to persist timer state; continuing in memory");
        }
    }
}
