//! # focuscycle Core Library
//!
//! Core business logic for the focuscycle interval timer. Every operation is
//! available to a standalone CLI binary; any graphical front-end is a thin
//! layer over the same library.
//!
//! ## Architecture
//!
//! - **Timer Engine**: A wall-clock-based state machine that requires the caller
//!   to periodically invoke `tick()`, and that replays missed phases on restore
//! - **Settings**: The configuration provider mapping phases to durations
//! - **Categories**: The accumulator credited with completed focus intervals
//! - **Storage**: JSON key-value stores (in-memory and SQLite) plus TOML
//!   application configuration
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`TimerDriver`]: Single-task executor that owns an engine and ticks it
//! - [`SettingsStore`]: Persisted timer durations
//! - [`CategoryStore`]: Persisted categories and accumulated minutes
//! - [`KeyValueStore`]: Trait every persistence backend implements

pub mod categories;
pub mod error;
pub mod events;
pub mod notify;
pub mod settings;
pub mod stats;
pub mod storage;
pub mod timer;

pub use categories::{Accumulator, Category, CategoryStore};
pub use error::{ConfigError, CoreError, StorageError, ValidationError};
pub use events::Event;
pub use notify::{NotificationSink, Subscription};
pub use settings::{PhaseDurations, Settings, SettingsStore, TimerSettings};
pub use stats::{format_countdown, format_minutes, StudySummary};
pub use storage::{Config, KeyValueStore, MemoryStore, SqliteStore};
pub use timer::{Phase, TimerContext, TimerDriver, TimerEngine, TimerHandle, TimerSnapshot};
