//! Wiring shared by every command: open the store, load the collaborators,
//! restore the engine.

use std::io::Write;
use std::sync::Arc;

use focuscycle_core::notify::NotificationSink;
use focuscycle_core::{
    CategoryStore, Config, Event, Phase, SettingsStore, SqliteStore, TimerContext, TimerEngine,
};

pub struct App {
    pub store: Arc<SqliteStore>,
    pub settings: Arc<SettingsStore>,
    pub categories: Arc<CategoryStore>,
}

impl App {
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        let store = Arc::new(SqliteStore::open()?);
        Ok(Self {
            settings: Arc::new(SettingsStore::load(store.clone())),
            categories: Arc::new(CategoryStore::load(store.clone())),
            store,
        })
    }

    /// Restore the timer, replaying anything that elapsed since the last run.
    pub fn restore_timer(&self, config: &Config) -> (TimerEngine, Option<Event>) {
        let sink = TerminalNotifier::new(config, &self.settings.get());
        let ctx = TimerContext::new(
            self.store.clone(),
            self.settings.clone(),
            self.categories.clone(),
        )
        .with_sink(Arc::new(sink));
        TimerEngine::restore(ctx)
    }
}

/// Announces phase changes on stderr, optionally with the terminal bell.
pub struct TerminalNotifier {
    bell: bool,
    print: bool,
}

impl TerminalNotifier {
    pub fn new(config: &Config, settings: &focuscycle_core::Settings) -> Self {
        Self {
            bell: config.notifications.bell && settings.sound_enabled,
            print: config.notifications.print_phase_changes && settings.notification_enabled,
        }
    }
}

impl NotificationSink for TerminalNotifier {
    fn phase_completed(&self, new_phase: Phase) {
        let mut stderr = std::io::stderr().lock();
        if self.print {
            let _ = writeln!(stderr, "{new_phase} starts now");
        }
        if self.bell {
            let _ = write!(stderr, "\x07");
            let _ = stderr.flush();
        }
    }
}
