//! Timer settings: the configuration provider consulted by the engine.
//!
//! Settings live as one JSON blob in the key-value store. A stored blob is
//! merged over the defaults, so older blobs missing newer fields still load.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result, ValidationError};
use crate::notify::{Listeners, Subscription};
use crate::storage::{keys, KeyValueStore};
use crate::timer::Phase;

pub const WORK_MINUTES_RANGE: (u32, u32) = (1, 180);
pub const SHORT_REST_MINUTES_RANGE: (u32, u32) = (1, 60);
pub const LONG_REST_MINUTES_RANGE: (u32, u32) = (1, 120);
pub const CYCLES_RANGE: (u32, u32) = (1, 10);

/// Translates phases into durations.
///
/// Values are assumed to be validated already; the engine does not re-check
/// them beyond refusing to replay zero-length phases.
pub trait PhaseDurations: Send + Sync {
    /// Length of `phase` in minutes. Idle is always zero.
    fn minutes_of(&self, phase: Phase) -> u32;

    fn cycles_before_long_rest(&self) -> u32;

    /// Length of `phase` in milliseconds.
    fn duration_ms(&self, phase: Phase) -> u64 {
        u64::from(self.minutes_of(phase)).saturating_mul(60_000)
    }
}

/// The four durations that shape a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerSettings {
    pub work_minutes: u32,
    pub short_rest_minutes: u32,
    pub long_rest_minutes: u32,
    pub cycles_before_long_rest: u32,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            work_minutes: 25,
            short_rest_minutes: 5,
            long_rest_minutes: 15,
            cycles_before_long_rest: 4,
        }
    }
}

impl TimerSettings {
    /// Check every field against its accepted range.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_range("work_minutes", self.work_minutes, WORK_MINUTES_RANGE)?;
        check_range(
            "short_rest_minutes",
            self.short_rest_minutes,
            SHORT_REST_MINUTES_RANGE,
        )?;
        check_range(
            "long_rest_minutes",
            self.long_rest_minutes,
            LONG_REST_MINUTES_RANGE,
        )?;
        check_range(
            "cycles_before_long_rest",
            self.cycles_before_long_rest,
            CYCLES_RANGE,
        )?;
        Ok(())
    }
}

impl PhaseDurations for TimerSettings {
    fn minutes_of(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Active => self.work_minutes,
            Phase::ShortRest => self.short_rest_minutes,
            Phase::LongRest => self.long_rest_minutes,
            Phase::Idle => 0,
        }
    }

    fn cycles_before_long_rest(&self) -> u32 {
        self.cycles_before_long_rest
    }
}

fn check_range(field: &'static str, value: u32, (min, max): (u32, u32)) -> Result<(), ValidationError> {
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field,
            min,
            max,
            value,
        });
    }
    Ok(())
}

/// Everything stored under the settings key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(flatten)]
    pub timer: TimerSettings,
    pub sound_enabled: bool,
    pub vibration_enabled: bool,
    pub notification_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timer: TimerSettings::default(),
            sound_enabled: true,
            vibration_enabled: true,
            notification_enabled: true,
        }
    }
}

/// A notification preference toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preference {
    Sound,
    Vibration,
    Notification,
}

impl std::str::FromStr for Preference {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sound" | "sound_enabled" => Ok(Preference::Sound),
            "vibration" | "vibration_enabled" => Ok(Preference::Vibration),
            "notification" | "notification_enabled" => Ok(Preference::Notification),
            other => Err(ValidationError::UnknownPreference(other.to_string()).into()),
        }
    }
}

/// Settings persisted in a key-value store.
pub struct SettingsStore {
    store: Arc<dyn KeyValueStore>,
    settings: RwLock<Settings>,
    listeners: Listeners<Settings>,
}

impl SettingsStore {
    /// Load settings from `store`, falling back to defaults.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let settings = match store.get(keys::SETTINGS) {
            Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "stored settings unreadable, using defaults");
                Settings::default()
            }),
            None => Settings::default(),
        };
        Self {
            store,
            settings: RwLock::new(settings),
            listeners: Listeners::new(),
        }
    }

    pub fn get(&self) -> Settings {
        self.settings
            .read()
            .map(|s| s.clone())
            .unwrap_or_else(|e| e.into_inner().clone())
    }

    pub fn timer(&self) -> TimerSettings {
        self.get().timer
    }

    /// Replace the timer durations after validating them.
    ///
    /// # Errors
    /// Returns a validation error if any value is out of range, or a storage
    /// error if the write fails. Settings are untouched in both cases.
    pub fn update_timer_settings(&self, timer: TimerSettings) -> Result<Settings> {
        timer.validate()?;
        self.modify(|s| s.timer = timer)
    }

    pub fn set_preference(&self, pref: Preference, enabled: bool) -> Result<Settings> {
        self.modify(|s| match pref {
            Preference::Sound => s.sound_enabled = enabled,
            Preference::Vibration => s.vibration_enabled = enabled,
            Preference::Notification => s.notification_enabled = enabled,
        })
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Settings) + Send + Sync + 'static,
    {
        self.listeners.subscribe(listener)
    }

    fn modify(&self, apply: impl FnOnce(&mut Settings)) -> Result<Settings> {
        let updated = {
            let mut settings = self.settings.write().unwrap_or_else(|e| e.into_inner());
            let mut draft = settings.clone();
            apply(&mut draft);
            self.store
                .set(keys::SETTINGS, &serde_json::to_value(&draft)?)?;
            *settings = draft.clone();
            draft
        };
        self.listeners.notify(&updated);
        Ok(updated)
    }
}

impl PhaseDurations for SettingsStore {
    fn minutes_of(&self, phase: Phase) -> u32 {
        self.timer().minutes_of(phase)
    }

    fn cycles_before_long_rest(&self) -> u32 {
        self.timer().cycles_before_long_rest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::storage::MemoryStore;
    use serde_json::json;

    #[test]
    fn durations_by_phase() {
        let t = TimerSettings::default();
        assert_eq!(t.duration_ms(Phase::Active), 25 * 60_000);
        assert_eq!(t.duration_ms(Phase::ShortRest), 5 * 60_000);
        assert_eq!(t.duration_ms(Phase::LongRest), 15 * 60_000);
        assert_eq!(t.duration_ms(Phase::Idle), 0);
    }

    #[test]
    fn validate_rejects_each_bound() {
        let base = TimerSettings::default();
        let cases = [
            TimerSettings { work_minutes: 0, ..base },
            TimerSettings { work_minutes: 181, ..base },
            TimerSettings { short_rest_minutes: 61, ..base },
            TimerSettings { long_rest_minutes: 0, ..base },
            TimerSettings { cycles_before_long_rest: 11, ..base },
        ];
        for case in cases {
            assert!(case.validate().is_err(), "{case:?} should be rejected");
        }
        assert!(TimerSettings { work_minutes: 180, ..base }.validate().is_ok());
    }

    #[test]
    fn stored_blob_merges_over_defaults() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(keys::SETTINGS, &json!({"work_minutes": 50, "sound_enabled": false}))
            .unwrap();
        let settings = SettingsStore::load(store).get();
        assert_eq!(settings.timer.work_minutes, 50);
        assert_eq!(settings.timer.short_rest_minutes, 5);
        assert!(!settings.sound_enabled);
        assert!(settings.vibration_enabled);
    }

    #[test]
    fn update_persists_and_notifies() {
        let store = Arc::new(MemoryStore::new());
        let settings = SettingsStore::load(store.clone());
        let seen = Arc::new(std::sync::Mutex::new(None));
        let s = Arc::clone(&seen);
        let _sub = settings.subscribe(move |v| *s.lock().unwrap() = Some(v.timer.work_minutes));

        let timer = TimerSettings {
            work_minutes: 45,
            short_rest_minutes: 10,
            long_rest_minutes: 30,
            cycles_before_long_rest: 3,
        };
        settings.update_timer_settings(timer).unwrap();

        assert_eq!(*seen.lock().unwrap(), Some(45));
        assert_eq!(settings.cycles_before_long_rest(), 3);
        let reloaded = SettingsStore::load(store);
        assert_eq!(reloaded.timer(), timer);
    }

    #[test]
    fn invalid_update_leaves_settings_untouched() {
        let settings = SettingsStore::load(Arc::new(MemoryStore::new()));
        let err = settings
            .update_timer_settings(TimerSettings {
                cycles_before_long_rest: 0,
                ..TimerSettings::default()
            })
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert_eq!(settings.timer(), TimerSettings::default());
    }

    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> Option<serde_json::Value> {
            None
        }

        fn set(&self, _key: &str, _value: &serde_json::Value) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("read-only".into()))
        }

        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("read-only".into()))
        }
    }

    #[test]
    fn failed_write_keeps_previous_settings() {
        let settings = SettingsStore::load(Arc::new(ReadOnlyStore));
        let err = settings
            .update_timer_settings(TimerSettings {
                work_minutes: 50,
                ..TimerSettings::default()
            })
            .unwrap_err();
        assert!(matches!(err, CoreError::Storage(_)));
        assert_eq!(settings.timer(), TimerSettings::default());
        assert!(settings.set_preference(Preference::Sound, false).is_err());
        assert!(settings.get().sound_enabled);
    }

    #[test]
    fn preference_toggle() {
        let settings = SettingsStore::load(Arc::new(MemoryStore::new()));
        let pref: Preference = "vibration".parse().unwrap();
        settings.set_preference(pref, false).unwrap();
        assert!(!settings.get().vibration_enabled);
        assert!(matches!(
            "theme".parse::<Preference>(),
            Err(CoreError::Validation(ValidationError::UnknownPreference(key))) if key == "theme"
        ));
    }
}
