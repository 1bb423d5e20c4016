//! Client-side state that lives outside the store: the timer snapshot, the
//! active task, the acting user and display preferences.
//!
//! Everything here is best-effort. A missing or corrupt file, or a value that
//! no longer deserializes, reads back as absent and callers use defaults.

use crate::storage::Storage;
use crate::timer::{Timer, TimerSettings, TimerSnapshot};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

pub const TIMER_KEY: &str = "timer";
pub const TIMER_SETTINGS_KEY: &str = "timerSettings";
pub const ACTIVE_TASK_KEY: &str = "activeTask";
pub const USER_KEY: &str = "user";
pub const THEME_KEY: &str = "theme";
pub const ACCENT_KEY: &str = "accent";

pub const DEFAULT_ACCENT: &str = "cyan";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

pub struct LocalStore {
    storage: Storage,
    entries: BTreeMap<String, Value>,
}

impl LocalStore {
    pub fn open(dir: &Path) -> Self {
        Self::from_storage(Storage::in_dir(dir, "local.json"))
    }

    pub fn from_storage(storage: Storage) -> Self {
        let entries = load_entries(&storage);
        Self { storage, entries }
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.entries.get(key)?;
        match serde_json::from_value(value.clone()) {
            Ok(v) => Some(v),
            Err(e) => {
                debug!("Discarding local value {key}: {e}");
                None
            }
        }
    }

    /// Writes one key. The file is re-read first so keys written by other
    /// processes since `open` are kept.
    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.entries = load_entries(&self.storage);
        self.entries.insert(key.to_string(), value);
        self.storage.save(&self.entries)
    }

    pub fn remove(&mut self, key: &str) -> Result<()> {
        self.entries = load_entries(&self.storage);
        if self.entries.remove(key).is_some() {
            self.storage.save(&self.entries)?;
        }
        Ok(())
    }

    pub fn user(&self) -> Option<String> {
        self.get::<String>(USER_KEY).filter(|u| !u.trim().is_empty())
    }

    pub fn theme(&self) -> Theme {
        self.get(THEME_KEY).unwrap_or_default()
    }

    pub fn accent(&self) -> String {
        self.get(ACCENT_KEY)
            .unwrap_or_else(|| DEFAULT_ACCENT.to_string())
    }

    /// Stored timer lengths, with zero falling back to `defaults` and the
    /// rest clamped to the allowed range.
    pub fn timer_settings(&self, defaults: TimerSettings) -> TimerSettings {
        let Some(stored) = self.get::<TimerSettings>(TIMER_SETTINGS_KEY) else {
            return defaults;
        };
        let or_default = |minutes: u32, fallback: u32| if minutes == 0 { fallback } else { minutes };
        TimerSettings::clamped(
            or_default(stored.work_minutes, defaults.work_minutes),
            or_default(stored.break_minutes, defaults.break_minutes),
        )
    }

    /// Saves new timer lengths. Whatever interval was saved is stopped and
    /// replaced by a fresh focus interval of the new length.
    pub fn change_timer_settings(&mut self, settings: TimerSettings, now: DateTime<Utc>) -> Result<Timer> {
        self.set(TIMER_SETTINGS_KEY, &settings)?;
        let mut timer = match self.get::<TimerSnapshot>(TIMER_KEY) {
            Some(snapshot) => Timer::restore(&snapshot, now),
            None => Timer::new(settings),
        };
        timer.apply_settings(settings);
        self.set(TIMER_KEY, &timer.snapshot(now))?;
        Ok(timer)
    }
}

fn load_entries(storage: &Storage) -> BTreeMap<String, Value> {
    storage.load().unwrap_or_else(|e| {
        warn!("Ignoring unreadable local state at {}: {e}", storage.path().display());
        BTreeMap::new()
    })
}
