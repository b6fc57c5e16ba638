//! Typed access to the stored listener preferences
//!
//! Values that are missing or unreadable fall back to defaults; they are never
//! an error for the caller.

use crate::keys;
use std::str::FromStr;
use std::sync::Arc;
use taleshelf_core::{KeyValueStore, PlaybackSpeed, PlayerDisplayMode, Result, SleepTimerMode};

/// Speed, sleep timer and layout preferences on top of a key-value store
#[derive(Clone)]
pub struct Preferences {
    store: Arc<dyn KeyValueStore>,
    default_speed: PlaybackSpeed,
}

impl Preferences {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            default_speed: PlaybackSpeed::default(),
        }
    }

    /// Speed reported when none has been stored yet
    pub fn with_default_speed(mut self, speed: PlaybackSpeed) -> Self {
        self.default_speed = speed;
        self
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    pub fn speed(&self) -> PlaybackSpeed {
        self.read(keys::SPEED).unwrap_or(self.default_speed)
    }

    pub fn set_speed(&self, speed: PlaybackSpeed) -> Result<()> {
        self.store.set(keys::SPEED, &speed.to_string())
    }

    pub fn sleep_timer_mode(&self) -> SleepTimerMode {
        self.read::<i64>(keys::SLEEP_TIMER)
            .and_then(SleepTimerMode::from_code)
            .unwrap_or_default()
    }

    pub fn set_sleep_timer_mode(&self, mode: SleepTimerMode) -> Result<()> {
        self.store.set(keys::SLEEP_TIMER, &mode.code().to_string())
    }

    pub fn display_mode(&self) -> PlayerDisplayMode {
        self.read(keys::DISPLAY_MODE).unwrap_or_default()
    }

    pub fn set_display_mode(&self, mode: PlayerDisplayMode) -> Result<()> {
        self.store.set(keys::DISPLAY_MODE, mode.as_str())
    }

    fn read<T: FromStr>(&self, key: &str) -> Option<T> {
        let raw = self.store.get(key)?;
        match raw.trim().parse() {
            Ok(value) => Some(value),
            Err(_) => {
                log::debug!("Ignoring unreadable '{}' value {:?}", key, raw);
                None
            }
        }
    }
}

impl std::fmt::Debug for Preferences {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Preferences")
            .field("default_speed", &self.default_speed)
            .finish_non_exhaustive()
    }
}
