//! Seams between the playback core and its external collaborators

use crate::error::Result;
use crate::types::{TitleId, Timestamp, Track};
use std::sync::atomic::{AtomicI64, Ordering};

/// Durable string key-value store (the platform's local storage)
pub trait KeyValueStore: Send + Sync {
    /// Returns the stored value, or `None` when absent or unreadable
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, overwriting any previous value
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Source of wall-clock time
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            millis: AtomicI64::new(start.as_millis()),
        }
    }

    pub fn set(&self, at: Timestamp) {
        self.millis.store(at.as_millis(), Ordering::SeqCst);
    }

    pub fn advance_millis(&self, millis: u64) {
        self.millis.fetch_add(millis as i64, Ordering::SeqCst);
    }

    pub fn advance_secs(&self, secs: u64) {
        self.advance_millis(secs * 1000);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_millis(self.millis.load(Ordering::SeqCst))
    }
}

/// Where a measured duration should be shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DisplayTarget {
    pub title_id: TitleId,
    pub track_index: usize,
}

impl DisplayTarget {
    pub fn new(title_id: TitleId, track_index: usize) -> Self {
        Self {
            title_id,
            track_index,
        }
    }
}

/// Background duration discovery for the visible track list
pub trait DurationPrefetch: Send + Sync {
    /// Drops every pending request; in-flight results are discarded later
    fn reset(&self);

    /// Queues a duration lookup for `track`, shown at `target`
    fn request(&self, track: &Track, target: DisplayTarget);
}
