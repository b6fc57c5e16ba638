// crates/network/src/cache.rs
//! Source URL to duration cache, kept for the life of the process

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Shared cache of probed durations in seconds
///
/// `0.0` is stored for sources that gave no answer. Such entries are not
/// treated as known, so the next request probes the source again.
#[derive(Debug, Clone, Default)]
pub struct DurationCache {
    entries: Arc<RwLock<HashMap<String, f64>>>,
}

impl DurationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw cached value, including unknown (`0.0`) entries
    pub fn get(&self, source: &str) -> Option<f64> {
        self.entries.read().ok()?.get(source).copied()
    }

    /// Cached duration if one is known
    pub fn known(&self, source: &str) -> Option<f64> {
        self.get(source).filter(|seconds| *seconds > 0.0)
    }

    pub fn insert(&self, source: impl Into<String>, seconds: f64) {
        let seconds = if seconds.is_finite() && seconds > 0.0 {
            seconds
        } else {
            0.0
        };

        if let Ok(mut entries) = self.entries.write() {
            entries.insert(source.into(), seconds);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_ignores_unknown_entries() {
        let cache = DurationCache::new();
        cache.insert("a.mp3", 0.0);
        cache.insert("b.mp3", 1800.0);

        assert_eq!(cache.get("a.mp3"), Some(0.0));
        assert_eq!(cache.known("a.mp3"), None);
        assert_eq!(cache.known("b.mp3"), Some(1800.0));
        assert_eq!(cache.known("c.mp3"), None);
    }

    #[test]
    fn test_invalid_values_stored_as_unknown() {
        let cache = DurationCache::new();
        cache.insert("nan.mp3", f64::NAN);
        cache.insert("inf.mp3", f64::INFINITY);
        cache.insert("neg.mp3", -3.0);

        assert_eq!(cache.get("nan.mp3"), Some(0.0));
        assert_eq!(cache.get("inf.mp3"), Some(0.0));
        assert_eq!(cache.get("neg.mp3"), Some(0.0));
    }

    #[test]
    fn test_clones_share_entries() {
        let cache = DurationCache::new();
        let clone = cache.clone();
        clone.insert("x.mp3", 60.0);
        assert_eq!(cache.known("x.mp3"), Some(60.0));
        assert_eq!(cache.len(), 1);
    }
}
