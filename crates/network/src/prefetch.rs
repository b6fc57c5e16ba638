// crates/network/src/prefetch.rs
//! Sequential metadata prefetcher
//!
//! Duration lookups for the visible track list run one at a time on a
//! background task, with a short pause between them so a long playlist does
//! not flood the file host. Every lookup ends in exactly one update: errors
//! and timeouts report `0.0` (unknown).
//!
//! Clearing the queue bumps a generation counter instead of aborting work. A
//! probe that is already running still finishes and fills the cache, but its
//! update is only sent if no clear happened in the meantime.

use crate::cache::DurationCache;
use crate::probe::DurationProbe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use taleshelf_config::PrefetchConfig;
use taleshelf_core::{format_clock, DisplayTarget, DurationPrefetch, Track};
use taleshelf_resilience::Timeout;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Pacing of the prefetch queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefetchSettings {
    /// A probe running longer than this reports unknown
    pub probe_timeout: Duration,
    /// Pause after each completed probe
    pub inter_request_delay: Duration,
}

impl Default for PrefetchSettings {
    fn default() -> Self {
        Self {
            probe_timeout: Duration::from_millis(5000),
            inter_request_delay: Duration::from_millis(50),
        }
    }
}

impl From<&PrefetchConfig> for PrefetchSettings {
    fn from(config: &PrefetchConfig) -> Self {
        Self {
            probe_timeout: Duration::from_millis(config.probe_timeout_ms),
            inter_request_delay: Duration::from_millis(config.inter_request_delay_ms),
        }
    }
}

/// A resolved duration for one display slot
#[derive(Debug, Clone, PartialEq)]
pub struct DurationUpdate {
    pub generation: u64,
    pub target: DisplayTarget,
    pub source: String,
    /// Seconds, `0.0` when unknown
    pub seconds: f64,
}

impl DurationUpdate {
    pub fn is_known(&self) -> bool {
        self.seconds > 0.0
    }

    /// Text for the track list: a clock value, or `--:--` when unknown
    pub fn label(&self) -> String {
        if self.is_known() {
            format_clock(self.seconds)
        } else {
            "--:--".to_string()
        }
    }
}

#[derive(Debug)]
struct Job {
    generation: u64,
    target: DisplayTarget,
    source: String,
}

/// Background queue of duration lookups with one lookup in flight
///
/// Must be created inside a Tokio runtime.
#[derive(Debug)]
pub struct MetadataPrefetcher {
    jobs: mpsc::UnboundedSender<Job>,
    updates: mpsc::UnboundedSender<DurationUpdate>,
    generation: Arc<AtomicU64>,
    cache: DurationCache,
    worker: JoinHandle<()>,
}

impl MetadataPrefetcher {
    /// Starts the worker; updates arrive on the returned receiver
    pub fn spawn<P: DurationProbe>(
        probe: P,
        settings: PrefetchSettings,
    ) -> (Self, mpsc::UnboundedReceiver<DurationUpdate>) {
        Self::with_cache(probe, settings, DurationCache::new())
    }

    /// Starts the worker on top of an existing cache
    pub fn with_cache<P: DurationProbe>(
        probe: P,
        settings: PrefetchSettings,
        cache: DurationCache,
    ) -> (Self, mpsc::UnboundedReceiver<DurationUpdate>) {
        let (jobs_tx, jobs_rx) = mpsc::unbounded_channel();
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();
        let generation = Arc::new(AtomicU64::new(0));

        let worker = tokio::spawn(run_queue(
            probe,
            settings,
            jobs_rx,
            updates_tx.clone(),
            generation.clone(),
            cache.clone(),
        ));

        let prefetcher = Self {
            jobs: jobs_tx,
            updates: updates_tx,
            generation,
            cache,
            worker,
        };

        (prefetcher, updates_rx)
    }

    /// Queues a lookup, or answers at once from the cache
    pub fn enqueue(&self, source: impl Into<String>, target: DisplayTarget) {
        let source = source.into();
        let generation = self.generation();

        if let Some(seconds) = self.cache.known(&source) {
            let _ = self.updates.send(DurationUpdate {
                generation,
                target,
                source,
                seconds,
            });
            return;
        }

        if self
            .jobs
            .send(Job {
                generation,
                target,
                source,
            })
            .is_err()
        {
            log::warn!("Prefetch worker has stopped; request dropped");
        }
    }

    /// Drops every queued lookup; a running one finishes silently
    pub fn clear(&self) {
        let next = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        log::debug!("Prefetch queue cleared (generation {})", next);
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn cache(&self) -> &DurationCache {
        &self.cache
    }
}

impl DurationPrefetch for MetadataPrefetcher {
    fn reset(&self) {
        self.clear();
    }

    fn request(&self, track: &Track, target: DisplayTarget) {
        self.enqueue(track.source.clone(), target);
    }
}

impl Drop for MetadataPrefetcher {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

async fn run_queue<P: DurationProbe>(
    probe: P,
    settings: PrefetchSettings,
    mut jobs: mpsc::UnboundedReceiver<Job>,
    updates: mpsc::UnboundedSender<DurationUpdate>,
    generation: Arc<AtomicU64>,
    cache: DurationCache,
) {
    let deadline = Timeout::new(settings.probe_timeout);
    while let Some(job) = jobs.recv().await {
        if job.generation != generation.load(Ordering::SeqCst) {
            log::trace!("Skipping cleared lookup of {}", job.source);
            continue;
        }

        // An earlier job for the same file may have answered already
        if let Some(seconds) = cache.known(&job.source) {
            let update = DurationUpdate {
                generation: job.generation,
                target: job.target,
                source: job.source,
                seconds,
            };
            if updates.send(update).is_err() {
                break;
            }
            continue;
        }

        let seconds = match deadline.execute(probe.probe(&job.source)).await {
            Ok(Ok(seconds)) if seconds.is_finite() && seconds > 0.0 => seconds,
            Ok(Ok(_)) => 0.0,
            Ok(Err(e)) => {
                log::debug!("Duration lookup failed for {}: {}", job.source, e);
                0.0
            }
            Err(e) => {
                log::debug!("Duration lookup for {} abandoned: {}", job.source, e);
                0.0
            }
        };

        cache.insert(job.source.clone(), seconds);

        if job.generation == generation.load(Ordering::SeqCst) {
            let update = DurationUpdate {
                generation: job.generation,
                target: job.target,
                source: job.source,
                seconds,
            };
            if updates.send(update).is_err() {
                log::debug!("Duration update receiver dropped, stopping prefetch");
                break;
            }
        } else {
            log::debug!("Discarding duration of {} from a cleared queue", job.source);
        }

        if !settings.inter_request_delay.is_zero() {
            tokio::time::sleep(settings.inter_request_delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NetworkResult;
    use taleshelf_core::TitleId;

    struct FixedProbe(f64);

    impl DurationProbe for FixedProbe {
        async fn probe(&self, _source: &str) -> NetworkResult<f64> {
            Ok(self.0)
        }
    }

    fn target(index: usize) -> DisplayTarget {
        DisplayTarget::new(TitleId::new(1), index)
    }

    #[test]
    fn test_settings_from_config() {
        let config = PrefetchConfig {
            probe_timeout_ms: 2500,
            inter_request_delay_ms: 0,
            ..Default::default()
        };
        let settings = PrefetchSettings::from(&config);
        assert_eq!(settings.probe_timeout, Duration::from_millis(2500));
        assert!(settings.inter_request_delay.is_zero());
        assert_eq!(
            PrefetchSettings::from(&PrefetchConfig::default()),
            PrefetchSettings::default()
        );
    }

    #[test]
    fn test_update_label() {
        let mut update = DurationUpdate {
            generation: 0,
            target: target(0),
            source: "a.mp3".to_string(),
            seconds: 3725.0,
        };
        assert_eq!(update.label(), "1:02:05");

        update.seconds = 0.0;
        assert!(!update.is_known());
        assert_eq!(update.label(), "--:--");
    }

    #[tokio::test]
    async fn test_non_finite_probe_result_is_unknown() {
        let (prefetcher, mut updates) =
            MetadataPrefetcher::spawn(FixedProbe(f64::INFINITY), PrefetchSettings::default());

        prefetcher.enqueue("live.mp3", target(0));
        let update = updates.recv().await.expect("one update");
        assert_eq!(update.seconds, 0.0);
        assert_eq!(prefetcher.cache().get("live.mp3"), Some(0.0));
    }

    #[tokio::test]
    async fn test_seam_request_uses_track_source() {
        let (prefetcher, mut updates) =
            MetadataPrefetcher::spawn(FixedProbe(42.0), PrefetchSettings::default());
        let track = Track {
            title: "Chapter 1 - 10".to_string(),
            file_name: "c1-10.mp3".to_string(),
            source: "https://a.example/book/c1-10.mp3".to_string(),
        };

        let seam: &dyn DurationPrefetch = &prefetcher;
        seam.request(&track, target(3));

        let update = updates.recv().await.expect("one update");
        assert_eq!(update.source, track.source);
        assert_eq!(update.target, target(3));
        assert_eq!(update.seconds, 42.0);
    }
}
