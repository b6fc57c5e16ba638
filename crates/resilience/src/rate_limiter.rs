// crates/resilience/src/rate_limiter.rs
//! Sliding-window rate limiting
//!
//! Times are offsets on a monotonic timeline. `try_acquire` measures them from
//! the limiter's creation; `try_acquire_at` lets callers with their own clock
//! supply the offset directly.

use crate::error::{ResilienceError, ResilienceResult};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Sliding-window rate limiter: at most `max_requests` per `window`
#[derive(Debug, Clone)]
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    origin: Instant,
    state: Arc<Mutex<RateLimiterState>>,
}

#[derive(Debug, Default)]
struct RateLimiterState {
    requests: VecDeque<Duration>,
}

impl RateLimiter {
    /// Creates a new rate limiter
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            origin: Instant::now(),
            state: Arc::new(Mutex::new(RateLimiterState::default())),
        }
    }

    /// Limiter that lets one request through per `interval`
    pub fn throttle(interval: Duration) -> Self {
        Self::new(1, interval)
    }

    /// Attempts to acquire a slot now
    pub fn try_acquire(&self) -> ResilienceResult<()> {
        self.try_acquire_at(self.origin.elapsed())
    }

    /// Attempts to acquire a slot at `now`
    ///
    /// `now` must not go backwards between calls; an earlier offset is treated
    /// as the latest one seen.
    pub fn try_acquire_at(&self, now: Duration) -> ResilienceResult<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| ResilienceError::Custom("Lock poisoned".to_string()))?;

        let now = state.requests.back().map_or(now, |last| now.max(*last));

        // Drop requests that left the window
        while let Some(&oldest) = state.requests.front() {
            if now.saturating_sub(oldest) >= self.window {
                state.requests.pop_front();
            } else {
                break;
            }
        }

        if state.requests.len() < self.max_requests {
            state.requests.push_back(now);
            Ok(())
        } else {
            Err(ResilienceError::RateLimitExceeded {
                limit: self.max_requests,
                window: self.window,
            })
        }
    }

    /// Forgets every recorded request
    pub fn reset(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.requests.clear();
        }
    }

    /// Gets the maximum number of requests allowed
    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    /// Gets the time window
    pub fn window(&self) -> Duration {
        self.window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_rate_limiter_allows_within_limit() {
        let limiter = RateLimiter::new(5, Duration::from_secs(1));

        for _ in 0..5 {
            assert!(limiter.try_acquire().is_ok());
        }
    }

    #[test]
    fn test_rate_limiter_blocks_over_limit() {
        let limiter = RateLimiter::new(3, Duration::from_secs(1));

        for _ in 0..3 {
            assert!(limiter.try_acquire().is_ok());
        }

        let result = limiter.try_acquire();
        assert!(matches!(
            result,
            Err(ResilienceError::RateLimitExceeded { limit: 3, .. })
        ));
    }

    #[test]
    fn test_throttle_with_explicit_offsets() {
        let limiter = RateLimiter::throttle(ms(500));

        assert!(limiter.try_acquire_at(ms(1_000)).is_ok());
        assert!(limiter.try_acquire_at(ms(1_200)).is_err());
        assert!(limiter.try_acquire_at(ms(1_499)).is_err());
        assert!(limiter.try_acquire_at(ms(1_500)).is_ok());
    }

    #[test]
    fn test_backwards_offset_does_not_open_window() {
        let limiter = RateLimiter::throttle(ms(500));

        assert!(limiter.try_acquire_at(ms(2_000)).is_ok());
        assert!(limiter.try_acquire_at(ms(100)).is_err());
    }

    #[test]
    fn test_rate_limiter_refills_after_window() {
        let limiter = RateLimiter::new(2, ms(50));

        assert!(limiter.try_acquire().is_ok());
        assert!(limiter.try_acquire().is_ok());
        assert!(limiter.try_acquire().is_err());

        std::thread::sleep(ms(60));

        assert!(limiter.try_acquire().is_ok());
    }

    #[test]
    fn test_reset_clears_window() {
        let limiter = RateLimiter::throttle(Duration::from_secs(60));
        assert!(limiter.try_acquire_at(ms(0)).is_ok());
        limiter.reset();
        assert!(limiter.try_acquire_at(ms(1)).is_ok());
    }

    #[test]
    fn test_rate_limiter_config() {
        let limiter = RateLimiter::new(100, Duration::from_secs(60));
        assert_eq!(limiter.max_requests(), 100);
        assert_eq!(limiter.window(), Duration::from_secs(60));
    }
}
