// crates/resilience/src/lib.rs
//! Pacing and deadline helpers
//!
//! - Sliding-window rate limiting, used to throttle progress saves
//! - Async timeouts, used to bound metadata probes
//!
//! # Example
//!
//! ```rust
//! use taleshelf_resilience::RateLimiter;
//! use std::time::Duration;
//!
//! let throttle = RateLimiter::throttle(Duration::from_millis(500));
//! assert!(throttle.try_acquire_at(Duration::from_millis(0)).is_ok());
//! assert!(throttle.try_acquire_at(Duration::from_millis(200)).is_err());
//! ```

mod error;
mod rate_limiter;
mod timeout;

pub use error::{ResilienceError, ResilienceResult};
pub use rate_limiter::RateLimiter;
pub use timeout::{with_timeout, Timeout};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_exports_accessible() {
        let _: RateLimiter = RateLimiter::new(100, std::time::Duration::from_secs(1));
        let _: Timeout = Timeout::new(std::time::Duration::from_secs(5));
        let _: ResilienceResult<()> = Err(ResilienceError::Custom("test".to_string()));
    }
}
