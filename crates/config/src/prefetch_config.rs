//! Metadata prefetch configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};

/// Pacing of the background duration lookups
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PrefetchConfig {
    /// A probe running longer than this resolves as unknown
    pub probe_timeout_ms: u64,

    /// Pause between two queued probes
    pub inter_request_delay_ms: u64,

    /// Bytes fetched from the start of a file to read its headers
    pub probe_range_bytes: u64,
}

impl Default for PrefetchConfig {
    fn default() -> Self {
        Self {
            probe_timeout_ms: 5000,
            inter_request_delay_ms: 50,
            probe_range_bytes: 256 * 1024,
        }
    }
}

impl ConfigSection for PrefetchConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        Validator::collect_errors(vec![
            Validator::in_range(
                self.probe_timeout_ms,
                100,
                60_000,
                "prefetch.probe_timeout_ms",
            ),
            Validator::in_range(
                self.inter_request_delay_ms,
                0,
                5_000,
                "prefetch.inter_request_delay_ms",
            ),
            Validator::in_range(
                self.probe_range_bytes,
                4 * 1024,
                16 * 1024 * 1024,
                "prefetch.probe_range_bytes",
            ),
        ])
    }

    fn merge(&mut self, other: Self) {
        self.probe_timeout_ms = other.probe_timeout_ms;
        self.inter_request_delay_ms = other.inter_request_delay_ms;
        self.probe_range_bytes = other.probe_range_bytes;
    }

    fn section_name(&self) -> &'static str {
        "prefetch"
    }
}
