//! Player configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};

/// Playback and progress-saving behavior
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlayerConfig {
    /// Speed used until the listener picks one (0.5 - 3.0)
    pub default_speed: f32,

    /// Minimum gap between periodic progress saves, in milliseconds
    pub progress_throttle_ms: u64,

    /// Positions below this are not worth saving except on pause or teardown
    pub min_meaningful_position_secs: f64,

    /// Resume never seeks closer than this to the end of a track
    pub resume_end_margin_secs: f64,

    /// Seconds moved by the skip forward/back controls
    pub skip_step_secs: u32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            default_speed: 1.0,
            progress_throttle_ms: 500,
            min_meaningful_position_secs: 0.5,
            resume_end_margin_secs: 1.0,
            skip_step_secs: 5,
        }
    }
}

impl ConfigSection for PlayerConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        Validator::collect_errors(vec![
            Validator::in_range(self.default_speed, 0.5, 3.0, "player.default_speed"),
            Validator::in_range(
                self.progress_throttle_ms,
                100,
                5000,
                "player.progress_throttle_ms",
            ),
            Validator::in_range(
                self.min_meaningful_position_secs,
                0.0,
                5.0,
                "player.min_meaningful_position_secs",
            ),
            Validator::in_range(
                self.resume_end_margin_secs,
                0.0,
                30.0,
                "player.resume_end_margin_secs",
            ),
            Validator::in_range(self.skip_step_secs, 1, 120, "player.skip_step_secs"),
        ])
    }

    fn merge(&mut self, other: Self) {
        self.default_speed = other.default_speed;
        self.progress_throttle_ms = other.progress_throttle_ms;
        self.min_meaningful_position_secs = other.min_meaningful_position_secs;
        self.resume_end_margin_secs = other.resume_end_margin_secs;
        self.skip_step_secs = other.skip_step_secs;
    }

    fn section_name(&self) -> &'static str {
        "player"
    }
}
