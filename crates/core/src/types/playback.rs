//! Playback-related domain models

use crate::error::{AppError, Result};
use crate::types::{source_file_name, TitleId, Timestamp, Validator};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Playback speed multiplier (0.5x - 3.0x)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaybackSpeed(f32);

impl PlaybackSpeed {
    pub const MIN: f32 = 0.5;
    pub const MAX: f32 = 3.0;

    /// Speeds offered by the speed menu
    pub const PRESETS: [f32; 6] = [0.75, 1.0, 1.25, 1.5, 1.75, 2.0];

    /// Creates a new playback speed (0.5x - 3.0x)
    pub fn new(speed: f32) -> std::result::Result<Self, String> {
        if !speed.is_finite() || !(Self::MIN..=Self::MAX).contains(&speed) {
            Err(format!(
                "Speed must be between {} and {}",
                Self::MIN,
                Self::MAX
            ))
        } else {
            Ok(Self(speed))
        }
    }

    /// Creates a playback speed without validation (for deserialization)
    pub fn new_unchecked(speed: f32) -> Self {
        Self(speed)
    }

    /// Returns the speed value
    pub fn value(&self) -> f32 {
        self.0
    }
}

impl Default for PlaybackSpeed {
    fn default() -> Self {
        Self(1.0)
    }
}

impl fmt::Display for PlaybackSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PlaybackSpeed {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let value: f32 = s
            .trim()
            .parse()
            .map_err(|_| format!("'{}' is not a speed", s))?;
        Self::new(value)
    }
}

impl Validator for PlaybackSpeed {
    fn validate(&self) -> std::result::Result<(), Vec<String>> {
        Self::new(self.0).map(|_| ()).map_err(|e| vec![e])
    }
}

/// Selected sleep timer mode
///
/// Persisted as a single integer: `0` off, `-1` end of chapter, `n > 0` minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SleepTimerMode {
    #[default]
    Off,
    EndOfChapter,
    Countdown { minutes: u32 },
}

impl SleepTimerMode {
    /// Countdown lengths offered by the timer menu
    pub const PRESET_MINUTES: [u32; 4] = [15, 30, 45, 60];

    pub fn countdown(minutes: u32) -> Self {
        if minutes == 0 {
            Self::Off
        } else {
            Self::Countdown { minutes }
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Off),
            -1 => Some(Self::EndOfChapter),
            n if n > 0 && n <= u32::MAX as i64 => Some(Self::Countdown { minutes: n as u32 }),
            _ => None,
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            Self::Off => 0,
            Self::EndOfChapter => -1,
            Self::Countdown { minutes } => *minutes as i64,
        }
    }

    pub fn is_off(&self) -> bool {
        matches!(self, Self::Off)
    }
}

impl fmt::Display for SleepTimerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => write!(f, "Off"),
            Self::EndOfChapter => write!(f, "End of chapter"),
            Self::Countdown { minutes } => write!(f, "{} min", minutes),
        }
    }
}

/// Player bar layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerDisplayMode {
    #[default]
    Full,
    Mini,
}

impl PlayerDisplayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Mini => "mini",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Self::Full => Self::Mini,
            Self::Mini => Self::Full,
        }
    }
}

impl FromStr for PlayerDisplayMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "full" => Ok(Self::Full),
            "mini" => Ok(Self::Mini),
            other => Err(format!("unknown player mode '{}'", other)),
        }
    }
}

/// The single durable "last played" record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedPosition {
    pub title_id: TitleId,
    pub track_index: usize,
    pub position_seconds: f64,
    pub track_duration_seconds: f64,
    #[serde(rename = "savedAtEpochMillis")]
    pub saved_at: Timestamp,
    pub track_title: String,
    pub title_name: String,
    pub author_name: String,
    pub source_url: String,
    #[serde(default)]
    pub folder_name: String,
    #[serde(default)]
    pub total_tracks: usize,
}

impl PersistedPosition {
    /// Parses a stored record, rejecting anything that fails validation
    pub fn from_json(json: &str) -> Result<Self> {
        let record: PersistedPosition =
            serde_json::from_str(json).map_err(|e| AppError::InvalidInput {
                what: "persisted position".to_string(),
                reason: e.to_string(),
            })?;

        record.validate().map_err(|errors| AppError::InvalidInput {
            what: "persisted position".to_string(),
            reason: errors.join("; "),
        })?;

        Ok(record)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| AppError::InvalidInput {
            what: "persisted position".to_string(),
            reason: e.to_string(),
        })
    }

    /// Seconds left in the saved track
    pub fn remaining_seconds(&self) -> f64 {
        (self.track_duration_seconds - self.position_seconds).max(0.0)
    }

    /// File name of the saved source, compared against the live catalog on resume
    pub fn source_file_name(&self) -> &str {
        source_file_name(&self.source_url)
    }
}

impl Validator for PersistedPosition {
    fn validate(&self) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !self.position_seconds.is_finite() || self.position_seconds < 0.0 {
            errors.push("Position must be a finite non-negative number".to_string());
        }

        if !self.track_duration_seconds.is_finite() || self.track_duration_seconds <= 0.0 {
            errors.push("Track duration must be a finite positive number".to_string());
        }

        if errors.is_empty() && self.position_seconds > self.track_duration_seconds {
            errors.push("Position cannot exceed the track duration".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> PersistedPosition {
        PersistedPosition {
            title_id: TitleId::new(3),
            track_index: 1,
            position_seconds: 50.0,
            track_duration_seconds: 100.0,
            saved_at: Timestamp::from_millis(1_700_000_000_000),
            track_title: "Chapter 21 - 40".to_string(),
            title_name: "The Harbor".to_string(),
            author_name: "J. Doe".to_string(),
            source_url: "https://files.example.org/Harbor/c21-40.mp3".to_string(),
            folder_name: "Harbor".to_string(),
            total_tracks: 3,
        }
    }

    #[test]
    fn test_playback_speed_default() {
        assert_eq!(PlaybackSpeed::default().value(), 1.0);
    }

    #[test]
    fn test_playback_speed_bounds() {
        assert!(PlaybackSpeed::new(1.5).is_ok());
        assert!(PlaybackSpeed::new(0.3).is_err());
        assert!(PlaybackSpeed::new(3.5).is_err());
        assert!(PlaybackSpeed::new(f32::NAN).is_err());
        assert!(!PlaybackSpeed::new_unchecked(5.0).is_valid());
    }

    #[test]
    fn test_playback_speed_parse() {
        assert_eq!("1.25".parse::<PlaybackSpeed>().unwrap().value(), 1.25);
        assert!("fast".parse::<PlaybackSpeed>().is_err());
        assert!("9".parse::<PlaybackSpeed>().is_err());
    }

    #[test]
    fn test_sleep_timer_mode_codes() {
        assert_eq!(SleepTimerMode::from_code(0), Some(SleepTimerMode::Off));
        assert_eq!(SleepTimerMode::from_code(-1), Some(SleepTimerMode::EndOfChapter));
        assert_eq!(
            SleepTimerMode::from_code(30),
            Some(SleepTimerMode::Countdown { minutes: 30 })
        );
        assert_eq!(SleepTimerMode::from_code(-7), None);
        assert_eq!(SleepTimerMode::Countdown { minutes: 45 }.code(), 45);
        assert_eq!(SleepTimerMode::countdown(0), SleepTimerMode::Off);
    }

    #[test]
    fn test_display_mode() {
        assert_eq!("mini".parse::<PlayerDisplayMode>(), Ok(PlayerDisplayMode::Mini));
        assert!("tiny".parse::<PlayerDisplayMode>().is_err());
        assert_eq!(PlayerDisplayMode::Full.toggled(), PlayerDisplayMode::Mini);
        assert_eq!(PlayerDisplayMode::Mini.as_str(), "mini");
    }

    #[test]
    fn test_persisted_position_uses_camel_case_keys() {
        let json = record().to_json().unwrap();
        assert!(json.contains("\"titleId\":3"));
        assert!(json.contains("\"savedAtEpochMillis\":1700000000000"));
        assert!(json.contains("\"sourceUrl\""));
    }

    #[test]
    fn test_persisted_position_round_trip() {
        let original = record();
        let parsed = PersistedPosition::from_json(&original.to_json().unwrap()).unwrap();
        assert_eq!(parsed, original);
        assert_eq!(parsed.source_file_name(), "c21-40.mp3");
        assert_eq!(parsed.remaining_seconds(), 50.0);
    }

    #[test]
    fn test_persisted_position_rejects_invalid() {
        let mut bad = record();
        bad.track_duration_seconds = 0.0;
        assert!(!bad.is_valid());

        let mut beyond = record();
        beyond.position_seconds = 150.0;
        assert!(!beyond.is_valid());

        // NaN serializes as null, which no longer parses as a number
        let mut nan = record();
        nan.position_seconds = f64::NAN;
        let json = serde_json::to_string(&nan).unwrap();
        assert!(PersistedPosition::from_json(&json).is_err());
    }

    #[test]
    fn test_persisted_position_missing_optional_fields() {
        let json = r#"{"titleId":1,"trackIndex":0,"positionSeconds":5.0,
            "trackDurationSeconds":10.0,"savedAtEpochMillis":0,"trackTitle":"t",
            "titleName":"n","authorName":"a","sourceUrl":"https://x/f/c1-2.mp3"}"#;
        let parsed = PersistedPosition::from_json(json).unwrap();
        assert_eq!(parsed.total_tracks, 0);
        assert!(parsed.folder_name.is_empty());
    }
}
