//! Names of the stored entries
//!
//! These match the keys written by earlier releases, so existing listeners
//! keep their position and preferences.

/// The single "last played" position record (JSON)
pub const LAST_PLAYED: &str = "lastPlayedAudio";

/// Playback speed as a decimal string
pub const SPEED: &str = "audioSpeed";

/// Sleep timer mode code: `0` off, `-1` end of chapter, `n` minutes
pub const SLEEP_TIMER: &str = "audioTimer";

/// Player bar layout, `"full"` or `"mini"`
pub const DISPLAY_MODE: &str = "playerMode";

/// Every key this crate reads or writes
pub const ALL: [&str; 4] = [LAST_PLAYED, SPEED, SLEEP_TIMER, DISPLAY_MODE];
