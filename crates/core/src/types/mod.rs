//! Domain types for Taleshelf
//!
//! This module contains all domain models organized by responsibility:
//! - `catalog`: titles, tracks and the read-only library
//! - `playback`: persisted position and playback preferences
//! - `common`: timestamps, time formatting and shared traits

mod catalog;
mod common;
mod playback;

// Re-export all public types
pub use catalog::{
    source_file_name, Catalog, ChapterRange, SortOrder, Title, TitleId, Track,
    TrackSpec,
};
pub use common::{format_clock, TimeAgo, Timestamp, Validator};
pub use playback::{PersistedPosition, PlaybackSpeed, PlayerDisplayMode, SleepTimerMode};
