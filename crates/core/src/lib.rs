//! Core domain types for Taleshelf
//!
//! Catalog and playback models, the shared error taxonomy, and the traits the
//! playback core uses to talk to storage, time and metadata prefetching.

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, ErrorSeverity, RecoveryAction, Result};
pub use traits::{Clock, DisplayTarget, DurationPrefetch, KeyValueStore, ManualClock, SystemClock};
pub use types::{
    format_clock, source_file_name, Catalog, ChapterRange, PersistedPosition, PlaybackSpeed,
    PlayerDisplayMode, SleepTimerMode, SortOrder, TimeAgo, Timestamp, Title, TitleId,
    Track, TrackSpec, Validator,
};
