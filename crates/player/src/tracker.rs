//! Playback progress tracking
//!
//! One "last played" record is kept in the store and overwritten on every
//! save. Saves are refused when they would persist noise: no open title, an
//! unusable position or duration, or a near-zero position right after a track
//! switch. Periodic ticks are throttled; discrete actions always write.
//!
//! On resume the record is checked against the live catalog, which may have
//! changed since it was written.

use crate::error::{PlayerError, PlayerResult};
use crate::session::PlaybackSession;
use crate::surface::PlaybackSnapshot;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use taleshelf_config::PlayerConfig;
use taleshelf_core::{
    format_clock, source_file_name, Catalog, Clock, KeyValueStore, PersistedPosition, TimeAgo,
    Timestamp, TitleId,
};
use taleshelf_resilience::RateLimiter;
use taleshelf_storage::keys;

/// Why a save was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SaveReason {
    Started,
    Paused,
    Sought,
    Skipped,
    TrackChanged,
    Tick,
    Hidden,
    Unload,
}

impl SaveReason {
    /// Playback is stopping or the page is going away; any position is worth keeping
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Paused | Self::Hidden | Self::Unload)
    }

    pub fn is_throttled(&self) -> bool {
        matches!(self, Self::Tick)
    }
}

/// Why a save was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoTitleOpen,
    NoTrackLoaded,
    InvalidPosition,
    UnknownDuration,
    BelowMinimumPosition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    Skipped(SkipReason),
    Throttled,
    StoreFailed,
}

impl SaveOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerSettings {
    pub throttle: Duration,
    pub min_meaningful_position: f64,
    pub resume_end_margin: f64,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self::from(&PlayerConfig::default())
    }
}

impl From<&PlayerConfig> for TrackerSettings {
    fn from(config: &PlayerConfig) -> Self {
        Self {
            throttle: Duration::from_millis(config.progress_throttle_ms),
            min_meaningful_position: config.min_meaningful_position_secs,
            resume_end_margin: config.resume_end_margin_secs,
        }
    }
}

/// Where playback should pick up again
#[derive(Debug, Clone, PartialEq)]
pub struct ResumePlan {
    pub title_id: TitleId,
    pub track_index: usize,
    pub start_at: f64,
    /// Shown to the listener when the plan departs from the saved record
    pub notice: Option<String>,
}

impl ResumePlan {
    /// Seek target once the track's duration is known
    ///
    /// Never closer than `margin` to the end, so a resume does not land on the
    /// end of the track. With an unknown duration only the lower bound applies.
    pub fn seek_target(&self, duration: f64, margin: f64) -> f64 {
        clamp_resume_offset(self.start_at, duration, margin)
    }
}

/// Clamps a resume offset into `[0, duration - margin]`
pub fn clamp_resume_offset(start_at: f64, duration: f64, margin: f64) -> f64 {
    let start_at = if start_at.is_finite() { start_at.max(0.0) } else { 0.0 };
    if duration.is_finite() && duration > 0.0 {
        start_at.min((duration - margin.max(0.0)).max(0.0))
    } else {
        start_at
    }
}

/// "Now playing / time remaining / how long ago" line for the saved record
#[derive(Debug, Clone, PartialEq)]
pub struct ResumeSummary {
    pub title_id: TitleId,
    pub title_name: String,
    pub track_title: String,
    pub position_label: String,
    pub remaining_label: String,
    pub saved: TimeAgo,
}

impl ResumeSummary {
    pub fn from_record(record: &PersistedPosition, now: Timestamp) -> Self {
        Self {
            title_id: record.title_id,
            title_name: record.title_name.clone(),
            track_title: record.track_title.clone(),
            position_label: format_clock(record.position_seconds),
            remaining_label: format_clock(record.remaining_seconds()),
            saved: TimeAgo::between(record.saved_at, now),
        }
    }
}

impl fmt::Display for ResumeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} at {} ({} left) - {}",
            self.title_name, self.track_title, self.position_label, self.remaining_label, self.saved
        )
    }
}

const MOVED_TRACK_RESTART: &str = "The file has changed. Playing the chapter from the start.";
const MISSING_TRACK_RESTART: &str =
    "Could not find the exact chapter. Playing from the start of the track.";
const INDEX_OUT_OF_RANGE: &str =
    "The saved chapter no longer exists. Starting from the first track.";

pub struct ProgressTracker {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    settings: TrackerSettings,
    throttle: RateLimiter,
    origin: Timestamp,
    record: Option<PersistedPosition>,
    view: Option<TitleId>,
}

impl ProgressTracker {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        settings: TrackerSettings,
    ) -> Self {
        let origin = clock.now();
        Self {
            store,
            clock,
            throttle: RateLimiter::throttle(settings.throttle),
            settings,
            origin,
            record: None,
            view: None,
        }
    }

    pub fn settings(&self) -> &TrackerSettings {
        &self.settings
    }

    /// Persists the current position if it is worth keeping
    pub fn record_progress(
        &mut self,
        session: Option<&PlaybackSession>,
        snapshot: PlaybackSnapshot,
        reason: SaveReason,
    ) -> SaveOutcome {
        let Some(session) = session else {
            return SaveOutcome::Skipped(SkipReason::NoTitleOpen);
        };
        let (Some(track_index), Some(track)) = (session.current_index(), session.current_track())
        else {
            return SaveOutcome::Skipped(SkipReason::NoTrackLoaded);
        };

        let PlaybackSnapshot { position, duration } = snapshot;
        if !position.is_finite() || position < 0.0 {
            return SaveOutcome::Skipped(SkipReason::InvalidPosition);
        }
        if !duration.is_finite() || duration <= 0.0 {
            return SaveOutcome::Skipped(SkipReason::UnknownDuration);
        }
        if !reason.is_terminal() && position < self.settings.min_meaningful_position {
            return SaveOutcome::Skipped(SkipReason::BelowMinimumPosition);
        }

        let now = self.clock.now();
        if reason.is_throttled() {
            let offset = Duration::from_millis(now.millis_since(self.origin));
            if self.throttle.try_acquire_at(offset).is_err() {
                return SaveOutcome::Throttled;
            }
        }

        let title = session.title();
        let record = PersistedPosition {
            title_id: title.id,
            track_index,
            position_seconds: position.min(duration),
            track_duration_seconds: duration,
            saved_at: now,
            track_title: track.title.clone(),
            title_name: title.title.clone(),
            author_name: title.author.clone(),
            source_url: track.source.clone(),
            folder_name: title.folder_name.clone(),
            total_tracks: session.len(),
        };

        let written = record
            .to_json()
            .and_then(|json| self.store.set(keys::LAST_PLAYED, &json));
        match written {
            Ok(()) => {
                log::debug!(
                    "Saved {:?} progress: title {} track {} at {:.1}s",
                    reason,
                    record.title_id,
                    record.track_index,
                    record.position_seconds
                );
                self.record = Some(record);
                SaveOutcome::Saved
            }
            Err(e) => {
                log::warn!("Could not save playback progress: {}", e);
                SaveOutcome::StoreFailed
            }
        }
    }

    /// Reads the stored record; anything absent or unreadable means no resume target
    pub fn load_progress(&mut self) -> Option<PersistedPosition> {
        self.record = match self.store.get(keys::LAST_PLAYED) {
            None => None,
            Some(raw) => match PersistedPosition::from_json(&raw) {
                Ok(record) => Some(record),
                Err(e) => {
                    log::warn!("Ignoring saved position: {}", e);
                    None
                }
            },
        };
        self.record.clone()
    }

    pub fn last_record(&self) -> Option<&PersistedPosition> {
        self.record.as_ref()
    }

    /// Library-level resume line for the saved record
    pub fn summary(&self) -> Option<ResumeSummary> {
        self.record
            .as_ref()
            .map(|record| ResumeSummary::from_record(record, self.clock.now()))
    }

    /// Marks `title_id` as the title on screen
    pub fn show_view(&mut self, title_id: TitleId) {
        self.view = Some(title_id);
    }

    /// Hides the per-title resume offer; the stored record is kept
    pub fn clear_view(&mut self) {
        self.view = None;
    }

    /// Resume offer for the title on screen, if the saved record belongs to it
    pub fn title_offer(&self) -> Option<ResumeSummary> {
        let view = self.view?;
        self.summary().filter(|summary| summary.title_id == view)
    }

    /// Works out where to resume the saved record in `catalog`
    pub fn resume(&self, catalog: &Catalog) -> PlayerResult<ResumePlan> {
        let record = self.record.as_ref().ok_or(PlayerError::NothingToResume)?;
        let title = catalog
            .find(record.title_id)
            .ok_or(PlayerError::TitleNotFound(record.title_id))?;
        let playlist = catalog.playlist(title);
        if playlist.is_empty() {
            return Err(PlayerError::TrackOutOfRange {
                index: record.track_index,
                len: 0,
            });
        }

        let plan = |track_index: usize, start_at: f64, notice: Option<&str>| ResumePlan {
            title_id: record.title_id,
            track_index,
            start_at,
            notice: notice.map(str::to_string),
        };

        let Some(saved_track) = playlist.get(record.track_index) else {
            log::info!(
                "Saved track {} is past the end of a {}-track playlist",
                record.track_index,
                playlist.len()
            );
            return Ok(plan(0, 0.0, Some(INDEX_OUT_OF_RANGE)));
        };

        let saved_file = record.source_file_name();
        if source_file_name(&saved_track.source) == saved_file {
            return Ok(plan(record.track_index, record.position_seconds, None));
        }

        if let Some(moved) = playlist
            .iter()
            .position(|track| source_file_name(&track.source) == saved_file)
        {
            log::info!(
                "Saved file {} moved from index {} to {}",
                saved_file,
                record.track_index,
                moved
            );
            return Ok(plan(moved, record.position_seconds, None));
        }

        if let Some(retitled) = playlist
            .iter()
            .position(|track| track.title == record.track_title)
        {
            return Ok(plan(retitled, 0.0, Some(MOVED_TRACK_RESTART)));
        }

        Ok(plan(record.track_index, 0.0, Some(MISSING_TRACK_RESTART)))
    }
}

impl fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("settings", &self.settings)
            .field("record", &self.record)
            .field("view", &self.view)
            .finish_non_exhaustive()
    }
}
