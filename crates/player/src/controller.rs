//! Player controller
//!
//! Every notification from the media surface arrives as one [`PlayerEvent`]
//! and goes through [`PlayerController::handle_event`]. Listener commands are
//! plain methods. The controller owns the session, tracker, sleep timer and
//! preferences, and is the only writer of playback state.

use crate::error::{PlayerError, PlayerResult};
use crate::session::PlaybackSession;
use crate::sleep_timer::{fired_notice, SleepTimer};
use crate::surface::MediaSurface;
use crate::tracker::{
    clamp_resume_offset, ProgressTracker, ResumePlan, ResumeSummary, SaveOutcome, SaveReason,
    TrackerSettings,
};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use taleshelf_config::PlayerConfig;
use taleshelf_core::{
    Catalog, Clock, DisplayTarget, DurationPrefetch, KeyValueStore, PlaybackSpeed,
    PlayerDisplayMode, SleepTimerMode, TitleId, Track,
};
use taleshelf_storage::Preferences;

/// Notifications forwarded from the media surface and the host page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerEvent {
    Started,
    Paused,
    Sought,
    Ended,
    Tick,
    Hidden,
    Unload,
    TrackChanged,
    MetadataReady,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerSettings {
    pub tracker: TrackerSettings,
    pub default_speed: PlaybackSpeed,
    pub skip_step_secs: f64,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self::from(&PlayerConfig::default())
    }
}

impl From<&PlayerConfig> for ControllerSettings {
    fn from(config: &PlayerConfig) -> Self {
        Self {
            tracker: TrackerSettings::from(config),
            default_speed: PlaybackSpeed::new(config.default_speed).unwrap_or_default(),
            skip_step_secs: f64::from(config.skip_step_secs),
        }
    }
}

pub struct PlayerController<S: MediaSurface> {
    surface: S,
    catalog: Arc<Catalog>,
    clock: Arc<dyn Clock>,
    prefetch: Option<Arc<dyn DurationPrefetch>>,
    preferences: Preferences,
    tracker: ProgressTracker,
    timer: SleepTimer,
    session: Option<PlaybackSession>,
    display_mode: PlayerDisplayMode,
    settings: ControllerSettings,
    pending_start: Option<f64>,
    notices: VecDeque<String>,
}

impl<S: MediaSurface> PlayerController<S> {
    /// Builds a controller and restores the saved position and preferences
    pub fn new(
        surface: S,
        catalog: Arc<Catalog>,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        config: &PlayerConfig,
    ) -> Self {
        let settings = ControllerSettings::from(config);
        let preferences =
            Preferences::new(store.clone()).with_default_speed(settings.default_speed);
        let mut tracker = ProgressTracker::new(store, clock.clone(), settings.tracker);
        if let Some(record) = tracker.load_progress() {
            log::info!(
                "Restored position in title {} track {}",
                record.title_id,
                record.track_index
            );
        }

        Self {
            surface,
            catalog,
            clock,
            prefetch: None,
            timer: SleepTimer::new(preferences.sleep_timer_mode()),
            display_mode: preferences.display_mode(),
            preferences,
            tracker,
            session: None,
            settings,
            pending_start: None,
            notices: VecDeque::new(),
        }
    }

    /// Attaches the background duration lookup used when a title opens
    pub fn with_prefetch(mut self, prefetch: Arc<dyn DurationPrefetch>) -> Self {
        self.prefetch = Some(prefetch);
        self
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn session(&self) -> Option<&PlaybackSession> {
        self.session.as_ref()
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.session.as_ref().and_then(|s| s.current_track())
    }

    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    pub fn sleep_timer(&self) -> &SleepTimer {
        &self.timer
    }

    pub fn sleep_timer_remaining(&self) -> Option<Duration> {
        self.timer.remaining(self.clock.now())
    }

    pub fn display_mode(&self) -> PlayerDisplayMode {
        self.display_mode
    }

    pub fn speed(&self) -> PlaybackSpeed {
        self.session
            .as_ref()
            .map(|s| s.playback_rate())
            .unwrap_or_else(|| self.preferences.speed())
    }

    pub fn is_playing(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.is_playing())
    }

    /// Library-level "continue listening" line
    pub fn resume_summary(&self) -> Option<ResumeSummary> {
        self.tracker.summary()
    }

    /// Resume offer for the open title
    pub fn title_offer(&self) -> Option<ResumeSummary> {
        self.tracker.title_offer()
    }

    /// Takes every pending listener notice, oldest first
    pub fn drain_notices(&mut self) -> Vec<String> {
        self.notices.drain(..).collect()
    }

    /// Dispatches one surface or page notification
    ///
    /// Returns the outcome when the event asked for a progress save.
    pub fn handle_event(&mut self, event: PlayerEvent) -> Option<SaveOutcome> {
        let now = self.clock.now();
        let snapshot = self.surface.snapshot();

        match event {
            PlayerEvent::Started => {
                self.set_playing(true);
                self.timer.on_play(snapshot, now);
                Some(self.save(SaveReason::Started))
            }
            PlayerEvent::Paused => {
                self.set_playing(false);
                self.timer.on_pause(now);
                Some(self.save(SaveReason::Paused))
            }
            PlayerEvent::Sought => {
                self.timer.on_seek(snapshot, now);
                Some(self.save(SaveReason::Sought))
            }
            PlayerEvent::Tick => {
                let outcome = self.save(SaveReason::Tick);
                if let Some(fired) = self.timer.poll(now) {
                    self.stop_for_sleep_timer(fired);
                }
                Some(outcome)
            }
            PlayerEvent::Hidden => Some(self.save(SaveReason::Hidden)),
            PlayerEvent::Unload => Some(self.save(SaveReason::Unload)),
            PlayerEvent::TrackChanged => {
                if self.timer.on_track_changed() {
                    self.persist_timer_mode();
                }
                Some(self.save(SaveReason::TrackChanged))
            }
            PlayerEvent::MetadataReady => {
                self.start_pending();
                None
            }
            PlayerEvent::Ended => {
                self.finish_track();
                None
            }
        }
    }

    /// Opens a title and queues duration lookups for its tracks
    pub fn open_title(&mut self, id: TitleId) -> PlayerResult<()> {
        let title = self
            .catalog
            .find(id)
            .cloned()
            .ok_or(PlayerError::TitleNotFound(id))?;

        if self.session.as_ref().map(|s| s.title_id()) != Some(id) {
            self.close_session();
            let playlist = self.catalog.playlist(&title);
            log::info!("Opened '{}' with {} tracks", title.title, playlist.len());
            self.session = Some(PlaybackSession::new(
                title,
                playlist,
                self.preferences.speed(),
            ));
        }

        self.tracker.show_view(id);
        self.request_durations();
        Ok(())
    }

    /// Returns to the library, stopping playback of the open title
    pub fn go_home(&mut self) {
        self.close_session();
        self.tracker.clear_view();
        if let Some(prefetch) = &self.prefetch {
            prefetch.reset();
        }
    }

    pub fn play_track(&mut self, index: usize) -> PlayerResult<()> {
        self.play_from(index, 0.0)
    }

    /// Loads track `index` and starts it at `start_at` once it can seek
    pub fn play_from(&mut self, index: usize, start_at: f64) -> PlayerResult<()> {
        if self.current_track().is_some() {
            self.save(SaveReason::Skipped);
        }
        self.load_track(index, start_at)
    }

    /// Resumes the loaded track, or starts the first one
    pub fn play(&mut self) -> PlayerResult<()> {
        let session = self.session.as_ref().ok_or(PlayerError::NoTitleOpen)?;
        if session.current_index().is_none() {
            return self.play_track(0);
        }
        if self.pending_start.is_none() {
            self.start_playback();
        }
        Ok(())
    }

    pub fn pause(&mut self) {
        self.surface.pause();
        self.handle_event(PlayerEvent::Paused);
    }

    pub fn toggle_play(&mut self) -> PlayerResult<()> {
        if self.is_playing() {
            self.pause();
            Ok(())
        } else {
            self.play()
        }
    }

    pub fn next(&mut self) -> PlayerResult<()> {
        match self.session.as_ref().and_then(|s| s.next_index()) {
            Some(next) => self.play_track(next),
            None => Ok(()),
        }
    }

    pub fn previous(&mut self) -> PlayerResult<()> {
        match self.session.as_ref().and_then(|s| s.previous_index()) {
            Some(previous) => self.play_track(previous),
            None => Ok(()),
        }
    }

    /// Moves the playhead to `seconds` within the loaded track
    pub fn seek(&mut self, seconds: f64) -> PlayerResult<()> {
        self.ensure_seekable()?;
        self.surface.seek(seconds.max(0.0))?;
        self.handle_event(PlayerEvent::Sought);
        Ok(())
    }

    /// Jumps `delta` seconds, clamped to the track
    pub fn skip(&mut self, delta: f64) -> PlayerResult<()> {
        self.ensure_seekable()?;
        let snapshot = self.surface.snapshot();
        let mut target = (snapshot.position + delta).max(0.0);
        if let Some(duration) = snapshot.known_duration() {
            target = target.min(duration);
        }
        self.surface.seek(target)?;

        let now = self.clock.now();
        self.timer.on_seek(self.surface.snapshot(), now);
        self.save(SaveReason::Skipped);
        Ok(())
    }

    pub fn skip_forward(&mut self) -> PlayerResult<()> {
        self.skip(self.settings.skip_step_secs)
    }

    pub fn skip_back(&mut self) -> PlayerResult<()> {
        self.skip(-self.settings.skip_step_secs)
    }

    pub fn set_speed(&mut self, speed: f32) -> PlayerResult<()> {
        let speed = PlaybackSpeed::new(speed).map_err(PlayerError::InvalidSpeed)?;
        if let Some(session) = self.session.as_mut() {
            session.set_playback_rate(speed);
        }
        self.surface.set_rate(speed.value());
        if let Err(e) = self.preferences.set_speed(speed) {
            log::warn!("Playback speed not saved: {}", e);
        }
        Ok(())
    }

    pub fn set_sleep_timer(&mut self, mode: SleepTimerMode) {
        let snapshot = self.surface.snapshot();
        let playing = self.is_playing();
        self.timer.select(mode, playing, snapshot, self.clock.now());
        self.persist_timer_mode();
    }

    pub fn toggle_display_mode(&mut self) -> PlayerDisplayMode {
        self.display_mode = self.display_mode.toggled();
        if let Err(e) = self.preferences.set_display_mode(self.display_mode) {
            log::warn!("Player mode not saved: {}", e);
        }
        self.display_mode
    }

    /// Resumes the saved record from the library
    pub fn resume_last(&mut self) -> PlayerResult<ResumePlan> {
        let plan = match self.tracker.resume(&self.catalog) {
            Ok(plan) => plan,
            Err(e) => {
                if matches!(e, PlayerError::TitleNotFound(_)) {
                    self.notices.push_back(e.user_message());
                }
                return Err(e);
            }
        };

        self.open_title(plan.title_id)?;
        self.play_from(plan.track_index, plan.start_at)?;
        if let Some(notice) = &plan.notice {
            self.notices.push_back(notice.clone());
        }
        Ok(plan)
    }

    /// Resumes the saved record when it belongs to the open title
    pub fn resume_in_title(&mut self) -> PlayerResult<ResumePlan> {
        let open = self
            .session
            .as_ref()
            .map(|s| s.title_id())
            .ok_or(PlayerError::NoTitleOpen)?;
        let saved_here = self
            .tracker
            .last_record()
            .is_some_and(|record| record.title_id == open);
        if !saved_here {
            return Err(PlayerError::NothingToResume);
        }
        self.resume_last()
    }

    fn save(&mut self, reason: SaveReason) -> SaveOutcome {
        let snapshot = self.surface.snapshot();
        self.tracker
            .record_progress(self.session.as_ref(), snapshot, reason)
    }

    fn set_playing(&mut self, playing: bool) {
        if let Some(session) = self.session.as_mut() {
            session.set_playing(playing);
        }
    }

    fn ensure_seekable(&self) -> PlayerResult<()> {
        if self.session.is_none() {
            return Err(PlayerError::NoTitleOpen);
        }
        if self.current_track().is_none() || !self.surface.metadata_ready() {
            return Err(PlayerError::NoTrackLoaded);
        }
        Ok(())
    }

    fn load_track(&mut self, index: usize, start_at: f64) -> PlayerResult<()> {
        let session = self.session.as_mut().ok_or(PlayerError::NoTitleOpen)?;
        let source = session.select(index)?.source.clone();
        session.set_playing(false);

        self.surface.load(&source)?;
        self.pending_start = Some(start_at);
        self.handle_event(PlayerEvent::TrackChanged);
        if self.surface.metadata_ready() {
            self.start_pending();
        }
        Ok(())
    }

    /// Applies the deferred seek and starts playback once the surface can seek
    fn start_pending(&mut self) {
        let Some(start_at) = self.pending_start.take() else {
            return;
        };
        let rate = self.speed().value();
        self.surface.set_rate(rate);

        let target = clamp_resume_offset(
            start_at,
            self.surface.duration(),
            self.settings.tracker.resume_end_margin,
        );
        if target > 0.0 {
            if let Err(e) = self.surface.seek(target) {
                log::warn!("Could not seek to {:.1}s: {}", target, e);
            }
        }
        self.start_playback();
    }

    fn start_playback(&mut self) {
        match self.surface.play() {
            Ok(()) => {
                self.handle_event(PlayerEvent::Started);
            }
            Err(e) => log::warn!("Playback did not start: {}", e),
        }
    }

    fn finish_track(&mut self) {
        if let Some(fired) = self.timer.on_ended() {
            self.stop_for_sleep_timer(fired);
            return;
        }

        match self.session.as_ref().and_then(|s| s.next_index()) {
            Some(next) => {
                if let Err(e) = self.load_track(next, 0.0) {
                    log::warn!("Could not advance to track {}: {}", next, e);
                }
            }
            None => {
                log::debug!("Reached the end of the playlist");
                self.set_playing(false);
                self.timer.on_pause(self.clock.now());
            }
        }
    }

    fn stop_for_sleep_timer(&mut self, fired: SleepTimerMode) {
        self.surface.pause();
        self.set_playing(false);
        self.save(SaveReason::Paused);
        self.persist_timer_mode();
        self.notices.push_back(fired_notice(fired));
    }

    fn persist_timer_mode(&self) {
        if let Err(e) = self.preferences.set_sleep_timer_mode(self.timer.mode()) {
            log::warn!("Sleep timer mode not saved: {}", e);
        }
    }

    fn request_durations(&self) {
        let (Some(prefetch), Some(session)) = (&self.prefetch, &self.session) else {
            return;
        };
        prefetch.reset();
        for (index, track) in session.playlist().iter().enumerate() {
            prefetch.request(track, DisplayTarget::new(session.title_id(), index));
        }
    }

    fn close_session(&mut self) {
        if self.is_playing() {
            self.surface.pause();
            self.handle_event(PlayerEvent::Paused);
        }
        self.pending_start = None;
        self.session = None;
    }
}
