//! The media playback surface the core drives
//!
//! A surface is whatever actually plays audio: a browser audio element, a
//! native engine, or the [`SimulatedSurface`] used for headless runs. The core
//! issues commands and reads position and duration; the host forwards the
//! surface's own notifications as [`crate::PlayerEvent`]s.
//!
//! Seeking before the surface reports metadata is undefined. Callers wait for
//! `metadata_ready()` or a `MetadataReady` event first.

use crate::error::{PlayerError, PlayerResult};

/// Position and duration read from the surface at one instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackSnapshot {
    pub position: f64,
    pub duration: f64,
}

impl PlaybackSnapshot {
    pub fn new(position: f64, duration: f64) -> Self {
        Self { position, duration }
    }

    /// Duration when it is a usable positive number
    pub fn known_duration(&self) -> Option<f64> {
        (self.duration.is_finite() && self.duration > 0.0).then_some(self.duration)
    }

    /// Seconds left in the track, if the duration is known
    pub fn remaining(&self) -> Option<f64> {
        self.known_duration()
            .map(|duration| (duration - self.position.max(0.0)).max(0.0))
    }
}

pub trait MediaSurface {
    /// Current offset in seconds
    fn position(&self) -> f64;

    /// Track length in seconds; NaN or zero while unknown
    fn duration(&self) -> f64;

    /// Whether enough of the track has loaded to seek
    fn metadata_ready(&self) -> bool;

    /// Replaces the current source; playback stops until `play`
    fn load(&mut self, source: &str) -> PlayerResult<()>;

    /// Starts playback. Hosts may refuse, e.g. without a user gesture.
    fn play(&mut self) -> PlayerResult<()>;

    fn pause(&mut self);

    fn seek(&mut self, seconds: f64) -> PlayerResult<()>;

    fn set_rate(&mut self, rate: f32);

    fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot::new(self.position(), self.duration())
    }
}

/// Command received by a [`SimulatedSurface`]
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCommand {
    Load(String),
    Play,
    Pause,
    Seek(f64),
    SetRate(f32),
}

/// In-process surface that keeps time by being told to
///
/// Nothing plays. Tests and headless hosts call [`SimulatedSurface::finish_loading`]
/// and [`SimulatedSurface::advance`] to stand in for the real element.
#[derive(Debug, Clone, Default)]
pub struct SimulatedSurface {
    source: Option<String>,
    position: f64,
    duration: f64,
    ready: bool,
    playing: bool,
    rate: f32,
    refuse_play: bool,
    commands: Vec<SurfaceCommand>,
}

impl SimulatedSurface {
    pub fn new() -> Self {
        Self {
            rate: 1.0,
            ..Self::default()
        }
    }

    /// Marks the loaded source as ready with the given duration
    pub fn finish_loading(&mut self, duration: f64) {
        self.duration = duration;
        self.ready = true;
    }

    /// Moves the playhead forward by `seconds` of playback, stopping at the end
    pub fn advance(&mut self, seconds: f64) {
        if !self.playing {
            return;
        }
        let next = self.position + seconds;
        self.position = if self.duration > 0.0 {
            next.min(self.duration)
        } else {
            next
        };
    }

    /// True once the playhead has reached a known duration
    pub fn at_end(&self) -> bool {
        self.duration > 0.0 && self.position >= self.duration
    }

    /// Makes the next `play` calls fail, as an autoplay policy would
    pub fn refuse_play(&mut self, refuse: bool) {
        self.refuse_play = refuse;
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    pub fn commands(&self) -> &[SurfaceCommand] {
        &self.commands
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }
}

impl MediaSurface for SimulatedSurface {
    fn position(&self) -> f64 {
        self.position
    }

    fn duration(&self) -> f64 {
        if self.ready {
            self.duration
        } else {
            f64::NAN
        }
    }

    fn metadata_ready(&self) -> bool {
        self.ready
    }

    fn load(&mut self, source: &str) -> PlayerResult<()> {
        self.commands.push(SurfaceCommand::Load(source.to_string()));
        self.source = Some(source.to_string());
        self.position = 0.0;
        self.duration = 0.0;
        self.ready = false;
        self.playing = false;
        Ok(())
    }

    fn play(&mut self) -> PlayerResult<()> {
        self.commands.push(SurfaceCommand::Play);
        if self.refuse_play {
            return Err(PlayerError::Surface("play was refused".to_string()));
        }
        if self.source.is_none() {
            return Err(PlayerError::Surface("no source loaded".to_string()));
        }
        self.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.commands.push(SurfaceCommand::Pause);
        self.playing = false;
    }

    fn seek(&mut self, seconds: f64) -> PlayerResult<()> {
        self.commands.push(SurfaceCommand::Seek(seconds));
        if !self.ready {
            return Err(PlayerError::Surface(
                "seek before metadata is ready".to_string(),
            ));
        }
        self.position = seconds.clamp(0.0, self.duration.max(0.0));
        Ok(())
    }

    fn set_rate(&mut self, rate: f32) {
        self.commands.push(SurfaceCommand::SetRate(rate));
        self.rate = rate;
    }
}
