//! Sleep timer
//!
//! The timer holds the selected mode and, while audio plays, a deadline on the
//! injected clock. Nothing fires on its own: the controller calls
//! [`SleepTimer::poll`] on every tick, which keeps the timer deterministic.
//!
//! Pausing turns the deadline into the time that was left, so playing again
//! continues the countdown instead of restarting it.

use crate::surface::PlaybackSnapshot;
use std::time::Duration;
use taleshelf_core::{SleepTimerMode, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Nothing scheduled, either because the mode is off or audio never played
    Idle,
    Armed { deadline: Timestamp },
    Suspended { remaining_ms: u64 },
}

#[derive(Debug, Clone)]
pub struct SleepTimer {
    mode: SleepTimerMode,
    phase: Phase,
}

impl SleepTimer {
    pub fn new(mode: SleepTimerMode) -> Self {
        Self {
            mode,
            phase: Phase::Idle,
        }
    }

    pub fn mode(&self) -> SleepTimerMode {
        self.mode
    }

    pub fn is_armed(&self) -> bool {
        matches!(self.phase, Phase::Armed { .. })
    }

    /// Time left before the timer fires, if it is armed or suspended
    pub fn remaining(&self, now: Timestamp) -> Option<Duration> {
        match self.phase {
            Phase::Idle => None,
            Phase::Armed { deadline } => Some(Duration::from_millis(deadline.millis_since(now))),
            Phase::Suspended { remaining_ms } => Some(Duration::from_millis(remaining_ms)),
        }
    }

    /// Switches to `mode`, dropping any pending deadline
    pub fn select(
        &mut self,
        mode: SleepTimerMode,
        playing: bool,
        snapshot: PlaybackSnapshot,
        now: Timestamp,
    ) {
        self.mode = mode;
        self.phase = Phase::Idle;
        if playing {
            self.arm(snapshot, now);
        }
        log::debug!("Sleep timer set to {}", mode);
    }

    /// Playback started or resumed
    pub fn on_play(&mut self, snapshot: PlaybackSnapshot, now: Timestamp) {
        match (self.mode, self.phase) {
            (SleepTimerMode::Off, _) | (_, Phase::Armed { .. }) => {}
            (SleepTimerMode::Countdown { .. }, Phase::Suspended { remaining_ms }) => {
                self.phase = Phase::Armed {
                    deadline: now.plus_millis(remaining_ms),
                };
            }
            _ => self.arm(snapshot, now),
        }
    }

    /// Playback paused; the remaining time is kept for the next play
    pub fn on_pause(&mut self, now: Timestamp) {
        if let Phase::Armed { deadline } = self.phase {
            self.phase = Phase::Suspended {
                remaining_ms: deadline.millis_since(now),
            };
        }
    }

    /// The playhead moved; an end-of-chapter deadline follows it
    pub fn on_seek(&mut self, snapshot: PlaybackSnapshot, now: Timestamp) {
        if self.mode == SleepTimerMode::EndOfChapter && self.is_armed() {
            self.arm(snapshot, now);
        }
    }

    /// A different track was loaded
    ///
    /// An end-of-chapter timer that was running for the previous track does not
    /// carry over. Returns true when the mode reverted to off.
    pub fn on_track_changed(&mut self) -> bool {
        if self.mode == SleepTimerMode::EndOfChapter && self.phase != Phase::Idle {
            self.reset();
            true
        } else {
            false
        }
    }

    /// The track ended naturally. Returns the fired mode when this ends an
    /// end-of-chapter timer; playback should then stop instead of advancing.
    pub fn on_ended(&mut self) -> Option<SleepTimerMode> {
        (self.mode == SleepTimerMode::EndOfChapter).then(|| self.fire())
    }

    /// Fires the timer if its deadline has passed
    pub fn poll(&mut self, now: Timestamp) -> Option<SleepTimerMode> {
        match self.phase {
            Phase::Armed { deadline } if now >= deadline => Some(self.fire()),
            _ => None,
        }
    }

    fn arm(&mut self, snapshot: PlaybackSnapshot, now: Timestamp) {
        let remaining_ms = match self.mode {
            SleepTimerMode::Off => return,
            SleepTimerMode::Countdown { minutes } => u64::from(minutes) * 60_000,
            SleepTimerMode::EndOfChapter => match snapshot.remaining() {
                Some(seconds) if seconds > 0.0 => (seconds * 1000.0).ceil() as u64,
                _ => {
                    // Duration unknown yet; on_play arms once it is
                    self.phase = Phase::Idle;
                    return;
                }
            },
        };
        self.phase = Phase::Armed {
            deadline: now.plus_millis(remaining_ms),
        };
    }

    fn fire(&mut self) -> SleepTimerMode {
        let fired = self.mode;
        log::info!("Sleep timer fired ({})", fired);
        self.reset();
        fired
    }

    fn reset(&mut self) {
        self.mode = SleepTimerMode::Off;
        self.phase = Phase::Idle;
    }
}

impl Default for SleepTimer {
    fn default() -> Self {
        Self::new(SleepTimerMode::Off)
    }
}

/// Text shown when the timer pauses playback
pub fn fired_notice(mode: SleepTimerMode) -> String {
    match mode {
        SleepTimerMode::Countdown { minutes } => {
            format!("Sleep timer: {} minutes are up, playback paused.", minutes)
        }
        _ => "Sleep timer: end of chapter reached, playback paused.".to_string(),
    }
}
