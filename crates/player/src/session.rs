//! Playback session state

use crate::error::{PlayerError, PlayerResult};
use taleshelf_core::{PlaybackSpeed, Title, TitleId, Track};

/// The open title and where playback is within it
///
/// Created when a title is opened and dropped on return to the library.
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    title: Title,
    playlist: Vec<Track>,
    current_index: Option<usize>,
    is_playing: bool,
    playback_rate: PlaybackSpeed,
}

impl PlaybackSession {
    pub fn new(title: Title, playlist: Vec<Track>, playback_rate: PlaybackSpeed) -> Self {
        Self {
            title,
            playlist,
            current_index: None,
            is_playing: false,
            playback_rate,
        }
    }

    pub fn title_id(&self) -> TitleId {
        self.title.id
    }

    pub fn title(&self) -> &Title {
        &self.title
    }

    pub fn playlist(&self) -> &[Track] {
        &self.playlist
    }

    pub fn len(&self) -> usize {
        self.playlist.len()
    }

    pub fn is_empty(&self) -> bool {
        self.playlist.is_empty()
    }

    pub fn track(&self, index: usize) -> Option<&Track> {
        self.playlist.get(index)
    }

    /// Index of the loaded track, `None` until one is picked
    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.current_index.and_then(|index| self.playlist.get(index))
    }

    pub fn select(&mut self, index: usize) -> PlayerResult<&Track> {
        let len = self.playlist.len();
        let track = self
            .playlist
            .get(index)
            .ok_or(PlayerError::TrackOutOfRange { index, len })?;
        self.current_index = Some(index);
        Ok(track)
    }

    pub fn next_index(&self) -> Option<usize> {
        self.current_index
            .map(|index| index + 1)
            .filter(|next| *next < self.playlist.len())
    }

    pub fn previous_index(&self) -> Option<usize> {
        self.current_index.and_then(|index| index.checked_sub(1))
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.is_playing = playing;
    }

    pub fn playback_rate(&self) -> PlaybackSpeed {
        self.playback_rate
    }

    pub fn set_playback_rate(&mut self, rate: PlaybackSpeed) {
        self.playback_rate = rate;
    }
}
