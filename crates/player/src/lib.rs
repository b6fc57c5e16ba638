//! Taleshelf playback core
//!
//! Drives a [`MediaSurface`] through a [`PlayerController`]: progress saving
//! and resume, the sleep timer, and the listener's playback preferences.
//! [`Launch`] builds a controller from the on-disk config, store and catalog.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use taleshelf_config::PlayerConfig;
//! use taleshelf_core::{Catalog, SystemClock, Title, TitleId, TrackSpec};
//! use taleshelf_player::{PlayerController, PlayerEvent, SimulatedSurface};
//! use taleshelf_storage::MemoryStore;
//!
//! let title = Title {
//!     id: TitleId::new(1),
//!     folder_name: "Harbor".to_string(),
//!     title: "The Harbor".to_string(),
//!     author: "J. Doe".to_string(),
//!     cover_url: String::new(),
//!     description: String::new(),
//!     declared_chapter_count: 0,
//!     tracks: TrackSpec::batch(1, 10, 5, "mp3"),
//! };
//! let catalog = Arc::new(Catalog::new("https://files.example.org", vec![title]));
//!
//! let mut player = PlayerController::new(
//!     SimulatedSurface::new(),
//!     catalog,
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(SystemClock),
//!     &PlayerConfig::default(),
//! );
//!
//! player.open_title(TitleId::new(1)).unwrap();
//! player.play_track(0).unwrap();
//! player.surface_mut().finish_loading(1800.0);
//! player.handle_event(PlayerEvent::MetadataReady);
//! assert!(player.is_playing());
//! ```

mod controller;
mod error;
mod launch;
mod session;
mod sleep_timer;
mod surface;
mod tracker;

pub use controller::{ControllerSettings, PlayerController, PlayerEvent};
pub use error::{PlayerError, PlayerResult};
pub use launch::Launch;
pub use session::PlaybackSession;
pub use sleep_timer::{fired_notice, SleepTimer};
pub use surface::{MediaSurface, PlaybackSnapshot, SimulatedSurface, SurfaceCommand};
pub use tracker::{
    clamp_resume_offset, ProgressTracker, ResumePlan, ResumeSummary, SaveOutcome, SaveReason,
    SkipReason, TrackerSettings,
};
