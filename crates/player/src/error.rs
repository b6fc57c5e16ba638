// crates/player/src/error.rs

use taleshelf_config::ConfigError;
use taleshelf_core::{AppError, TitleId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlayerError {
    #[error("Title {0} is not in the catalog")]
    TitleNotFound(TitleId),

    #[error("Track {index} is out of range for a playlist of {len}")]
    TrackOutOfRange { index: usize, len: usize },

    #[error("No title is open")]
    NoTitleOpen,

    #[error("No track is loaded")]
    NoTrackLoaded,

    #[error("Nothing to resume")]
    NothingToResume,

    #[error("Invalid speed: {0}")]
    InvalidSpeed(String),

    #[error("Surface error: {0}")]
    Surface(String),

    #[error("No catalog configured; set library.catalog_path")]
    NoCatalog,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    App(#[from] AppError),
}

impl PlayerError {
    /// Text shown to the listener when a command cannot be carried out
    pub fn user_message(&self) -> String {
        match self {
            Self::TitleNotFound(_) => {
                "The saved title was not found. It may have been removed or changed.".to_string()
            }
            Self::NothingToResume => "There is nothing to resume yet.".to_string(),
            Self::App(err) => err.user_message(),
            other => other.to_string(),
        }
    }
}

impl From<PlayerError> for AppError {
    fn from(err: PlayerError) -> Self {
        match err {
            PlayerError::TitleNotFound(id) => AppError::not_found("title", id),
            PlayerError::TrackOutOfRange { index, len } => AppError::InvalidArgument {
                argument: "track_index".to_string(),
                reason: format!("{} is out of range for {} tracks", index, len),
            },
            PlayerError::InvalidSpeed(reason) => AppError::InvalidArgument {
                argument: "speed".to_string(),
                reason,
            },
            PlayerError::Config(err) => AppError::InvalidInput {
                what: "config".to_string(),
                reason: err.to_string(),
            },
            PlayerError::NoCatalog => AppError::InvalidInput {
                what: "config".to_string(),
                reason: "library.catalog_path is not set".to_string(),
            },
            PlayerError::App(inner) => inner,
            other => AppError::InternalError {
                message: other.to_string(),
            },
        }
    }
}

pub type PlayerResult<T> = Result<T, PlayerError>;
