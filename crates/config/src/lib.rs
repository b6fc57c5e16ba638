//! Taleshelf Configuration System
//!
//! Each area of the player owns a section type implementing `ConfigSection`.
//!
//! - **Graceful degradation**: out-of-range values load with a warning
//! - **Atomic writes**: the config file is never left half-written
//! - **Migrations**: older layouts are upgraded on load
//!
//! # Example
//!
//! ```rust,no_run
//! use taleshelf_config::{Config, ConfigManager};
//!
//! let config = ConfigManager::new()
//!     .map(|manager| manager.startup_config())
//!     .unwrap_or_default();
//!
//! println!("Saving progress at most every {}ms", config.player.progress_throttle_ms);
//! ```

mod error;
mod file;
mod manager;
mod migration;
mod validation;

mod library_config;
mod player_config;
mod prefetch_config;

pub use error::{ConfigError, ConfigResult, ValidationError};
pub use file::{ConfigFile, LoadedConfig};
pub use manager::ConfigManager;
pub use validation::{ConfigSection, Validator};

pub use library_config::LibraryConfig;
pub use player_config::PlayerConfig;
pub use prefetch_config::PrefetchConfig;

use serde::{Deserialize, Serialize};

/// Current config file format version for migrations
pub const CONFIG_VERSION: u32 = 2;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Config file format version
    pub version: u32,

    /// Playback and progress saving
    pub player: PlayerConfig,

    /// Background duration lookups
    pub prefetch: PrefetchConfig,

    /// Catalog and file store locations
    pub library: LibraryConfig,
}

impl Config {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the entire configuration
    ///
    /// Returns all validation errors found across all sections.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(mut e) = self.player.validate() {
            errors.append(&mut e);
        }

        if let Err(mut e) = self.prefetch.validate() {
            errors.append(&mut e);
        }

        if let Err(mut e) = self.library.validate() {
            errors.append(&mut e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Merges this config with another, preferring values from `other`
    ///
    /// Override chain: defaults < file < env vars
    pub fn merge(&mut self, other: Config) {
        self.player.merge(other.player);
        self.prefetch.merge(other.prefetch);
        self.library.merge(other.library);
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            player: PlayerConfig::default(),
            prefetch: PrefetchConfig::default(),
            library: LibraryConfig::default(),
        }
    }
}
