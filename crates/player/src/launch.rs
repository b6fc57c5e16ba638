// crates/player/src/launch.rs
//! Startup wiring
//!
//! Reads the config through a [`ConfigManager`], opens the key-value file it
//! names, reads the catalog and hands all of it to a [`PlayerController`].

use crate::controller::PlayerController;
use crate::error::{PlayerError, PlayerResult};
use crate::surface::MediaSurface;
use std::fs;
use std::sync::Arc;
use taleshelf_config::{Config, ConfigManager};
use taleshelf_core::{AppError, Catalog, Clock};
use taleshelf_storage::FileStore;

/// Everything a player needs from disk
#[derive(Debug)]
pub struct Launch {
    pub config: Config,
    pub store: Arc<FileStore>,
    pub catalog: Arc<Catalog>,
}

impl Launch {
    /// Loads the catalog document named by `library.catalog_path`
    pub fn from_manager(manager: &ConfigManager) -> PlayerResult<Self> {
        let config = manager.startup_config();
        let path = manager
            .catalog_path(&config)
            .ok_or(PlayerError::NoCatalog)?;

        log::info!("Reading catalog from {}", path.display());
        let text = fs::read_to_string(&path).map_err(AppError::from)?;
        let catalog = Catalog::from_json(&text)?;

        Ok(Self::assemble(manager, config, catalog))
    }

    /// For embedding apps that ship the catalog themselves
    pub fn with_catalog(manager: &ConfigManager, catalog: Catalog) -> Self {
        Self::assemble(manager, manager.startup_config(), catalog)
    }

    fn assemble(manager: &ConfigManager, config: Config, mut catalog: Catalog) -> Self {
        if let Some(ref mirror) = config.library.root_url {
            log::info!("Serving tracks from {} instead of {}", mirror, catalog.root_url);
            catalog.root_url = mirror.clone();
        }

        let store_path = manager.store_path(&config);
        if let Some(dir) = store_path.parent() {
            if let Err(e) = fs::create_dir_all(dir) {
                // Reads still work; writes will report StoreFailed
                log::warn!("Cannot create {}: {}", dir.display(), e);
            }
        }
        let store = Arc::new(FileStore::open_or_reset(store_path));

        Self {
            config,
            store,
            catalog: Arc::new(catalog),
        }
    }

    pub fn into_player<S: MediaSurface>(
        self,
        surface: S,
        clock: Arc<dyn Clock>,
    ) -> PlayerController<S> {
        PlayerController::new(
            surface,
            self.catalog,
            self.store,
            clock,
            &self.config.player,
        )
    }
}
