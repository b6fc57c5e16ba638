//! Where taleshelf keeps its files, and the config a starting player runs with

use crate::file::{ConfigFile, LoadedConfig};
use crate::{Config, ConfigError, ConfigResult};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "config.toml";

/// Owns the config directory
///
/// Relative paths in the `[library]` section resolve against this directory,
/// so a whole install can be moved by moving one folder.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    dir: PathBuf,
    file: ConfigFile,
}

impl ConfigManager {
    /// Uses the platform config directory, e.g. `~/.config/taleshelf/` on Linux
    pub fn new() -> ConfigResult<Self> {
        ProjectDirs::from("", "", "taleshelf")
            .map(|dirs| Self::with_directory(dirs.config_dir()))
            .ok_or(ConfigError::NoConfigDir)
    }

    pub fn with_directory(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let file = ConfigFile::new(dir.join(CONFIG_FILE));
        Self { dir, file }
    }

    pub fn config_dir(&self) -> &Path {
        &self.dir
    }

    pub fn config_path(&self) -> &Path {
        self.file.path()
    }

    pub fn backup_path(&self) -> PathBuf {
        self.file.backup_path()
    }

    /// Reads `config.toml` as written, without environment overrides
    pub fn load(&self) -> ConfigResult<LoadedConfig> {
        self.file.read()
    }

    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        self.file.write(config)
    }

    /// Config for a player that is starting up
    ///
    /// File values first, then `TALESHELF_<SECTION>_<FIELD>` environment
    /// variables. A damaged file is logged and replaced by defaults so the player
    /// still starts; the file itself is left alone for the user to repair.
    pub fn startup_config(&self) -> Config {
        let mut config = match self.load() {
            Ok(loaded) => loaded.config,
            Err(e) => {
                log::warn!("{}, starting with default settings", e);
                Config::default()
            }
        };
        apply_env_overrides(&mut config, |key| std::env::var(key).ok());
        config
    }

    /// The key-value store file named by `library.store_path`
    pub fn store_path(&self, config: &Config) -> PathBuf {
        self.resolve(&config.library.store_path)
    }

    /// The catalog document named by `library.catalog_path`, if any
    pub fn catalog_path(&self, config: &Config) -> Option<PathBuf> {
        config
            .library
            .catalog_path
            .as_deref()
            .map(|path| self.resolve(path))
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.dir.join(path)
        }
    }
}

fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    fn parsed<T: std::str::FromStr>(key: &str, raw: Option<String>) -> Option<T> {
        let raw = raw?;
        match raw.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                log::warn!("Ignoring {}={}: not a valid value", key, raw);
                None
            }
        }
    }

    const SPEED: &str = "TALESHELF_PLAYER_DEFAULT_SPEED";
    const THROTTLE: &str = "TALESHELF_PLAYER_PROGRESS_THROTTLE_MS";
    const PROBE_TIMEOUT: &str = "TALESHELF_PREFETCH_PROBE_TIMEOUT_MS";
    const ROOT_URL: &str = "TALESHELF_LIBRARY_ROOT_URL";
    const STORE: &str = "TALESHELF_LIBRARY_STORE_PATH";

    if let Some(v) = parsed(SPEED, lookup(SPEED)) {
        config.player.default_speed = v;
    }
    if let Some(v) = parsed(THROTTLE, lookup(THROTTLE)) {
        config.player.progress_throttle_ms = v;
    }
    if let Some(v) = parsed(PROBE_TIMEOUT, lookup(PROBE_TIMEOUT)) {
        config.prefetch.probe_timeout_ms = v;
    }
    if let Some(url) = lookup(ROOT_URL).filter(|url| !url.trim().is_empty()) {
        config.library.root_url = Some(url);
    }
    if let Some(path) = lookup(STORE).filter(|path| !path.trim().is_empty()) {
        config.library.store_path = PathBuf::from(path);
    }
}
