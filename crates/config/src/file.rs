//! Reading and writing `config.toml`
//!
//! Writes go through a temporary file in the target directory and a rename. The
//! previous file is copied to `config.toml.backup` first. A file in an older
//! layout is upgraded on read and written back straight away.

use crate::{migration, Config, ConfigError, ConfigResult, ValidationError, CONFIG_VERSION};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// What [`ConfigFile::read`] found on disk
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConfig {
    pub config: Config,
    /// Layout version the file was upgraded from, if it was
    pub migrated_from: Option<u32>,
    /// Hand-edited values outside their ranges; kept, only reported
    pub problems: Vec<ValidationError>,
}

impl LoadedConfig {
    fn defaults() -> Self {
        Self {
            config: Config::default(),
            migrated_from: None,
            problems: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self) -> PathBuf {
        self.path.with_extension("toml.backup")
    }

    /// A missing file yields the defaults. An empty or unparsable one is an error.
    pub fn read(&self) -> ConfigResult<LoadedConfig> {
        if !self.path.exists() {
            log::info!("No config at {}, using defaults", self.path.display());
            return Ok(LoadedConfig::defaults());
        }

        let text = fs::read_to_string(&self.path)
            .map_err(|e| ConfigError::io("read", &self.path, e))?;
        if text.trim().is_empty() {
            return Err(ConfigError::Empty {
                path: self.path.clone(),
            });
        }

        let table: toml::Table = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })?;

        let version = migration::detect_version(&table);
        let config = migration::migrate_to_latest(table)?;

        let migrated_from = (version < CONFIG_VERSION).then_some(version);
        if migrated_from.is_some() {
            self.write(&config)?;
        }

        let problems = config.validate().err().unwrap_or_default();
        for problem in &problems {
            log::warn!("Config value kept despite problem: {}", problem);
        }

        Ok(LoadedConfig {
            config,
            migrated_from,
            problems,
        })
    }

    /// Validates, backs up the current file and replaces it
    pub fn write(&self, config: &Config) -> ConfigResult<()> {
        config.validate().map_err(ConfigError::Invalid)?;
        let text = toml::to_string_pretty(config)?;

        let dir = self.directory();
        fs::create_dir_all(dir).map_err(|e| ConfigError::io("create", dir, e))?;

        if self.path.exists() {
            let backup = self.backup_path();
            fs::copy(&self.path, &backup).map_err(|e| ConfigError::io("back up to", backup, e))?;
        }

        let mut staged =
            NamedTempFile::new_in(dir).map_err(|e| ConfigError::io("stage a write in", dir, e))?;
        let written = staged.write_all(text.as_bytes()).and_then(|()| staged.flush());
        written.map_err(|e| ConfigError::io("write", &self.path, e))?;
        staged
            .persist(&self.path)
            .map_err(|e| ConfigError::io("replace", &self.path, e.error))?;

        log::debug!("Wrote config to {}", self.path.display());
        Ok(())
    }

    fn directory(&self) -> &Path {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }
}
