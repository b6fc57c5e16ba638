//! Configuration migration system
//!
//! Old layouts are upgraded on the raw TOML table, before it is deserialized,
//! so fields that moved or were renamed are not silently dropped.

use crate::{Config, ConfigError, ConfigResult, CONFIG_VERSION};

/// Trait for config migrations
pub trait Migration {
    /// Returns the version this migration upgrades TO
    fn target_version(&self) -> u32;

    /// Performs the migration
    fn migrate(&self, table: &mut toml::Table) -> ConfigResult<()>;
}

/// Reads the `version` key of a raw config table
///
/// A missing key means the file was written by the current version.
pub fn detect_version(table: &toml::Table) -> u32 {
    table
        .get("version")
        .and_then(toml::Value::as_integer)
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(CONFIG_VERSION)
}

/// Migrates a raw config table to the latest layout and deserializes it
pub fn migrate_to_latest(mut table: toml::Table) -> ConfigResult<Config> {
    let from = detect_version(&table);

    if from > CONFIG_VERSION {
        log::warn!(
            "Config version {} is newer than supported version {}. Attempting to use as-is.",
            from,
            CONFIG_VERSION
        );
    }

    if from < CONFIG_VERSION {
        log::info!("Migrating config from version {} to {}", from, CONFIG_VERSION);

        let mut current_version = from;
        while current_version < CONFIG_VERSION {
            let next_version = current_version + 1;

            if let Some(migration) = get_migration(next_version) {
                migration.migrate(&mut table)?;
                log::info!("Applied migration to version {}", migration.target_version());
            } else {
                log::warn!(
                    "No migration defined for version {}, skipping",
                    next_version
                );
            }

            current_version = next_version;
        }

        table.insert(
            "version".to_string(),
            toml::Value::Integer(i64::from(CONFIG_VERSION)),
        );
    }

    toml::Value::Table(table)
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::Migration {
            from,
            reason: e.to_string(),
        })
}

/// Returns the migration for a specific version, if one exists
fn get_migration(version: u32) -> Option<Box<dyn Migration>> {
    match version {
        2 => Some(Box::new(MigrationV2)),
        _ => None,
    }
}

/// Version 1 kept the probe timeout under `[player]` as `metadata_timeout_ms`;
/// version 2 moved it to `[prefetch]`.
struct MigrationV2;

impl Migration for MigrationV2 {
    fn target_version(&self) -> u32 {
        2
    }

    fn migrate(&self, table: &mut toml::Table) -> ConfigResult<()> {
        let moved = match table.get_mut("player") {
            Some(toml::Value::Table(player)) => player.remove("metadata_timeout_ms"),
            Some(_) => {
                return Err(ConfigError::Migration {
                    from: 1,
                    reason: "[player] is not a table".to_string(),
                })
            }
            None => None,
        };

        if let Some(timeout) = moved {
            let prefetch = table
                .entry("prefetch")
                .or_insert_with(|| toml::Value::Table(toml::Table::new()));

            match prefetch {
                toml::Value::Table(prefetch) => {
                    prefetch
                        .entry("probe_timeout_ms")
                        .or_insert(timeout);
                }
                _ => {
                    return Err(ConfigError::Migration {
                        from: 1,
                        reason: "[prefetch] is not a table".to_string(),
                    })
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> toml::Table {
        toml::from_str(s).expect("test TOML should parse")
    }

    #[test]
    fn test_migrate_same_version() {
        let table = parse(&toml::to_string(&Config::default()).expect("Should serialize"));
        let migrated = migrate_to_latest(table).expect("Should migrate");
        assert_eq!(migrated, Config::default());
    }

    #[test]
    fn test_migrate_newer_version() {
        let table = parse(&format!("version = {}\n", CONFIG_VERSION + 1));
        let migrated = migrate_to_latest(table).expect("Should handle newer version");
        assert_eq!(migrated.version, CONFIG_VERSION + 1);
    }

    #[test]
    fn test_missing_version_is_current() {
        assert_eq!(detect_version(&parse("[player]\n")), CONFIG_VERSION);
        assert_eq!(detect_version(&parse("version = -3\n")), CONFIG_VERSION);
    }

    #[test]
    fn test_v1_timeout_moves_to_prefetch() {
        let table = parse(
            "version = 1\n\n[player]\ndefault_speed = 1.25\nmetadata_timeout_ms = 8000\n",
        );
        let migrated = migrate_to_latest(table).expect("Should migrate");

        assert_eq!(migrated.version, CONFIG_VERSION);
        assert_eq!(migrated.prefetch.probe_timeout_ms, 8000);
        assert_eq!(migrated.player.default_speed, 1.25);
    }

    #[test]
    fn test_v1_explicit_prefetch_wins() {
        let table = parse(
            "version = 1\n\n[player]\nmetadata_timeout_ms = 8000\n\n[prefetch]\nprobe_timeout_ms = 3000\n",
        );
        let migrated = migrate_to_latest(table).expect("Should migrate");
        assert_eq!(migrated.prefetch.probe_timeout_ms, 3000);
    }

    #[test]
    fn test_v1_malformed_player_section() {
        let table = parse("version = 1\nplayer = 3\n");
        assert!(matches!(
            migrate_to_latest(table),
            Err(ConfigError::Migration { from: 1, .. })
        ));
    }

    #[test]
    fn test_get_migration() {
        assert!(get_migration(2).is_some());
        assert!(get_migration(999).is_none());
    }
}
