//! Edge case and error scenario tests

use std::fs;
use taleshelf_config::{Config, ConfigError, ConfigManager};
use tempfile::TempDir;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn setup_test_manager() -> (TempDir, ConfigManager) {
    init_logging();
    let temp_dir = TempDir::new().expect("temp dir");
    let manager = ConfigManager::with_directory(temp_dir.path());
    (temp_dir, manager)
}

#[test]
fn test_save_creates_parent_directories() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let temp_dir = TempDir::new()?;
    let manager = ConfigManager::with_directory(temp_dir.path().join("a").join("b").join("c"));

    manager.save(&Config::default())?;
    assert!(manager.config_path().exists());

    Ok(())
}

#[test]
fn test_concurrent_startup_loads() -> Result<(), Box<dyn std::error::Error>> {
    let (temp_dir, manager) = setup_test_manager();
    let mut config = Config::default();
    config.player.skip_step_secs = 12;
    manager.save(&config)?;

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let dir = temp_dir.path().to_path_buf();
            std::thread::spawn(move || {
                let manager = ConfigManager::with_directory(dir);
                for _ in 0..10 {
                    assert_eq!(manager.startup_config().player.skip_step_secs, 12);
                    std::thread::sleep(std::time::Duration::from_millis(1));
                }
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().is_ok());
    }

    Ok(())
}

#[test]
fn test_boundary_values_validation() {
    let mut config = Config::default();

    config.player.default_speed = 3.0;
    config.player.min_meaningful_position_secs = 5.0;
    config.player.resume_end_margin_secs = 30.0;
    assert!(config.validate().is_ok());

    config.player.default_speed = 0.5;
    config.player.min_meaningful_position_secs = 0.0;
    config.player.resume_end_margin_secs = 0.0;
    assert!(config.validate().is_ok());

    config.player.min_meaningful_position_secs = 5.01;
    assert!(config.validate().is_err());

    config.player.min_meaningful_position_secs = 0.5;
    config.player.default_speed = 3.01;
    assert!(config.validate().is_err());
}

#[test]
fn test_rapid_saves() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup_test_manager();
    let mut config = Config::default();

    for step in 1..=20u32 {
        config.player.skip_step_secs = step;
        manager.save(&config)?;
    }

    assert_eq!(manager.load()?.config.player.skip_step_secs, 20);
    Ok(())
}

#[test]
fn test_empty_config_file() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup_test_manager();
    fs::write(manager.config_path(), "")?;

    assert!(matches!(manager.load(), Err(ConfigError::Empty { .. })));
    assert_eq!(manager.startup_config().prefetch, Config::default().prefetch);

    Ok(())
}

#[test]
fn test_partial_config_toml() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup_test_manager();
    fs::write(
        manager.config_path(),
        "version = 2\n\n[player]\nskip_step_secs = 10\n",
    )?;

    let config = manager.load()?.config;
    assert_eq!(config.player.skip_step_secs, 10);
    assert_eq!(config.player.default_speed, 1.0);
    assert_eq!(config.prefetch.inter_request_delay_ms, 50);

    Ok(())
}

#[test]
fn test_unknown_keys_are_ignored() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup_test_manager();
    fs::write(
        manager.config_path(),
        "[player]\ndefault_volume = 80\n\n[theme]\naccent = \"blue\"\n",
    )?;

    assert_eq!(manager.load()?.config, Config::default());
    Ok(())
}

#[test]
fn test_playback_speed_precision() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::default();
    config.player.default_speed = 1.23456789;

    let toml = toml::to_string(&config)?;
    let deserialized: Config = toml::from_str(&toml)?;

    assert!((deserialized.player.default_speed - 1.23456789).abs() < 0.0001);

    Ok(())
}

#[test]
fn test_backup_preserved_on_failed_save() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup_test_manager();

    let mut config = Config::default();
    config.player.skip_step_secs = 15;
    manager.save(&config)?;
    manager.save(&config)?;

    config.player.skip_step_secs = 0;
    assert!(manager.save(&config).is_err());

    let backup_config: Config = toml::from_str(&fs::read_to_string(manager.backup_path())?)?;
    assert_eq!(backup_config.player.skip_step_secs, 15);
    assert_eq!(manager.load()?.config.player.skip_step_secs, 15);

    Ok(())
}
