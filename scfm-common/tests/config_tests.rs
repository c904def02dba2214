//! Tests for config loading and root folder resolution
//!
//! Tests that touch SCFM_ROOT_FOLDER or SCFM_CONFIG are marked #[serial]
//! so environment changes do not race.

use std::env;
use std::path::{Path, PathBuf};

use scfm_common::config::{
    default_root_folder, load_config, resolve_config_path, resolve_root_folder, StorageBackend,
    TomlConfig, CONFIG_ENV, ROOT_FOLDER_ENV,
};
use serial_test::serial;
use tempfile::TempDir;

// ========================================
// Loading
// ========================================

#[test]
fn test_missing_config_file_uses_defaults() {
    let temp = TempDir::new().unwrap();
    let config = load_config(&temp.path().join("nope.toml")).unwrap();
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 5740);
    assert!(config.admin_emails.is_empty());
}

#[test]
fn test_partial_config_keeps_other_defaults() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
admin_emails = ["boss@scf.example"]

[server]
port = 8088

[storage]
backend = "memory"

[distribution]
time_scale = 0.01
"#,
    )
    .unwrap();

    let config = load_config(&path).unwrap();
    assert_eq!(config.server.port, 8088);
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.storage.backend, StorageBackend::Memory);
    assert_eq!(config.distribution.time_scale, 0.01);
    assert_eq!(config.limits.max_artists_per_user, 3);
    assert!(config.is_admin_email("BOSS@scf.example"));
}

#[test]
fn test_malformed_config_is_an_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.toml");
    std::fs::write(&path, "[server\nport = ").unwrap();
    assert!(load_config(&path).is_err());
}

#[test]
fn test_negative_time_scale_rejected() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.toml");
    std::fs::write(&path, "[distribution]\ntime_scale = -1.0\n").unwrap();
    assert!(load_config(&path).is_err());
}

// ========================================
// Root folder priority
// ========================================

#[test]
#[serial]
fn test_root_folder_cli_wins() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/scfm-from-env");
    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/scfm-from-toml")),
        ..Default::default()
    };

    let root = resolve_root_folder(Some(Path::new("/tmp/scfm-from-cli")), &config);

    env::remove_var(ROOT_FOLDER_ENV);
    assert_eq!(root, PathBuf::from("/tmp/scfm-from-cli"));
}

#[test]
#[serial]
fn test_root_folder_env_beats_toml() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/scfm-from-env");
    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/scfm-from-toml")),
        ..Default::default()
    };

    let root = resolve_root_folder(None, &config);

    env::remove_var(ROOT_FOLDER_ENV);
    assert_eq!(root, PathBuf::from("/tmp/scfm-from-env"));
}

#[test]
#[serial]
fn test_root_folder_toml_then_default() {
    env::remove_var(ROOT_FOLDER_ENV);
    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/scfm-from-toml")),
        ..Default::default()
    };
    assert_eq!(resolve_root_folder(None, &config), PathBuf::from("/tmp/scfm-from-toml"));
    assert_eq!(resolve_root_folder(None, &TomlConfig::default()), default_root_folder());
}

#[test]
#[serial]
fn test_config_path_priority() {
    env::set_var(CONFIG_ENV, "/tmp/scfm-env.toml");
    assert_eq!(
        resolve_config_path(Some(Path::new("/tmp/cli.toml"))),
        PathBuf::from("/tmp/cli.toml")
    );
    assert_eq!(resolve_config_path(None), PathBuf::from("/tmp/scfm-env.toml"));
    env::remove_var(CONFIG_ENV);

    let default = resolve_config_path(None);
    assert!(default.ends_with("config.toml") || default.ends_with("scfm-config.toml"));
}
