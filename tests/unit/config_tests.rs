// ==========================
// tests/unit/config_tests.rs
// ==========================
//! Unit tests for the configuration module
use canary_backend_lib::config::{Settings, StorageBackend};
use std::fs;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn test_settings_default() {
    let settings = Settings::default();

    assert_eq!(settings.log_level, "info");
    assert_eq!(settings.bind_addr(), "127.0.0.1:8080");
    assert!(!settings.server.secure_cookies);
    assert_eq!(settings.session.max_token_attempts, 3);
    assert_eq!(settings.session.sweep_interval(), Duration::from_secs(3600));
    assert_eq!(settings.password.scrypt_log_n, 17);
}

#[test]
fn test_shipped_config_file_loads() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../config/default.toml");
    let settings = Settings::load_from(path).unwrap();

    assert_eq!(settings.storage.backend, StorageBackend::Sqlite);
    assert_eq!(settings.session.ttl(), chrono::Duration::days(30));
}

#[test]
fn test_unknown_backend_is_rejected() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "[storage]\nbackend = \"postgres\"\n").unwrap();

    assert!(Settings::load_from(&config_path).is_err());
}

#[test]
fn test_unrefusable_scrypt_params_rejected() {
    let mut settings = Settings::default();
    settings.password.scrypt_p = 0;
    assert!(settings.validate().is_err());
    assert!(settings.password.scrypt_params().is_err());
}
