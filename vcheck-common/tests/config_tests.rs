//! Tests for config file resolution and graceful degradation
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate VCHECK_TEST_CONFIG are marked with #[serial].

use serde::Deserialize;
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::PathBuf;
use vcheck_common::config::{load_toml_config, resolve_config_path, LoggingConfig, CONFIG_DIR_NAME};
use vcheck_common::Error;

const TEST_ENV_VAR: &str = "VCHECK_TEST_CONFIG";

#[derive(Debug, Deserialize, PartialEq)]
struct SampleConfig {
    port: u16,
    #[serde(default)]
    logging: LoggingConfig,
}

#[test]
#[serial]
fn test_resolver_env_var_used_without_cli() {
    env::set_var(TEST_ENV_VAR, "/tmp/vcheck-env.toml");

    let path = resolve_config_path(None, TEST_ENV_VAR, "detect");

    env::remove_var(TEST_ENV_VAR);
    assert_eq!(path, Some(PathBuf::from("/tmp/vcheck-env.toml")));
}

#[test]
#[serial]
fn test_resolver_cli_beats_env_var() {
    env::set_var(TEST_ENV_VAR, "/tmp/vcheck-env.toml");

    let cli = PathBuf::from("/tmp/vcheck-cli.toml");
    let path = resolve_config_path(Some(&cli), TEST_ENV_VAR, "detect");

    env::remove_var(TEST_ENV_VAR);
    assert_eq!(path, Some(cli));
}

#[test]
#[serial]
fn test_resolver_falls_back_to_platform_dir() {
    env::remove_var(TEST_ENV_VAR);

    let path = resolve_config_path(None, TEST_ENV_VAR, "detect");

    if let Some(path) = path {
        assert!(path.ends_with(PathBuf::from(CONFIG_DIR_NAME).join("detect.toml")));
    }
}

#[test]
#[serial]
fn test_resolver_ignores_blank_env_var() {
    env::set_var(TEST_ENV_VAR, "   ");

    let path = resolve_config_path(None, TEST_ENV_VAR, "detect");

    env::remove_var(TEST_ENV_VAR);
    assert_ne!(path, Some(PathBuf::from("   ")));
}

#[test]
fn test_missing_file_is_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");

    let loaded: Option<SampleConfig> = load_toml_config(&missing).unwrap();
    assert!(loaded.is_none());
}

#[test]
fn test_valid_file_is_loaded() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "port = 9100").unwrap();
    writeln!(file, "[logging]").unwrap();
    writeln!(file, "level = \"debug\"").unwrap();

    let loaded: SampleConfig = load_toml_config(file.path()).unwrap().unwrap();
    assert_eq!(loaded.port, 9100);
    assert_eq!(
        loaded.logging,
        LoggingConfig {
            level: "debug".to_string(),
            file: None,
        }
    );
}

#[test]
fn test_malformed_file_is_a_config_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "port = \"not a number").unwrap();

    let result: vcheck_common::Result<Option<SampleConfig>> = load_toml_config(file.path());
    assert!(matches!(result, Err(Error::Config(_))));
}
