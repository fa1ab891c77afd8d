//! Configuration resolution and graceful degradation tests
//!
//! Tests:
//! - Missing TOML files SHALL NOT cause termination (defaults + warning)
//! - Malformed TOML files are reported as configuration errors
//! - Priority order for config file resolution (CLI > env > user dir)
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.

use pitchside_common::config::{resolve_config_path, TomlConfig, CONFIG_ENV_VAR};
use pitchside_common::Error;
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[test]
fn test_missing_file_yields_defaults() {
    let path = Path::new("/nonexistent/pitchside/pitchside.toml");
    let config = TomlConfig::load_or_default(Some(path)).unwrap();
    assert_eq!(config, TomlConfig::default());
}

#[test]
fn test_no_file_yields_defaults() {
    let config = TomlConfig::load_or_default(None).unwrap();
    assert_eq!(config.editor.debounce_ms, 300);
}

#[test]
fn test_load_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[editor]
debounce_ms = 500
role = "coach"

[backend]
base_url = "https://league.example.com/api"
scope = "season-2026"
api_token = "secret"

[server]
port = 6001

[logging]
level = "debug"
"#
    )
    .unwrap();

    let config = TomlConfig::load_or_default(Some(file.path())).unwrap();
    assert_eq!(config.editor.debounce_ms, 500);
    assert_eq!(config.editor.role, "coach");
    assert_eq!(config.backend.scope, "season-2026");
    assert_eq!(config.backend.api_token.as_deref(), Some("secret"));
    assert_eq!(config.server.port, 6001);
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_malformed_file_is_config_error() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[editor]\ndebounce_ms = \"fast\"").unwrap();

    let err = TomlConfig::load_or_default(Some(file.path())).unwrap_err();
    assert!(matches!(err, Error::Config(_)), "got {:?}", err);
}

#[test]
#[serial]
fn test_cli_argument_wins_over_env() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/from-env.toml");
    let resolved = resolve_config_path(Some(Path::new("/tmp/from-cli.toml")), CONFIG_ENV_VAR);
    env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(resolved, Some(PathBuf::from("/tmp/from-cli.toml")));
}

#[test]
#[serial]
fn test_env_var_used_without_cli_argument() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/from-env.toml");
    let resolved = resolve_config_path(None, CONFIG_ENV_VAR);
    env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(resolved, Some(PathBuf::from("/tmp/from-env.toml")));
}

#[test]
#[serial]
fn test_blank_env_var_ignored() {
    env::set_var(CONFIG_ENV_VAR, "   ");
    let resolved = resolve_config_path(None, CONFIG_ENV_VAR);
    env::remove_var(CONFIG_ENV_VAR);

    // Falls through to the per-user directory, which only counts if the file exists
    if let Some(path) = resolved {
        assert!(path.exists());
    }
}
