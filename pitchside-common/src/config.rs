//! Configuration loading and config file resolution
//!
//! Bootstrap configuration comes from a single TOML file. Every field has a
//! built-in default, so a missing file (or a missing section) never prevents
//! startup; a malformed file does.
//!
//! # Config file resolution priority
//!
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`PITCHSIDE_CONFIG`)
//! 3. Per-user config directory (`<config_dir>/pitchside/pitchside.toml`)
//! 4. Built-in defaults (no file)

use crate::types::RatingField;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "PITCHSIDE_CONFIG";

/// Config file name inside the per-user config directory
pub const CONFIG_FILE_NAME: &str = "pitchside.toml";

/// Root of the TOML configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub editor: EditorSettings,

    #[serde(default)]
    pub backend: BackendSettings,

    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Rating editor timing, bounds and composite policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorSettings {
    /// Quiet period after the last edit before a member's ratings are persisted
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// How long a Saved status stays visible
    #[serde(default = "default_saved_ttl_ms")]
    pub saved_ttl_ms: u64,

    /// How long a Failed status stays visible
    #[serde(default = "default_failed_ttl_ms")]
    pub failed_ttl_ms: u64,

    /// Re-fetch the canonical rating snapshot after successful saves
    #[serde(default = "default_true")]
    pub refresh_after_save: bool,

    #[serde(default)]
    pub skill_bounds: RatingBounds,

    #[serde(default)]
    pub physical_bounds: RatingBounds,

    #[serde(default)]
    pub composite: CompositeWeights,

    /// Actor role used by the static capability gate (admin, coach, viewer)
    #[serde(default = "default_role")]
    pub role: String,

    /// Event channel capacity
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            saved_ttl_ms: default_saved_ttl_ms(),
            failed_ttl_ms: default_failed_ttl_ms(),
            refresh_after_save: true,
            skill_bounds: RatingBounds::default(),
            physical_bounds: RatingBounds::default(),
            composite: CompositeWeights::default(),
            role: default_role(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl EditorSettings {
    pub fn debounce(&self) -> Duration {
        crate::time::millis_to_duration(self.debounce_ms)
    }

    pub fn saved_ttl(&self) -> Duration {
        crate::time::millis_to_duration(self.saved_ttl_ms)
    }

    pub fn failed_ttl(&self) -> Duration {
        crate::time::millis_to_duration(self.failed_ttl_ms)
    }

    /// Declared bounds of a rating field
    pub fn bounds(&self, field: RatingField) -> RatingBounds {
        match field {
            RatingField::Skill => self.skill_bounds,
            RatingField::Physical => self.physical_bounds,
        }
    }
}

/// Inclusive bounds of a rating field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingBounds {
    pub min: u8,
    pub max: u8,
}

impl Default for RatingBounds {
    fn default() -> Self {
        Self { min: 1, max: 5 }
    }
}

impl RatingBounds {
    pub fn contains(&self, value: u8) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Weights of the default weighted-mean composite policy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompositeWeights {
    pub skill: f64,
    pub physical: f64,
}

impl Default for CompositeWeights {
    fn default() -> Self {
        Self {
            skill: 1.0,
            physical: 1.0,
        }
    }
}

/// Backend API the editor reads from and persists to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Active scope (league/season) whose roster and ratings are edited
    #[serde(default = "default_scope")]
    pub scope: String,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Bearer token sent with every request (optional)
    #[serde(default)]
    pub api_token: Option<String>,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            scope: default_scope(),
            request_timeout_ms: default_request_timeout_ms(),
            api_token: None,
        }
    }
}

/// HTTP server settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_saved_ttl_ms() -> u64 {
    2000
}

fn default_failed_ttl_ms() -> u64 {
    3200
}

fn default_true() -> bool {
    true
}

fn default_role() -> String {
    "admin".to_string()
}

fn default_event_capacity() -> usize {
    256
}

fn default_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_scope() -> String {
    "default".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_port() -> u16 {
    5790
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Parse a TOML document and validate it
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Load the resolved config file, falling back to defaults when it is absent
    ///
    /// A missing file logs a warning and yields defaults. A file that exists but
    /// cannot be parsed or validated is an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) if path.exists() => {
                info!("Loading configuration from {}", path.display());
                Self::load(path)
            }
            Some(path) => {
                warn!(
                    "Config file {} not found, using built-in defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            None => {
                warn!("No config file found, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    /// Check cross-field constraints that serde cannot express
    pub fn validate(&self) -> Result<()> {
        let editor = &self.editor;
        if editor.debounce_ms == 0 {
            return Err(Error::Config("editor.debounce_ms must be > 0".to_string()));
        }
        for (name, bounds) in [
            ("skill_bounds", editor.skill_bounds),
            ("physical_bounds", editor.physical_bounds),
        ] {
            if bounds.min > bounds.max {
                return Err(Error::Config(format!(
                    "editor.{}: min {} exceeds max {}",
                    name, bounds.min, bounds.max
                )));
            }
        }
        let weights = editor.composite;
        if !(weights.skill > 0.0 && weights.physical > 0.0)
            || !weights.skill.is_finite()
            || !weights.physical.is_finite()
        {
            return Err(Error::Config(
                "editor.composite weights must be positive and finite".to_string(),
            ));
        }
        if editor.event_capacity == 0 {
            return Err(Error::Config("editor.event_capacity must be > 0".to_string()));
        }
        if self.backend.base_url.trim().is_empty() {
            return Err(Error::Config("backend.base_url must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Resolve which config file to read
///
/// Returns `None` when no explicit path was given and no per-user config file exists.
pub fn resolve_config_path(cli_arg: Option<&Path>, env_var_name: &str) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Per-user config directory
    dirs::config_dir()
        .map(|d| d.join("pitchside").join(CONFIG_FILE_NAME))
        .filter(|p| p.exists())
}
