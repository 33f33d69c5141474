//! TOML-based configuration for waymark.
//!
//! Every section is optional; missing keys fall back to their defaults.
//!
//! Example configuration:
//! ```toml
//! [resolution]
//! max_depth = 8
//! fetch_timeout_ms = 2000
//!
//! [validation]
//! zero_is_empty = true
//! allow_boundary = false
//! require_full_containment = true
//!
//! [logging]
//! level = "info"
//! json = false
//!
//! [snapshot]
//! path = "${WAYMARK_DATA}/world.json"
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub resolution: ResolutionSettings,
    pub validation: ValidationSettings,
    pub logging: LoggingSettings,
    pub snapshot: SnapshotSettings,
}

/// Limits applied by the path resolution engine.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ResolutionSettings {
    /// Maximum number of segments in a path.
    pub max_depth: usize,

    /// Upper bound for one store fetch, in milliseconds. 0 disables it.
    pub fetch_timeout_ms: u64,
}

impl Default for ResolutionSettings {
    fn default() -> Self {
        Self {
            max_depth: 8,
            fetch_timeout_ms: 0,
        }
    }
}

/// Defaults for the built-in validators.
///
/// Individual rules may override these through their configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ValidationSettings {
    /// Treat numeric zero as an empty value in required checks.
    pub zero_is_empty: bool,

    /// Points on a region boundary count as inside.
    pub allow_boundary: bool,

    /// Child regions must lie entirely inside their parent.
    pub require_full_containment: bool,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            zero_is_empty: true,
            allow_boundary: false,
            require_full_containment: true,
        }
    }
}

/// Log output configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive used when `RUST_LOG` is unset (e.g. "info", "waymark=debug").
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Default snapshot used by the CLI when none is given.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SnapshotSettings {
    /// Path to a snapshot file (supports ${ENV_VAR} expansion).
    pub path: Option<String>,
}

impl SnapshotSettings {
    /// The configured path with environment variables expanded.
    pub fn resolved_path(&self) -> Result<Option<PathBuf>, SettingsError> {
        self.path
            .as_deref()
            .map(|path| expand_env_vars(path).map(PathBuf::from))
            .transpose()
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and check settings from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        settings.check()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `WAYMARK_CONFIG`
    /// 2. `./waymark.toml`
    /// 3. `~/.config/waymark/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("WAYMARK_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("waymark.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("waymark").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    fn check(&self) -> Result<(), SettingsError> {
        if self.resolution.max_depth == 0 {
            return Err(SettingsError::InvalidConfig(
                "resolution.max_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

static ENV_VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(?:\{([^}]*)\}|([A-Za-z_][A-Za-z0-9_]*))").unwrap()
});

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax. A lone `$` is kept.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut missing = None;
    let expanded = ENV_VAR_PATTERN.replace_all(s, |caps: &Captures| {
        let name = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map_or("", |m| m.as_str());
        match env::var(name) {
            Ok(value) => value,
            Err(_) => {
                missing.get_or_insert_with(|| name.to_string());
                String::new()
            }
        }
    });

    match missing {
        Some(name) => Err(SettingsError::MissingEnvVar(name)),
        None => Ok(expanded.into_owned()),
    }
}
