//! Configuration loading and songs folder resolution
//!
//! The TOML file is bootstrap-only: it is read once at startup. A missing file
//! is not an error; the built-in defaults are used and a warning is logged.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the songs folder
pub const SONGS_FOLDER_ENV: &str = "KARA_SONGS_FOLDER";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    /// Folder holding one sub-folder per song (optional)
    #[serde(default)]
    pub songs_folder: Option<PathBuf>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub playback: PlaybackConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Playback tuning
#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackConfig {
    /// Interval between dispatch ticks while playing
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Notification channel capacity
    #[serde(default = "default_event_bus_capacity")]
    pub event_bus_capacity: usize,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            event_bus_capacity: default_event_bus_capacity(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_tick_interval_ms() -> u64 {
    16 // roughly one display frame
}

fn default_event_bus_capacity() -> usize {
    100
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(text)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;

        if config.playback.tick_interval_ms == 0 {
            return Err(Error::Config("playback.tick_interval_ms must be > 0".to_string()));
        }
        Ok(config)
    }

    /// Load configuration from a file, falling back to defaults if it is missing
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!("Config file {:?} not found, using built-in defaults", path);
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        info!("Loaded TOML configuration from {:?}", path);
        Ok(config)
    }
}

/// Default configuration file location for the platform
///
/// `<config dir>/kara/config.toml` (e.g. `~/.config/kara/config.toml` on Linux)
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("kara").join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("kara.toml"))
}

/// OS-dependent default songs folder
pub fn default_songs_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("kara").join("songs"))
        .unwrap_or_else(|| PathBuf::from("./songs"))
}

/// Songs folder resolution
///
/// Priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
#[derive(Debug, Clone)]
pub struct SongsFolderResolver {
    env_var_name: String,
}

impl SongsFolderResolver {
    pub fn new() -> Self {
        Self::with_env_var(SONGS_FOLDER_ENV)
    }

    pub fn with_env_var(env_var_name: impl Into<String>) -> Self {
        Self {
            env_var_name: env_var_name.into(),
        }
    }

    pub fn resolve(&self, cli_arg: Option<&Path>, toml_config: &TomlConfig) -> PathBuf {
        if let Some(path) = cli_arg {
            return path.to_path_buf();
        }

        if let Ok(path) = std::env::var(&self.env_var_name) {
            if !path.is_empty() {
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &toml_config.songs_folder {
            return path.clone();
        }

        default_songs_folder()
    }
}

impl Default for SongsFolderResolver {
    fn default() -> Self {
        Self::new()
    }
}
