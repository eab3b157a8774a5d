//! Player configuration
//!
//! Settings are resolved once at startup from, in priority order:
//!
//! 1. Command-line arguments (`--songs-folder`)
//! 2. Environment variables (`KARA_SONGS_FOLDER`)
//! 3. TOML bootstrap file
//! 4. Built-in defaults

use crate::playback::{ProcessorSettings, TickMode};
use crate::Result;
use kara_common::config::{SongsFolderResolver, TomlConfig};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub songs_folder: Option<PathBuf>,
}

/// Resolved player configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerConfig {
    /// Folder holding one sub-folder per song
    pub songs_folder: PathBuf,
    /// Default log filter level when `RUST_LOG` is unset
    pub log_level: String,
    /// Interval between dispatch ticks while playing
    pub tick_interval: Duration,
    /// Notification channel capacity
    pub event_bus_capacity: usize,
}

impl PlayerConfig {
    /// Load the TOML file at `config_path` (defaults if missing) and apply overrides
    pub fn load(config_path: &Path, overrides: &ConfigOverrides) -> Result<Self> {
        let toml_config = TomlConfig::load_or_default(config_path)?;
        Ok(Self::resolve(&toml_config, overrides, &SongsFolderResolver::new()))
    }

    /// Combine a parsed TOML config with overrides
    pub fn resolve(
        toml_config: &TomlConfig,
        overrides: &ConfigOverrides,
        resolver: &SongsFolderResolver,
    ) -> Self {
        let songs_folder = resolver.resolve(overrides.songs_folder.as_deref(), toml_config);
        info!("Songs folder: {}", songs_folder.display());

        Self {
            songs_folder,
            log_level: toml_config.logging.level.clone(),
            tick_interval: Duration::from_millis(toml_config.playback.tick_interval_ms),
            event_bus_capacity: toml_config.playback.event_bus_capacity,
        }
    }

    pub fn tick_mode(&self) -> TickMode {
        TickMode::Interval(self.tick_interval)
    }

    pub fn processor_settings(&self) -> ProcessorSettings {
        ProcessorSettings {
            tick_mode: self.tick_mode(),
        }
    }
}
