//! Tracing setup
//!
//! Logging is installed before configuration is read, with an `info` filter
//! (or `RUST_LOG` when set). Once the configured level is known it replaces
//! the bootstrap filter unless `RUST_LOG` was given.

use tracing_subscriber::{
    layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry,
};

use crate::{Error, Result};

const BOOTSTRAP_LEVEL: &str = "info";

/// Filter enabling this workspace's crates at `level`
pub fn default_filter(level: &str) -> EnvFilter {
    EnvFilter::new(format!("kara_player={level},kara_common={level}"))
}

/// Handle for applying the configured log level after startup
pub struct LogLevelHandle {
    handle: reload::Handle<EnvFilter, Registry>,
    from_env: bool,
}

impl LogLevelHandle {
    /// Replace the bootstrap filter with one at `level`
    ///
    /// No-op when the filter came from `RUST_LOG`.
    pub fn apply_level(&self, level: &str) -> Result<()> {
        if self.from_env {
            return Ok(());
        }
        self.handle
            .reload(default_filter(level))
            .map_err(|e| Error::Internal(format!("Failed to apply log level {}: {}", level, e)))
    }
}

/// Reloadable filter layer seeded from `RUST_LOG` or the bootstrap level
fn filter_layer() -> (reload::Layer<EnvFilter, Registry>, LogLevelHandle) {
    let env_filter = EnvFilter::try_from_default_env().ok();
    let from_env = env_filter.is_some();
    let (layer, handle) =
        reload::Layer::new(env_filter.unwrap_or_else(|| default_filter(BOOTSTRAP_LEVEL)));
    (layer, LogLevelHandle { handle, from_env })
}

/// Install the global subscriber
pub fn init_tracing() -> LogLevelHandle {
    let (filter, handle) = filter_layer();
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
    handle
}
