//! Tracing setup.
//!
//! Installs a `tracing-subscriber` fmt subscriber. `RUST_LOG` takes precedence
//! over the configured level, so per-module filters keep working:
//!
//! ```text
//! RUST_LOG=beamline_devices::device=debug
//! ```

use tracing_subscriber::EnvFilter;

use crate::config::{BeamlineConfig, ConfigError};

/// Install the global subscriber at `level`.
///
/// Fails if `level` is not a valid filter or a subscriber is already set.
pub fn init(level: &str) -> Result<(), ConfigError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level).map_err(|err| {
            ConfigError::ValidationError(format!("invalid log level '{level}': {err}"))
        })?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|err| ConfigError::ValidationError(format!("tracing already initialized: {err}")))
}

/// Install the global subscriber using `application.log_level`.
pub fn init_from_config(config: &BeamlineConfig) -> Result<(), ConfigError> {
    init(&config.application.log_level)
}
