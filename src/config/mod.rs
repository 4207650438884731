//! Configuration System
//!
//! Configuration is loaded with Figment from (in order of precedence):
//! 1. Environment variables prefixed with `BEAMLINE_`
//! 2. TOML configuration file (default: `config/beamline.toml`)
//!
//! # Example
//!
//! ```no_run
//! use beamline_devices::config::BeamlineConfig;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BeamlineConfig::load_from("config/beamline.toml")?;
//!     println!("Pulse pickers: {}", config.pulse_pickers.len());
//!     Ok(())
//! }
//! ```
//!
//! # Environment Variables
//!
//! Nested keys are separated by a double underscore:
//!
//! ```text
//! BEAMLINE_APPLICATION__LOG_LEVEL=debug
//! BEAMLINE_CHANNEL__TIMEOUT_MS=500
//! ```

pub mod beamline_config;

pub use beamline_config::{
    ApplicationConfig, BeamlineConfig, ChannelSettings, ConfigError, PickerKind,
    PulsePickerConfig,
};
