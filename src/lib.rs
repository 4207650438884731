//! Device abstractions for beamline pulse pickers.
//!
//! A pulse picker selects which beam pulses reach the sample. This crate
//! binds the device's status and position channels to a remote control
//! system and exposes a typed command surface for each device variant.
//!
//! - [`state`] - position state domains (IN/OUT, IN/OUT/CCM, PINK/CCM/OUT)
//! - [`channel`] - remote channel access, name templates, mock backend
//! - [`signal`] - typed read/write and read-only signals
//! - [`device`] - device runtime, IOC administration, pulse pickers
//! - [`config`] - Figment configuration
//! - [`logging`] - tracing setup

pub mod channel;
pub mod config;
pub mod device;
pub mod error;
pub mod logging;
pub mod signal;
pub mod state;

pub use error::{ChannelError, DeviceError, DeviceResult};
