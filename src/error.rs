//! Error types for beamline devices.
//!
//! `DeviceError` is the single error type returned by every device operation.
//! It mirrors the three failure families a device can hit:
//!
//! - **`InvalidState`**: a label outside the active state domain was read back
//!   from, or about to be written to, a position channel.
//! - **`Channel`**: the remote control system could not be reached, timed out,
//!   or rejected a write. Wraps [`ChannelError`].
//! - **`Construction`**: naming parameters were missing or malformed, or a
//!   variant's command table does not cover its state domain.
//!
//! Nothing in this crate catches or retries these; they propagate to the caller
//! of the triggering method with `?`.

use thiserror::Error;

use crate::config::ConfigError;

/// Convenience alias for results using the device error type.
pub type DeviceResult<T> = std::result::Result<T, DeviceError>;

/// Errors raised by the remote channel collaborator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChannelError {
    /// The channel exists but its connection is down.
    #[error("Channel '{0}' is not connected")]
    Disconnected(String),

    /// No channel of this name is served.
    #[error("Channel '{0}' does not exist")]
    UnknownChannel(String),

    /// The remote record refused the written value.
    #[error("Channel '{channel}' rejected write: {reason}")]
    Rejected {
        /// Channel that refused the write.
        channel: String,
        /// Reason reported by the remote side.
        reason: String,
    },

    /// The operation did not complete within the client timeout.
    #[error("Channel '{channel}' timed out after {timeout_ms}ms")]
    Timeout {
        /// Channel that did not answer.
        channel: String,
        /// Timeout that expired.
        timeout_ms: u64,
    },

    /// The channel returned a value of the wrong kind.
    #[error("Channel '{channel}' returned {found}, expected {expected}")]
    TypeMismatch {
        /// Channel that was read.
        channel: String,
        /// Kind of value the caller needed.
        expected: &'static str,
        /// Kind of value the channel returned.
        found: &'static str,
    },
}

/// Errors raised by device operations.
#[derive(Error, Debug)]
pub enum DeviceError {
    /// A label outside the active state domain was read or requested.
    #[error("Invalid state '{label}' for {domain}")]
    InvalidState {
        /// Offending label.
        label: String,
        /// Name of the active state domain.
        domain: &'static str,
    },

    /// Remote communication failed.
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Naming parameters were missing or malformed.
    #[error("Construction error: {0}")]
    Construction(String),

    /// The device variant has no target state for the command.
    #[error("Device '{device}' does not support command '{command}'")]
    UnsupportedCommand {
        /// Command that was issued.
        command: String,
        /// Name of the device.
        device: String,
    },

    /// Configuration could not be used to build a device.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
