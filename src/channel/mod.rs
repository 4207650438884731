//! Remote Channel Access
//!
//! Devices never talk to the control system directly. They hold a
//! [`ChannelClient`], which forwards reads and writes to a [`ChannelBackend`]
//! and bounds each operation with the configured timeout.
//!
//! # Backends
//!
//! - [`MockChannelBackend`] - in-memory channels for tests and offline use
//!
//! Any real control-system client plugs in by implementing [`ChannelBackend`].
//!
//! # Example
//!
//! ```rust,ignore
//! let backend = Arc::new(MockChannelBackend::new());
//! backend.seed("XPP:SB2:PP:Y", ChannelValue::text("OUT")).await;
//!
//! let client = ChannelClient::new(backend, Duration::from_secs(1));
//! client.put("XPP:SB2:PP:Y", ChannelValue::text("IN")).await?;
//! ```

pub mod mock;
pub mod template;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

use crate::error::ChannelError;

pub use mock::MockChannelBackend;
pub use template::{ChannelParams, ChannelTemplate};

// =============================================================================
// ChannelValue
// =============================================================================

/// A value carried by a remote channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChannelValue {
    /// String or enum label.
    Text(String),
    /// Integer, including raw enum indices.
    Int(i64),
    /// Floating point.
    Float(f64),
    /// Char waveform, NUL terminated.
    Bytes(Vec<u8>),
}

impl ChannelValue {
    /// Shorthand for a text value.
    pub fn text(value: impl Into<String>) -> Self {
        ChannelValue::Text(value.into())
    }

    /// Name of the variant, used in type mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            ChannelValue::Text(_) => "text",
            ChannelValue::Int(_) => "int",
            ChannelValue::Float(_) => "float",
            ChannelValue::Bytes(_) => "bytes",
        }
    }

    /// Decode the value as a string.
    ///
    /// Char waveforms are cut at the first NUL. Numbers are formatted.
    pub fn to_text(&self) -> String {
        match self {
            ChannelValue::Text(s) => s.clone(),
            ChannelValue::Int(i) => i.to_string(),
            ChannelValue::Float(f) => f.to_string(),
            ChannelValue::Bytes(bytes) => {
                let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
                String::from_utf8_lossy(&bytes[..end]).into_owned()
            }
        }
    }
}

impl fmt::Display for ChannelValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<&str> for ChannelValue {
    fn from(value: &str) -> Self {
        ChannelValue::Text(value.to_string())
    }
}

impl From<String> for ChannelValue {
    fn from(value: String) -> Self {
        ChannelValue::Text(value)
    }
}

impl From<i64> for ChannelValue {
    fn from(value: i64) -> Self {
        ChannelValue::Int(value)
    }
}

impl From<f64> for ChannelValue {
    fn from(value: f64) -> Self {
        ChannelValue::Float(value)
    }
}

// =============================================================================
// ChannelBackend
// =============================================================================

/// Connection to the control system that serves named channels.
///
/// Ordering and serialization of concurrent puts is up to the implementation.
#[async_trait]
pub trait ChannelBackend: Send + Sync {
    /// Read the current value of `channel`.
    async fn get(&self, channel: &str) -> Result<ChannelValue, ChannelError>;

    /// Write `value` to `channel`.
    async fn put(&self, channel: &str, value: ChannelValue) -> Result<(), ChannelError>;
}

// =============================================================================
// ChannelClient
// =============================================================================

/// Shared handle to a backend with a per-operation timeout.
#[derive(Clone)]
pub struct ChannelClient {
    backend: Arc<dyn ChannelBackend>,
    timeout: Duration,
}

impl fmt::Debug for ChannelClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelClient")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ChannelClient {
    /// Default per-operation timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

    /// Client bound to `backend` with a per-operation `timeout`.
    pub fn new(backend: Arc<dyn ChannelBackend>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    /// Client with [`Self::DEFAULT_TIMEOUT`].
    pub fn with_default_timeout(backend: Arc<dyn ChannelBackend>) -> Self {
        Self::new(backend, Self::DEFAULT_TIMEOUT)
    }

    /// Per-operation timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Read `channel`, failing with [`ChannelError::Timeout`] on expiry.
    pub async fn get(&self, channel: &str) -> Result<ChannelValue, ChannelError> {
        debug!(channel, "channel get");
        timeout(self.timeout, self.backend.get(channel))
            .await
            .map_err(|_| self.timed_out(channel))?
    }

    /// Write `value` to `channel`, failing with [`ChannelError::Timeout`] on expiry.
    pub async fn put(&self, channel: &str, value: ChannelValue) -> Result<(), ChannelError> {
        debug!(channel, value = %value, "channel put");
        timeout(self.timeout, self.backend.put(channel, value))
            .await
            .map_err(|_| self.timed_out(channel))?
    }

    fn timed_out(&self, channel: &str) -> ChannelError {
        ChannelError::Timeout {
            channel: channel.to_string(),
            timeout_ms: self.timeout.as_millis() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StalledBackend;

    #[async_trait]
    impl ChannelBackend for StalledBackend {
        async fn get(&self, _channel: &str) -> Result<ChannelValue, ChannelError> {
            futures::future::pending().await
        }

        async fn put(&self, _channel: &str, _value: ChannelValue) -> Result<(), ChannelError> {
            futures::future::pending().await
        }
    }

    #[test]
    fn test_to_text_decodes_char_waveform() {
        let value = ChannelValue::Bytes(b"Pulse Picker\0\0\0".to_vec());
        assert_eq!(value.to_text(), "Pulse Picker");
        assert_eq!(ChannelValue::Int(3).to_text(), "3");
    }

    #[tokio::test]
    async fn test_client_times_out() {
        let client = ChannelClient::new(Arc::new(StalledBackend), Duration::from_millis(20));

        let err = client.get("XPP:SB2:PP:Y").await.unwrap_err();
        assert_eq!(
            err,
            ChannelError::Timeout {
                channel: "XPP:SB2:PP:Y".to_string(),
                timeout_ms: 20,
            }
        );

        let err = client
            .put("XPP:SB2:PP:Y", ChannelValue::text("IN"))
            .await
            .unwrap_err();
        assert!(matches!(err, ChannelError::Timeout { .. }));
    }
}
