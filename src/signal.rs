//! Typed Signals
//!
//! Signals are live proxies to one remote channel. They hold no cached value:
//! every `get` goes to the control system.
//!
//! - [`EnumSignal<D>`] - read/write position signal whose value domain is the
//!   state enum `D`. Substituting the domain never changes how the channel
//!   name was resolved.
//! - [`TelemetrySignal`] - read-only status signal, optionally decoded as a
//!   string.

use serde::Serialize;
use std::marker::PhantomData;
use tracing::debug;

use crate::channel::{ChannelClient, ChannelValue};
use crate::device::IocAdmin;
use crate::error::{ChannelError, DeviceError, DeviceResult};
use crate::state::StateDomain;

/// Static description of a signal, as reported by `describe()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignalDescription {
    /// Fully resolved source channel.
    pub source: String,
    /// `"enum"`, `"string"` or `"number"`.
    pub dtype: &'static str,
    /// Allowed labels for enum signals, empty otherwise.
    pub enum_strs: Vec<&'static str>,
    /// Per-state sub-record channels for enum signals, in domain order.
    pub state_sources: Vec<String>,
    /// Whether the signal has no write path.
    pub read_only: bool,
}

// =============================================================================
// EnumSignal<D>
// =============================================================================

/// Read/write position signal over the state domain `D`.
#[derive(Debug, Clone)]
pub struct EnumSignal<D: StateDomain> {
    channel: String,
    ioc: Option<IocAdmin>,
    client: ChannelClient,
    _domain: PhantomData<D>,
}

impl<D: StateDomain> EnumSignal<D> {
    /// Bind to an already-resolved channel name.
    pub fn new(channel: impl Into<String>, ioc: Option<IocAdmin>, client: ChannelClient) -> Self {
        Self {
            channel: channel.into(),
            ioc,
            client,
            _domain: PhantomData,
        }
    }

    /// Resolved position channel.
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Administration handle of the IOC serving the states record, if one
    /// was configured.
    pub fn ioc(&self) -> Option<&IocAdmin> {
        self.ioc.as_ref()
    }

    /// Channel of the per-state sub-record for `state`.
    pub fn state_channel(&self, state: D) -> String {
        format!("{}{}", self.channel, state.suffix())
    }

    /// Per-state sub-record channels, in domain order.
    pub fn state_channels(&self) -> Vec<String> {
        D::members()
            .iter()
            .map(|state| self.state_channel(*state))
            .collect()
    }

    /// Read the current position.
    ///
    /// Accepts either a label or an enum index from the remote side. Values
    /// outside `D` are reported as [`DeviceError::InvalidState`].
    pub async fn get(&self) -> DeviceResult<D> {
        let raw = self.client.get(&self.channel).await?;
        let state = match &raw {
            ChannelValue::Text(label) => D::from_label(label),
            ChannelValue::Int(index) => usize::try_from(*index)
                .ok()
                .and_then(|i| D::members().get(i))
                .copied(),
            other => {
                return Err(ChannelError::TypeMismatch {
                    channel: self.channel.clone(),
                    expected: "enum",
                    found: other.kind(),
                }
                .into())
            }
        };
        debug!(channel = %self.channel, value = %raw, "position read");
        state.ok_or_else(|| DeviceError::InvalidState {
            label: raw.to_text(),
            domain: D::NAME,
        })
    }

    /// Command a new position. Returns once the remote write is accepted.
    pub async fn put(&self, state: D) -> DeviceResult<()> {
        self.client
            .put(&self.channel, ChannelValue::text(state.label()))
            .await?;
        Ok(())
    }

    /// Command a position by label, checking membership before writing.
    pub async fn put_label(&self, label: &str) -> DeviceResult<D> {
        let state = D::from_label(label).ok_or_else(|| DeviceError::InvalidState {
            label: label.to_string(),
            domain: D::NAME,
        })?;
        self.put(state).await?;
        Ok(state)
    }

    /// Static description, including the per-state sub-record channels.
    pub fn describe(&self) -> SignalDescription {
        SignalDescription {
            source: self.channel.clone(),
            dtype: "enum",
            enum_strs: D::enum_strs(),
            state_sources: self.state_channels(),
            read_only: false,
        }
    }
}

// =============================================================================
// TelemetrySignal
// =============================================================================

/// Read-only status signal.
#[derive(Debug, Clone)]
pub struct TelemetrySignal {
    channel: String,
    string: bool,
    client: ChannelClient,
}

impl TelemetrySignal {
    /// `string` decodes whatever the channel returns as text.
    pub fn new(channel: impl Into<String>, string: bool, client: ChannelClient) -> Self {
        Self {
            channel: channel.into(),
            string,
            client,
        }
    }

    /// Resolved status channel.
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Whether reads are decoded as text.
    pub fn is_string(&self) -> bool {
        self.string
    }

    /// Read the current value, decoded according to the `string` flag.
    pub async fn get(&self) -> DeviceResult<ChannelValue> {
        let raw = self.client.get(&self.channel).await?;
        Ok(if self.string {
            ChannelValue::Text(raw.to_text())
        } else {
            raw
        })
    }

    /// Read and decode as text regardless of the `string` flag.
    pub async fn get_text(&self) -> DeviceResult<String> {
        Ok(self.client.get(&self.channel).await?.to_text())
    }

    /// Static description.
    pub fn describe(&self) -> SignalDescription {
        SignalDescription {
            source: self.channel.clone(),
            dtype: if self.string { "string" } else { "number" },
            enum_strs: Vec::new(),
            state_sources: Vec::new(),
            read_only: true,
        }
    }
}
