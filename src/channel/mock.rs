//! Mock Channel Backend
//!
//! In-memory stand-in for the control system. Used by tests and for running
//! devices without a live IOC.
//!
//! - Channels are seeded with an initial value before use
//! - A channel can declare enum choices; writes outside them are rejected the
//!   way the remote record would reject them
//! - Channels can be disconnected to exercise communication failures
//! - Every accepted put is appended to a write log

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::trace;

use super::{ChannelBackend, ChannelValue};
use crate::error::ChannelError;

#[derive(Debug, Clone)]
struct MockChannel {
    value: ChannelValue,
    choices: Option<Vec<String>>,
}

#[derive(Debug, Default)]
struct MockState {
    channels: HashMap<String, MockChannel>,
    disconnected: HashSet<String>,
    writes: Vec<(String, ChannelValue)>,
}

/// Simulated control system with thread-safe channel storage.
///
/// # Example
///
/// ```rust,ignore
/// let backend = MockChannelBackend::new();
/// backend.seed_enum("XPP:SB2:PP:Y", &["IN", "OUT"], "OUT").await;
/// backend.put("XPP:SB2:PP:Y", ChannelValue::text("IN")).await?;
/// assert_eq!(backend.writes().await.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockChannelBackend {
    state: Arc<RwLock<MockState>>,
}

impl MockChannelBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or overwrite a channel with no enum restriction.
    pub async fn seed(&self, channel: &str, value: impl Into<ChannelValue>) {
        let mut state = self.state.write().await;
        state.channels.insert(
            channel.to_string(),
            MockChannel {
                value: value.into(),
                choices: None,
            },
        );
    }

    /// Create or overwrite an enum channel that only accepts `choices`.
    pub async fn seed_enum(&self, channel: &str, choices: &[&str], initial: &str) {
        let mut state = self.state.write().await;
        state.channels.insert(
            channel.to_string(),
            MockChannel {
                value: ChannelValue::text(initial),
                choices: Some(choices.iter().map(|c| c.to_string()).collect()),
            },
        );
    }

    /// Drop the connection to `channel`. Reads and writes fail until
    /// [`Self::reconnect`] is called.
    pub async fn disconnect(&self, channel: &str) {
        self.state
            .write()
            .await
            .disconnected
            .insert(channel.to_string());
    }

    pub async fn reconnect(&self, channel: &str) {
        self.state.write().await.disconnected.remove(channel);
    }

    /// Current value without going through the channel checks.
    pub async fn peek(&self, channel: &str) -> Option<ChannelValue> {
        self.state
            .read()
            .await
            .channels
            .get(channel)
            .map(|c| c.value.clone())
    }

    /// All accepted writes, oldest first.
    pub async fn writes(&self) -> Vec<(String, ChannelValue)> {
        self.state.read().await.writes.clone()
    }

    fn check_connected(state: &MockState, channel: &str) -> Result<(), ChannelError> {
        if state.disconnected.contains(channel) {
            return Err(ChannelError::Disconnected(channel.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ChannelBackend for MockChannelBackend {
    async fn get(&self, channel: &str) -> Result<ChannelValue, ChannelError> {
        let state = self.state.read().await;
        Self::check_connected(&state, channel)?;
        state
            .channels
            .get(channel)
            .map(|c| c.value.clone())
            .ok_or_else(|| ChannelError::UnknownChannel(channel.to_string()))
    }

    async fn put(&self, channel: &str, value: ChannelValue) -> Result<(), ChannelError> {
        let mut state = self.state.write().await;
        Self::check_connected(&state, channel)?;
        let entry = state
            .channels
            .get_mut(channel)
            .ok_or_else(|| ChannelError::UnknownChannel(channel.to_string()))?;

        let value = match &entry.choices {
            Some(choices) => {
                let label = match &value {
                    ChannelValue::Text(label) => label.clone(),
                    // Enum records also accept the choice index
                    ChannelValue::Int(index) => usize::try_from(*index)
                        .ok()
                        .and_then(|i| choices.get(i))
                        .cloned()
                        .ok_or_else(|| ChannelError::Rejected {
                            channel: channel.to_string(),
                            reason: format!("enum index {index} out of range"),
                        })?,
                    other => {
                        return Err(ChannelError::TypeMismatch {
                            channel: channel.to_string(),
                            expected: "text",
                            found: other.kind(),
                        })
                    }
                };
                if !choices.contains(&label) {
                    return Err(ChannelError::Rejected {
                        channel: channel.to_string(),
                        reason: format!("'{label}' is not one of {choices:?}"),
                    });
                }
                ChannelValue::Text(label)
            }
            None => value,
        };

        trace!(channel, value = %value, "mock put accepted");
        entry.value = value.clone();
        state.writes.push((channel.to_string(), value));
        Ok(())
    }
}
