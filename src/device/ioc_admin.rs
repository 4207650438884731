//! IOC administration sub-device.
//!
//! Every IOC publishes a small set of housekeeping records under its own
//! prefix. Older IOCs use a different record layout, so the handle is built
//! from an [`IocAdminLayout`]. Pulse pickers are served by legacy IOCs.

use serde::{Deserialize, Serialize};

use crate::channel::{ChannelClient, ChannelValue};
use crate::error::DeviceResult;
use crate::signal::TelemetrySignal;

/// Record layout of an IOC's administration channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IocAdminLayout {
    /// Current record layout.
    #[default]
    Current,
    /// Record layout of older IOCs.
    Legacy,
}

struct Suffixes {
    heartbeat: &'static str,
    hostname: &'static str,
    start_tod: &'static str,
    clock: &'static str,
    sysreset: &'static str,
}

impl IocAdminLayout {
    fn suffixes(self) -> Suffixes {
        match self {
            IocAdminLayout::Current => Suffixes {
                heartbeat: ":HEARTBEAT",
                hostname: ":HOSTNAME",
                start_tod: ":STARTTOD",
                clock: ":UPTIME",
                sysreset: ":SYSRESET",
            },
            IocAdminLayout::Legacy => Suffixes {
                heartbeat: ":HEARTBEATCNT",
                hostname: ":HOSTNAME",
                start_tod: ":STARTTOD",
                clock: ":TOD",
                sysreset: ":SYSRESET",
            },
        }
    }
}

/// Housekeeping channels of one IOC.
#[derive(Debug, Clone)]
pub struct IocAdmin {
    prefix: String,
    layout: IocAdminLayout,
    heartbeat: TelemetrySignal,
    hostname: TelemetrySignal,
    start_tod: TelemetrySignal,
    clock: TelemetrySignal,
    sysreset: String,
    client: ChannelClient,
}

impl IocAdmin {
    /// Bind the administration channels under `prefix` using `layout`.
    pub fn new(prefix: impl Into<String>, layout: IocAdminLayout, client: ChannelClient) -> Self {
        let prefix = prefix.into();
        let s = layout.suffixes();
        Self {
            heartbeat: TelemetrySignal::new(format!("{prefix}{}", s.heartbeat), false, client.clone()),
            hostname: TelemetrySignal::new(format!("{prefix}{}", s.hostname), true, client.clone()),
            start_tod: TelemetrySignal::new(format!("{prefix}{}", s.start_tod), true, client.clone()),
            clock: TelemetrySignal::new(format!("{prefix}{}", s.clock), true, client.clone()),
            sysreset: format!("{prefix}{}", s.sysreset),
            prefix,
            layout,
            client,
        }
    }

    /// IOC prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Record layout in use.
    pub fn layout(&self) -> IocAdminLayout {
        self.layout
    }

    /// Heartbeat counter.
    pub async fn heartbeat(&self) -> DeviceResult<ChannelValue> {
        self.heartbeat.get().await
    }

    /// Host the IOC runs on.
    pub async fn hostname(&self) -> DeviceResult<String> {
        self.hostname.get_text().await
    }

    /// Time the IOC was started.
    pub async fn start_tod(&self) -> DeviceResult<String> {
        self.start_tod.get_text().await
    }

    /// Uptime on current IOCs, time of day on legacy ones.
    pub async fn clock(&self) -> DeviceResult<String> {
        self.clock.get_text().await
    }

    /// Request a soft reboot of the IOC.
    pub async fn sysreset(&self) -> DeviceResult<()> {
        tracing::warn!(ioc = %self.prefix, "requesting IOC sysreset");
        self.client.put(&self.sysreset, ChannelValue::Int(1)).await?;
        Ok(())
    }
}
