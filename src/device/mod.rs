//! Device Runtime
//!
//! Shared plumbing for every device: prefix and name storage, selection of the
//! attributes included in `read()`, and the IOC administration handle.
//!
//! Concrete devices live in submodules:
//! - [`pulse_picker`] - pulse picker variants (standard, CCM, pink)
//! - [`ioc_admin`] - IOC administration sub-device

pub mod ioc_admin;
pub mod pulse_picker;

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::channel::ChannelValue;
use crate::error::DeviceError;
use crate::signal::SignalDescription;

pub use ioc_admin::{IocAdmin, IocAdminLayout};
pub use pulse_picker::{
    AnyPulsePicker, Ccm, CcmPosition, Pink, PickerCommand, PickerVariant, PulsePicker,
    PulsePickerBuilder, PulsePickerCcm, PulsePickerPink, PulsePickerStandard, Standard,
};

// =============================================================================
// Attribute
// =============================================================================

/// Named signal of a pulse picker that can be selected for `read()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    Mode,
    Blade,
    InOut,
}

impl Attribute {
    /// Default read selection: mode, blade, in_out.
    pub const DEFAULT_READ: [Attribute; 3] = [Attribute::Mode, Attribute::Blade, Attribute::InOut];

    pub fn as_str(self) -> &'static str {
        match self {
            Attribute::Mode => "mode",
            Attribute::Blade => "blade",
            Attribute::InOut => "in_out",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Attribute {
    type Err = DeviceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mode" => Ok(Attribute::Mode),
            "blade" => Ok(Attribute::Blade),
            "in_out" => Ok(Attribute::InOut),
            other => Err(DeviceError::Construction(format!(
                "unknown read attribute '{other}'"
            ))),
        }
    }
}

// =============================================================================
// Reading / Description
// =============================================================================

/// Ordered result of a device `read()`, keyed `"{name}_{attr}"`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Reading {
    entries: Vec<(String, ChannelValue)>,
}

impl Reading {
    pub(crate) fn push(&mut self, key: String, value: ChannelValue) {
        self.entries.push((key, value));
    }

    pub fn get(&self, key: &str) -> Option<&ChannelValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Ordered signal descriptions, keyed like [`Reading`].
pub type Description = Vec<(String, SignalDescription)>;

// =============================================================================
// DeviceBase
// =============================================================================

/// Construction state common to all devices.
#[derive(Debug, Clone)]
pub struct DeviceBase {
    prefix: String,
    name: String,
    read_attrs: Vec<Attribute>,
    ioc: Option<IocAdmin>,
}

impl DeviceBase {
    /// `read_attrs` of `None` selects [`Attribute::DEFAULT_READ`].
    pub fn new(
        prefix: impl Into<String>,
        name: impl Into<String>,
        read_attrs: Option<Vec<Attribute>>,
        ioc: Option<IocAdmin>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            name: name.into(),
            read_attrs: read_attrs.unwrap_or_else(|| Attribute::DEFAULT_READ.to_vec()),
            ioc,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn read_attrs(&self) -> &[Attribute] {
        &self.read_attrs
    }

    pub fn ioc(&self) -> Option<&IocAdmin> {
        self.ioc.as_ref()
    }

    /// Key under which `attr` appears in readings and descriptions.
    pub fn key(&self, attr: Attribute) -> String {
        format!("{}_{}", self.name, attr)
    }
}
