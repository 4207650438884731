//! Pulse Picker Devices
//!
//! A pulse picker selects which beam pulses reach the sample. It exposes two
//! read-only status signals and one commandable position:
//!
//! | Attribute | Channel                 | Access     |
//! |-----------|-------------------------|------------|
//! | `blade`   | `{prefix}:READ_DF`      | read-only  |
//! | `mode`    | `{prefix}:SE`           | read-only  |
//! | `in_out`  | `{in_out}` (templated)  | read/write |
//!
//! # Variants
//!
//! The position domain and the command table are supplied by a
//! [`PickerVariant`] type parameter. The channel wiring is identical for all
//! variants.
//!
//! | Variant    | Domain          | move_in | move_out | move_ccm |
//! |------------|-----------------|---------|----------|----------|
//! | `Standard` | `InOutState`    | IN      | OUT      | -        |
//! | `Ccm`      | `InOutCcmState` | IN      | OUT      | CCM      |
//! | `Pink`     | `PinkState`     | PINK    | OUT      | CCM      |
//!
//! `Pink` is flagged provisional: its labels follow an IOC naming scheme that
//! is expected to change.
//!
//! # Example
//!
//! ```rust,ignore
//! let picker = PulsePickerCcm::builder("XPP:SB2:MMS:29")
//!     .in_out("XPP:SB2:PP:Y")
//!     .in_out_ioc("IOC:XPP:SB2:PP")
//!     .name("xpp_pp")
//!     .build(client)?;
//!
//! picker.move_ccm().await?;
//! assert_eq!(picker.position().await?, InOutCcmState::Ccm);
//! ```

use futures::future::try_join_all;
use std::fmt;
use std::marker::PhantomData;
use tracing::{debug, info, warn};

use super::{Attribute, Description, DeviceBase, IocAdmin, IocAdminLayout, Reading};
use crate::channel::{ChannelClient, ChannelParams, ChannelTemplate, ChannelValue};
use crate::error::{DeviceError, DeviceResult};
use crate::signal::{EnumSignal, TelemetrySignal};
use crate::state::{InOutCcmState, InOutState, PinkState, StateDomain};

const IN_OUT_TEMPLATE: &str = "{in_out}";
const IN_OUT_IOC_TEMPLATE: &str = "{in_out_ioc}";
const IOC_TEMPLATE: &str = "{ioc}";
const BLADE_SUFFIX: &str = ":READ_DF";
const MODE_SUFFIX: &str = ":SE";

// =============================================================================
// Commands and variants
// =============================================================================

/// Position commands a pulse picker may accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PickerCommand {
    MoveIn,
    MoveOut,
    MoveCcm,
}

impl PickerCommand {
    pub const ALL: [PickerCommand; 3] = [
        PickerCommand::MoveIn,
        PickerCommand::MoveOut,
        PickerCommand::MoveCcm,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PickerCommand::MoveIn => "move_in",
            PickerCommand::MoveOut => "move_out",
            PickerCommand::MoveCcm => "move_ccm",
        }
    }
}

impl fmt::Display for PickerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position domain and command table of one pulse picker variant.
///
/// `target` is the complete command mapping: a command returning `None` is
/// not supported by the variant. Every member of `State` must be the target
/// of at least one command; [`PulsePickerBuilder::build`] rejects variants
/// where it is not.
pub trait PickerVariant: Send + Sync + 'static {
    type State: StateDomain;

    /// Short name used in configuration and logs.
    const KIND: &'static str;

    /// Labels follow a naming scheme that is expected to change.
    const PROVISIONAL: bool = false;

    fn target(command: PickerCommand) -> Option<Self::State>;
}

/// Variants with a CCM position, which enables [`PulsePicker::move_ccm`].
pub trait CcmPosition: PickerVariant {}

/// IN/OUT pulse picker.
#[derive(Debug, Clone, Copy)]
pub struct Standard;

impl PickerVariant for Standard {
    type State = InOutState;
    const KIND: &'static str = "standard";

    fn target(command: PickerCommand) -> Option<InOutState> {
        match command {
            PickerCommand::MoveIn => Some(InOutState::In),
            PickerCommand::MoveOut => Some(InOutState::Out),
            PickerCommand::MoveCcm => None,
        }
    }
}

/// IN/OUT/CCM pulse picker.
#[derive(Debug, Clone, Copy)]
pub struct Ccm;

impl PickerVariant for Ccm {
    type State = InOutCcmState;
    const KIND: &'static str = "ccm";

    fn target(command: PickerCommand) -> Option<InOutCcmState> {
        match command {
            PickerCommand::MoveIn => Some(InOutCcmState::In),
            PickerCommand::MoveOut => Some(InOutCcmState::Out),
            PickerCommand::MoveCcm => Some(InOutCcmState::Ccm),
        }
    }
}

impl CcmPosition for Ccm {}

/// PINK/CCM/OUT pulse picker. `move_in` commands PINK.
#[derive(Debug, Clone, Copy)]
pub struct Pink;

impl PickerVariant for Pink {
    type State = PinkState;
    const KIND: &'static str = "pink";
    const PROVISIONAL: bool = true;

    fn target(command: PickerCommand) -> Option<PinkState> {
        match command {
            PickerCommand::MoveIn => Some(PinkState::Pink),
            PickerCommand::MoveOut => Some(PinkState::Out),
            PickerCommand::MoveCcm => Some(PinkState::Ccm),
        }
    }
}

impl CcmPosition for Pink {}

/// Check that every state of `V` is reachable by some command.
fn validate_command_table<V: PickerVariant>() -> DeviceResult<()> {
    let unreachable: Vec<&str> = <V::State as StateDomain>::members()
        .iter()
        .filter(|state| !PickerCommand::ALL.iter().any(|c| V::target(*c) == Some(**state)))
        .map(|state| state.label())
        .collect();
    if !unreachable.is_empty() {
        return Err(DeviceError::Construction(format!(
            "{} pulse picker has no command for {:?}",
            V::KIND,
            unreachable
        )));
    }
    Ok(())
}

// =============================================================================
// PulsePicker<V>
// =============================================================================

/// IN/OUT pulse picker.
pub type PulsePickerStandard = PulsePicker<Standard>;
/// Pulse picker with an additional CCM position.
pub type PulsePickerCcm = PulsePicker<Ccm>;
/// Pulse picker using the provisional PINK/CCM/OUT labels.
pub type PulsePickerPink = PulsePicker<Pink>;

/// A pulse picker whose position domain is chosen by `V`.
#[derive(Debug, Clone)]
pub struct PulsePicker<V: PickerVariant> {
    base: DeviceBase,
    params: ChannelParams,
    in_out: EnumSignal<V::State>,
    blade: TelemetrySignal,
    mode: TelemetrySignal,
    _variant: PhantomData<V>,
}

impl<V: PickerVariant> PulsePicker<V> {
    pub fn builder(prefix: impl Into<String>) -> PulsePickerBuilder<V> {
        PulsePickerBuilder::new(prefix)
    }

    pub fn name(&self) -> &str {
        self.base.name()
    }

    pub fn prefix(&self) -> &str {
        self.base.prefix()
    }

    pub fn kind(&self) -> &'static str {
        V::KIND
    }

    pub fn is_provisional(&self) -> bool {
        V::PROVISIONAL
    }

    pub fn read_attrs(&self) -> &[Attribute] {
        self.base.read_attrs()
    }

    /// Parameters the channel templates were resolved from.
    pub fn params(&self) -> &ChannelParams {
        &self.params
    }

    /// Resolved position channel.
    pub fn in_out_channel(&self) -> &str {
        self.in_out.channel()
    }

    pub fn in_out(&self) -> &EnumSignal<V::State> {
        &self.in_out
    }

    /// IOC administration handle, absent when no IOC prefix was given.
    pub fn ioc(&self) -> Option<&IocAdmin> {
        self.base.ioc()
    }

    /// Issue `command` and return the state that was written.
    pub async fn command(&self, command: PickerCommand) -> DeviceResult<V::State> {
        let state = V::target(command).ok_or_else(|| DeviceError::UnsupportedCommand {
            command: command.to_string(),
            device: self.base.name().to_string(),
        })?;
        info!(
            device = %self.base.name(),
            %command,
            state = state.label(),
            channel = %self.in_out.channel(),
            "commanding pulse picker"
        );
        self.in_out.put(state).await?;
        Ok(state)
    }

    pub async fn move_in(&self) -> DeviceResult<()> {
        self.command(PickerCommand::MoveIn).await.map(|_| ())
    }

    pub async fn move_out(&self) -> DeviceResult<()> {
        self.command(PickerCommand::MoveOut).await.map(|_| ())
    }

    /// Current position as reported by the remote channel.
    pub async fn position(&self) -> DeviceResult<V::State> {
        self.in_out.get().await
    }

    pub async fn blade(&self) -> DeviceResult<String> {
        Ok(self.blade.get().await?.to_text())
    }

    pub async fn mode(&self) -> DeviceResult<String> {
        Ok(self.mode.get().await?.to_text())
    }

    async fn read_attr(&self, attr: Attribute) -> DeviceResult<(String, ChannelValue)> {
        let value = match attr {
            Attribute::Mode => self.mode.get().await?,
            Attribute::Blade => self.blade.get().await?,
            Attribute::InOut => ChannelValue::text(self.in_out.get().await?.label()),
        };
        Ok((self.base.key(attr), value))
    }

    /// Read the selected attributes concurrently. Fails on the first error.
    pub async fn read(&self) -> DeviceResult<Reading> {
        let values = try_join_all(self.base.read_attrs().iter().map(|a| self.read_attr(*a))).await?;
        let mut reading = Reading::default();
        for (key, value) in values {
            reading.push(key, value);
        }
        debug!(device = %self.base.name(), entries = reading.len(), "read complete");
        Ok(reading)
    }

    /// Describe the selected attributes.
    pub fn describe(&self) -> Description {
        self.base
            .read_attrs()
            .iter()
            .map(|attr| {
                let description = match attr {
                    Attribute::Mode => self.mode.describe(),
                    Attribute::Blade => self.blade.describe(),
                    Attribute::InOut => self.in_out.describe(),
                };
                (self.base.key(*attr), description)
            })
            .collect()
    }
}

impl<V: CcmPosition> PulsePicker<V> {
    pub async fn move_ccm(&self) -> DeviceResult<()> {
        self.command(PickerCommand::MoveCcm).await.map(|_| ())
    }
}

// =============================================================================
// PulsePickerBuilder<V>
// =============================================================================

/// Collects construction parameters for a [`PulsePicker`].
#[derive(Debug, Clone)]
pub struct PulsePickerBuilder<V: PickerVariant> {
    params: ChannelParams,
    read_attrs: Option<Vec<Attribute>>,
    _variant: PhantomData<V>,
}

impl<V: PickerVariant> PulsePickerBuilder<V> {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            params: ChannelParams {
                prefix: prefix.into(),
                ..ChannelParams::default()
            },
            read_attrs: None,
            _variant: PhantomData,
        }
    }

    /// Position channel name.
    pub fn in_out(mut self, in_out: impl Into<String>) -> Self {
        self.params.in_out = in_out.into();
        self
    }

    /// IOC serving the position channel.
    pub fn in_out_ioc(mut self, in_out_ioc: impl Into<String>) -> Self {
        self.params.in_out_ioc = in_out_ioc.into();
        self
    }

    /// IOC serving the blade and mode channels.
    pub fn ioc(mut self, ioc: impl Into<String>) -> Self {
        self.params.ioc = ioc.into();
        self
    }

    pub fn read_attrs(mut self, read_attrs: Vec<Attribute>) -> Self {
        self.read_attrs = Some(read_attrs);
        self
    }

    /// Display name. Defaults to the prefix.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.params.name = name.into();
        self
    }

    /// Resolve all channel templates and bind the signals to `client`.
    pub fn build(mut self, client: ChannelClient) -> DeviceResult<PulsePicker<V>> {
        validate_command_table::<V>()?;
        if self.params.name.is_empty() {
            self.params.name = self.params.prefix.clone();
        }

        let in_out = ChannelTemplate::new(IN_OUT_TEMPLATE).resolve(&self.params)?;
        // The states record is served by a current IOC; only the device IOC is legacy
        let in_out_ioc = ChannelTemplate::new(IN_OUT_IOC_TEMPLATE)
            .resolve_optional(&self.params)?
            .map(|prefix| IocAdmin::new(prefix, IocAdminLayout::Current, client.clone()));
        let blade = ChannelTemplate::suffix(BLADE_SUFFIX).resolve(&self.params)?;
        let mode = ChannelTemplate::suffix(MODE_SUFFIX).resolve(&self.params)?;
        let ioc = ChannelTemplate::new(IOC_TEMPLATE)
            .resolve_optional(&self.params)?
            .map(|prefix| IocAdmin::new(prefix, IocAdminLayout::Legacy, client.clone()));

        debug!(
            device = %self.params.name,
            kind = V::KIND,
            %in_out,
            %blade,
            %mode,
            "resolved pulse picker channels"
        );
        if V::PROVISIONAL {
            warn!(
                device = %self.params.name,
                kind = V::KIND,
                labels = ?<V::State as StateDomain>::enum_strs(),
                "pulse picker uses provisional state labels"
            );
        }

        let base = DeviceBase::new(
            self.params.prefix.clone(),
            self.params.name.clone(),
            self.read_attrs,
            ioc,
        );
        Ok(PulsePicker {
            base,
            in_out: EnumSignal::new(in_out, in_out_ioc, client.clone()),
            blade: TelemetrySignal::new(blade, true, client.clone()),
            mode: TelemetrySignal::new(mode, true, client),
            params: self.params,
            _variant: PhantomData,
        })
    }
}

// =============================================================================
// AnyPulsePicker
// =============================================================================

/// A pulse picker of any variant, for configuration-driven construction.
#[derive(Debug, Clone)]
pub enum AnyPulsePicker {
    Standard(PulsePickerStandard),
    Ccm(PulsePickerCcm),
    Pink(PulsePickerPink),
}

macro_rules! dispatch {
    ($self:expr, $picker:ident => $body:expr) => {
        match $self {
            AnyPulsePicker::Standard($picker) => $body,
            AnyPulsePicker::Ccm($picker) => $body,
            AnyPulsePicker::Pink($picker) => $body,
        }
    };
}

impl AnyPulsePicker {
    pub fn name(&self) -> &str {
        dispatch!(self, p => p.name())
    }

    pub fn kind(&self) -> &'static str {
        dispatch!(self, p => p.kind())
    }

    pub fn in_out_channel(&self) -> &str {
        dispatch!(self, p => p.in_out_channel())
    }

    /// Issue `command` and return the label that was written.
    pub async fn command(&self, command: PickerCommand) -> DeviceResult<&'static str> {
        dispatch!(self, p => p.command(command).await.map(|s| s.label()))
    }

    pub async fn position_label(&self) -> DeviceResult<&'static str> {
        dispatch!(self, p => p.position().await.map(|s| s.label()))
    }

    pub async fn read(&self) -> DeviceResult<Reading> {
        dispatch!(self, p => p.read().await)
    }

    pub fn describe(&self) -> Description {
        dispatch!(self, p => p.describe())
    }
}

impl From<PulsePickerStandard> for AnyPulsePicker {
    fn from(picker: PulsePickerStandard) -> Self {
        AnyPulsePicker::Standard(picker)
    }
}

impl From<PulsePickerCcm> for AnyPulsePicker {
    fn from(picker: PulsePickerCcm) -> Self {
        AnyPulsePicker::Ccm(picker)
    }
}

impl From<PulsePickerPink> for AnyPulsePicker {
    fn from(picker: PulsePickerPink) -> Self {
        AnyPulsePicker::Pink(picker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::MockChannelBackend;
    use std::sync::Arc;

    /// A variant whose table never reaches one of its states.
    #[derive(Debug, Clone, Copy)]
    struct Miswired;

    impl PickerVariant for Miswired {
        type State = InOutCcmState;
        const KIND: &'static str = "miswired";

        fn target(command: PickerCommand) -> Option<InOutCcmState> {
            match command {
                PickerCommand::MoveIn => Some(InOutCcmState::In),
                PickerCommand::MoveOut => Some(InOutCcmState::Out),
                PickerCommand::MoveCcm => None,
            }
        }
    }

    fn client() -> ChannelClient {
        ChannelClient::with_default_timeout(Arc::new(MockChannelBackend::new()))
    }

    fn targets<V: PickerVariant>() -> Vec<(PickerCommand, &'static str)> {
        PickerCommand::ALL
            .iter()
            .filter_map(|c| V::target(*c).map(|s| (*c, s.label())))
            .collect()
    }

    #[test]
    fn test_command_targets_are_domain_members() {
        fn check<V: PickerVariant>() {
            for (command, label) in targets::<V>() {
                assert!(
                    <V::State as StateDomain>::contains(label),
                    "{} {command} writes non-member {label}",
                    V::KIND
                );
            }
            validate_command_table::<V>().unwrap();
        }
        check::<Standard>();
        check::<Ccm>();
        check::<Pink>();
    }

    #[test]
    fn test_command_tables() {
        use PickerCommand::*;
        assert_eq!(targets::<Standard>(), vec![(MoveIn, "IN"), (MoveOut, "OUT")]);
        assert_eq!(
            targets::<Ccm>(),
            vec![(MoveIn, "IN"), (MoveOut, "OUT"), (MoveCcm, "CCM")]
        );
        assert_eq!(
            targets::<Pink>(),
            vec![(MoveIn, "PINK"), (MoveOut, "OUT"), (MoveCcm, "CCM")]
        );
    }

    #[test]
    fn test_incomplete_table_rejected() {
        let err = PulsePicker::<Miswired>::builder("XPP:SB2:MMS:29")
            .in_out("XPP:SB2:PP:Y")
            .build(client())
            .unwrap_err();
        assert!(err.to_string().contains("CCM"));
    }

    #[test]
    fn test_build_requires_in_out() {
        let err = PulsePickerStandard::builder("XPP:SB2:MMS:29")
            .build(client())
            .unwrap_err();
        assert!(matches!(err, DeviceError::Construction(_)));
    }

    #[test]
    fn test_build_requires_prefix() {
        let err = PulsePickerStandard::builder("")
            .in_out("XPP:SB2:PP:Y")
            .build(client())
            .unwrap_err();
        assert!(matches!(err, DeviceError::Construction(_)));
    }

    #[test]
    fn test_channel_wiring() {
        let picker = PulsePickerPink::builder("XPP:SB2:MMS:29")
            .in_out("XPP:SB2:PP:Y")
            .in_out_ioc("IOC:XPP:SB2:PP")
            .ioc("IOC:XPP:SB2:MMS")
            .build(client())
            .unwrap();

        assert_eq!(picker.name(), "XPP:SB2:MMS:29");
        assert_eq!(picker.in_out_channel(), "XPP:SB2:PP:Y");
        assert_eq!(
            picker.in_out().ioc().map(|i| (i.prefix(), i.layout())),
            Some(("IOC:XPP:SB2:PP", IocAdminLayout::Current))
        );
        assert_eq!(picker.ioc().map(|i| i.layout()), Some(IocAdminLayout::Legacy));
        assert!(picker.is_provisional());

        let description = picker.describe();
        let keys: Vec<&str> = description.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "XPP:SB2:MMS:29_mode",
                "XPP:SB2:MMS:29_blade",
                "XPP:SB2:MMS:29_in_out"
            ]
        );
        assert_eq!(description[0].1.source, "XPP:SB2:MMS:29:SE");
        assert_eq!(description[1].1.source, "XPP:SB2:MMS:29:READ_DF");
        assert_eq!(
            description[2].1.state_sources,
            vec!["XPP:SB2:PP:Y:PINK", "XPP:SB2:PP:Y:CCM", "XPP:SB2:PP:Y:OUT"]
        );
        assert!(description[0].1.state_sources.is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_command() {
        let picker = AnyPulsePicker::from(
            PulsePickerStandard::builder("XPP:SB2:MMS:29")
                .in_out("XPP:SB2:PP:Y")
                .name("xpp_pp")
                .build(client())
                .unwrap(),
        );
        let err = picker.command(PickerCommand::MoveCcm).await.unwrap_err();
        assert!(matches!(
            err,
            DeviceError::UnsupportedCommand { ref command, ref device }
                if command == "move_ccm" && device == "xpp_pp"
        ));
    }
}
