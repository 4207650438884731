//! Beamline configuration using Figment.
//!
//! ```toml
//! [application]
//! name = "XPP"
//! log_level = "info"
//!
//! [channel]
//! timeout_ms = 2000
//!
//! [[pulse_pickers]]
//! name = "xpp_pp"
//! prefix = "XPP:SB2:MMS:29"
//! variant = "ccm"
//! in_out = "XPP:SB2:PP:Y"
//! in_out_ioc = "IOC:XPP:SB2:PP"
//! ```

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::channel::{ChannelBackend, ChannelClient};
use crate::device::{
    AnyPulsePicker, Attribute, PickerVariant, PulsePicker, PulsePickerCcm, PulsePickerPink,
    PulsePickerStandard,
};
use crate::error::DeviceResult;

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration load error: {0}")]
    LoadError(#[from] figment::Error),
    #[error("Configuration validation error: {0}")]
    ValidationError(String),
}

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeamlineConfig {
    pub application: ApplicationConfig,
    #[serde(default)]
    pub channel: ChannelSettings,
    #[serde(default)]
    pub pulse_pickers: Vec<PulsePickerConfig>,
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    pub name: String,
    /// Logging level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Remote channel access settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelSettings {
    /// Per-operation timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl ChannelSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Client bound to `backend` with the configured timeout.
    pub fn client(&self, backend: Arc<dyn ChannelBackend>) -> ChannelClient {
        ChannelClient::new(backend, self.timeout())
    }
}

/// Which pulse picker variant to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickerKind {
    #[default]
    Standard,
    Ccm,
    Pink,
}

/// One pulse picker definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PulsePickerConfig {
    pub name: String,
    pub prefix: String,
    #[serde(default)]
    pub variant: PickerKind,
    pub in_out: String,
    #[serde(default)]
    pub in_out_ioc: String,
    #[serde(default)]
    pub ioc: String,
    /// Attributes included in `read()`. Defaults to mode, blade, in_out.
    #[serde(default)]
    pub read_attrs: Option<Vec<String>>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout_ms() -> u64 {
    2000
}

impl PulsePickerConfig {
    fn parsed_read_attrs(&self) -> Result<Option<Vec<Attribute>>, ConfigError> {
        self.read_attrs
            .as_ref()
            .map(|attrs| {
                attrs
                    .iter()
                    .map(|a| {
                        a.parse::<Attribute>().map_err(|_| {
                            ConfigError::ValidationError(format!(
                                "pulse picker '{}': unknown read attribute '{}'",
                                self.name, a
                            ))
                        })
                    })
                    .collect()
            })
            .transpose()
    }

    fn build_variant<V: PickerVariant>(&self, client: ChannelClient) -> DeviceResult<PulsePicker<V>> {
        let mut builder = PulsePicker::<V>::builder(&self.prefix)
            .name(&self.name)
            .in_out(&self.in_out)
            .in_out_ioc(&self.in_out_ioc)
            .ioc(&self.ioc);
        if let Some(attrs) = self.parsed_read_attrs()? {
            builder = builder.read_attrs(attrs);
        }
        builder.build(client)
    }

    /// Build the configured device.
    pub fn build(&self, client: ChannelClient) -> DeviceResult<AnyPulsePicker> {
        Ok(match self.variant {
            PickerKind::Standard => {
                let picker: PulsePickerStandard = self.build_variant(client)?;
                picker.into()
            }
            PickerKind::Ccm => {
                let picker: PulsePickerCcm = self.build_variant(client)?;
                picker.into()
            }
            PickerKind::Pink => {
                let picker: PulsePickerPink = self.build_variant(client)?;
                picker.into()
            }
        })
    }
}

impl BeamlineConfig {
    /// Load configuration from the default location
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config/beamline.toml")
    }

    /// Load configuration from a specific file path, then validate it.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config: Self = Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("BEAMLINE_").split("__"))
            .extract()?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.application.log_level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.application.log_level,
                valid_levels.join(", ")
            )));
        }

        if self.channel.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "channel.timeout_ms must be greater than 0".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for picker in &self.pulse_pickers {
            if !names.insert(picker.name.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "Duplicate pulse picker name '{}'",
                    picker.name
                )));
            }
            if picker.prefix.is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "pulse picker '{}': 'prefix' cannot be empty",
                    picker.name
                )));
            }
            if picker.in_out.is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "pulse picker '{}': 'in_out' cannot be empty",
                    picker.name
                )));
            }
            picker.parsed_read_attrs()?;
        }

        Ok(())
    }

    /// Build every configured pulse picker against `backend`.
    pub fn build_pulse_pickers(
        &self,
        backend: Arc<dyn ChannelBackend>,
    ) -> DeviceResult<Vec<AnyPulsePicker>> {
        let client = self.channel.client(backend);
        let pickers = self
            .pulse_pickers
            .iter()
            .map(|picker| picker.build(client.clone()))
            .collect::<DeviceResult<Vec<_>>>()?;
        info!(count = pickers.len(), "pulse pickers constructed");
        Ok(pickers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::MockChannelBackend;
    use crate::error::DeviceError;
    use std::io::Write;

    const EXAMPLE: &str = r#"
[application]
name = "XPP"
log_level = "debug"

[channel]
timeout_ms = 500

[[pulse_pickers]]
name = "xpp_pp"
prefix = "XPP:SB2:MMS:29"
variant = "ccm"
in_out = "XPP:SB2:PP:Y"
in_out_ioc = "IOC:XPP:SB2:PP"

[[pulse_pickers]]
name = "xcs_pp"
prefix = "XCS:SB2:MMS:09"
variant = "pink"
in_out = "XCS:SB2:PP:Y"
read_attrs = ["in_out"]
"#;

    fn picker(name: &str) -> PulsePickerConfig {
        PulsePickerConfig {
            name: name.to_string(),
            prefix: "XPP:SB2:MMS:29".to_string(),
            variant: PickerKind::Standard,
            in_out: "XPP:SB2:PP:Y".to_string(),
            in_out_ioc: String::new(),
            ioc: String::new(),
            read_attrs: None,
        }
    }

    fn config(pulse_pickers: Vec<PulsePickerConfig>) -> BeamlineConfig {
        BeamlineConfig {
            application: ApplicationConfig {
                name: "Test".to_string(),
                log_level: "info".to_string(),
            },
            channel: ChannelSettings::default(),
            pulse_pickers,
        }
    }

    // Env-reading tests share the Jail lock so overrides never leak between them
    fn load_example() -> BeamlineConfig {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(EXAMPLE.as_bytes()).unwrap();
        let mut loaded = None;
        figment::Jail::expect_with(|_jail| {
            loaded = Some(BeamlineConfig::load_from(file.path()).map_err(|e| e.to_string())?);
            Ok(())
        });
        loaded.unwrap()
    }

    #[test]
    fn test_load_from_file() {
        let config = load_example();
        assert_eq!(config.application.log_level, "debug");
        assert_eq!(config.channel.timeout(), Duration::from_millis(500));
        assert_eq!(config.pulse_pickers.len(), 2);
        assert_eq!(config.pulse_pickers[1].variant, PickerKind::Pink);
    }

    #[test]
    fn test_env_override() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("beamline.toml", EXAMPLE)?;
            jail.set_env("BEAMLINE_APPLICATION__LOG_LEVEL", "warn");
            jail.set_env("BEAMLINE_CHANNEL__TIMEOUT_MS", "750");

            let config = BeamlineConfig::load_from("beamline.toml").map_err(|e| e.to_string())?;
            assert_eq!(config.application.log_level, "warn");
            assert_eq!(config.channel.timeout_ms, 750);
            Ok(())
        });
    }

    #[test]
    fn test_validation_rejects_duplicates() {
        let err = config(vec![picker("pp"), picker("pp")]).validate().unwrap_err();
        assert!(err.to_string().contains("Duplicate"));
    }

    #[test]
    fn test_validation_rejects_unknown_attr() {
        let mut bad = picker("pp");
        bad.read_attrs = Some(vec!["position".to_string()]);
        let err = config(vec![bad]).validate().unwrap_err();
        assert!(err.to_string().contains("position"));
    }

    #[test]
    fn test_validation_rejects_log_level() {
        let mut config = config(vec![]);
        config.application.log_level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_build_pulse_pickers() {
        let config = load_example();

        let pickers = config
            .build_pulse_pickers(Arc::new(MockChannelBackend::new()))
            .unwrap();
        assert_eq!(pickers[0].kind(), "ccm");
        assert_eq!(pickers[0].in_out_channel(), "XPP:SB2:PP:Y");
        assert_eq!(pickers[1].kind(), "pink");
        assert_eq!(pickers[1].describe().len(), 1);
    }

    #[test]
    fn test_build_unknown_attr_is_config_error() {
        let mut bad = picker("pp");
        bad.read_attrs = Some(vec!["position".to_string()]);
        let client = ChannelClient::with_default_timeout(Arc::new(MockChannelBackend::new()));
        let err = bad.build(client).unwrap_err();
        assert!(matches!(err, DeviceError::Config(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_default_variant_is_standard() {
        let client = ChannelClient::with_default_timeout(Arc::new(MockChannelBackend::new()));
        let built: PulsePickerStandard = picker("pp").build_variant(client).unwrap();
        assert_eq!(built.kind(), "standard");
    }
}
