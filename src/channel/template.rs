//! Deferred channel-name templates.
//!
//! Some channel names are not fixed strings but depend on how a device was
//! constructed. A [`ChannelTemplate`] stores the pattern (for example
//! `"{in_out}"`) and is resolved per instance against [`ChannelParams`].
//! Resolution is pure: the same template and parameters always produce the
//! same name.
//!
//! Placeholders: `{prefix}`, `{in_out}`, `{in_out_ioc}`, `{ioc}`, `{name}`.
//! An empty parameter counts as missing.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::{DeviceError, DeviceResult};

/// Instance parameters a template may reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelParams {
    pub prefix: String,
    #[serde(default)]
    pub in_out: String,
    #[serde(default)]
    pub in_out_ioc: String,
    #[serde(default)]
    pub ioc: String,
    #[serde(default)]
    pub name: String,
}

impl ChannelParams {
    fn vars(&self) -> HashMap<String, String> {
        [
            ("prefix", self.prefix.as_str()),
            ("in_out", self.in_out.as_str()),
            ("in_out_ioc", self.in_out_ioc.as_str()),
            ("ioc", self.ioc.as_str()),
            ("name", self.name.as_str()),
        ]
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
    }
}

/// A channel name pattern resolved lazily from [`ChannelParams`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelTemplate(String);

impl ChannelTemplate {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self(pattern.into())
    }

    /// Template that appends `suffix` to the device prefix.
    pub fn suffix(suffix: &str) -> Self {
        Self(format!("{{prefix}}{suffix}"))
    }

    pub fn pattern(&self) -> &str {
        &self.0
    }

    /// Resolve the template. Missing or empty parameters are construction
    /// errors.
    pub fn resolve(&self, params: &ChannelParams) -> DeviceResult<String> {
        let resolved = strfmt::strfmt(&self.0, &params.vars()).map_err(|err| {
            DeviceError::Construction(format!(
                "cannot resolve channel template '{}': {}",
                self.0, err
            ))
        })?;
        if resolved.is_empty() {
            return Err(DeviceError::Construction(format!(
                "channel template '{}' resolved to an empty name",
                self.0
            )));
        }
        Ok(resolved)
    }

    /// Resolve the template, treating a missing parameter as "not set".
    ///
    /// Malformed templates are still errors.
    pub fn resolve_optional(&self, params: &ChannelParams) -> DeviceResult<Option<String>> {
        match strfmt::strfmt(&self.0, &params.vars()) {
            Ok(resolved) if resolved.is_empty() => Ok(None),
            Ok(resolved) => Ok(Some(resolved)),
            Err(strfmt::FmtError::KeyError(_)) => Ok(None),
            Err(err) => Err(DeviceError::Construction(format!(
                "cannot resolve channel template '{}': {}",
                self.0, err
            ))),
        }
    }
}

impl fmt::Display for ChannelTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ChannelParams {
        ChannelParams {
            prefix: "XCS:SB2:MMS:09".to_string(),
            in_out: "XCS:SB2:PP:Y".to_string(),
            in_out_ioc: "IOC:XCS:SB2:PP".to_string(),
            ioc: String::new(),
            name: "xcs_pp".to_string(),
        }
    }

    #[test]
    fn test_resolve_is_pure() {
        let template = ChannelTemplate::new("{in_out}");
        let first = template.resolve(&params()).unwrap();
        let second = template.resolve(&params()).unwrap();
        assert_eq!(first, "XCS:SB2:PP:Y");
        assert_eq!(first, second);
    }

    #[test]
    fn test_suffix_template() {
        let template = ChannelTemplate::suffix(":READ_DF");
        assert_eq!(template.pattern(), "{prefix}:READ_DF");
        assert_eq!(template.resolve(&params()).unwrap(), "XCS:SB2:MMS:09:READ_DF");
    }

    #[test]
    fn test_missing_parameter_is_construction_error() {
        let mut params = params();
        params.in_out.clear();
        let err = ChannelTemplate::new("{in_out}").resolve(&params).unwrap_err();
        assert!(matches!(err, DeviceError::Construction(_)));
    }

    #[test]
    fn test_unknown_placeholder_is_construction_error() {
        let err = ChannelTemplate::new("{bogus}:Y")
            .resolve(&params())
            .unwrap_err();
        assert!(err.to_string().contains("{bogus}:Y"));
    }

    #[test]
    fn test_resolve_optional() {
        let template = ChannelTemplate::new("{ioc}");
        assert_eq!(template.resolve_optional(&params()).unwrap(), None);
        let template = ChannelTemplate::new("{in_out_ioc}");
        assert_eq!(
            template.resolve_optional(&params()).unwrap().as_deref(),
            Some("IOC:XCS:SB2:PP")
        );
    }
}
