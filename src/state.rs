//! Position State Domains
//!
//! A state domain is the fixed set of labels a position channel may hold for a
//! given device variant. Each domain is a plain Rust enum implementing
//! [`StateDomain`]; membership is decided at compile time and cannot change
//! while a device is running.
//!
//! | Domain          | Members (declaration order) |
//! |-----------------|-----------------------------|
//! | `InOutState`    | IN, OUT                     |
//! | `InOutCcmState` | IN, OUT, CCM                |
//! | `PinkState`     | PINK, CCM, OUT              |
//!
//! Every member also owns a channel suffix (`:IN`, `:OUT`, ...) naming the
//! per-state sub-record served by the IOC under the position channel.

use std::fmt::{self, Debug, Display};

/// A finite, ordered set of position labels.
pub trait StateDomain: Copy + Eq + Debug + Display + Send + Sync + 'static {
    /// Name used in error messages and signal descriptions.
    const NAME: &'static str;

    /// All members in declaration order.
    fn members() -> &'static [Self];

    /// Label written to and read from the remote channel.
    fn label(self) -> &'static str;

    /// Suffix of the per-state sub-record, e.g. `":CCM"`.
    fn suffix(self) -> &'static str;

    /// Parse a remote label. Returns `None` for non-members.
    fn from_label(label: &str) -> Option<Self> {
        Self::members()
            .iter()
            .copied()
            .find(|state| state.label() == label)
    }

    /// True if `label` names a member of this domain.
    fn contains(label: &str) -> bool {
        Self::from_label(label).is_some()
    }

    /// All labels in declaration order.
    fn enum_strs() -> Vec<&'static str> {
        Self::members().iter().map(|state| state.label()).collect()
    }
}

macro_rules! state_domain {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $label:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $(
                #[doc = concat!("`", $label, "`")]
                $variant,
            )+
        }

        impl StateDomain for $name {
            const NAME: &'static str = stringify!($name);

            fn members() -> &'static [Self] {
                &[$($name::$variant),+]
            }

            fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }

            fn suffix(self) -> &'static str {
                match self {
                    $($name::$variant => concat!(":", $label),)+
                }
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

state_domain! {
    /// Two-position blade: inserted or retracted.
    InOutState { In => "IN", Out => "OUT" }
}

state_domain! {
    /// IN/OUT plus CCM, which is inserted at the CCM offset.
    InOutCcmState { In => "IN", Out => "OUT", Ccm => "CCM" }
}

state_domain! {
    /// Pink-beam labelling: the inserted position is reported as PINK.
    ///
    /// This labelling is provisional on the IOC side and may be renamed.
    PinkState { Pink => "PINK", Ccm => "CCM", Out => "OUT" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_members_in_declaration_order() {
        assert_eq!(InOutState::enum_strs(), vec!["IN", "OUT"]);
        assert_eq!(InOutCcmState::enum_strs(), vec!["IN", "OUT", "CCM"]);
        assert_eq!(PinkState::enum_strs(), vec!["PINK", "CCM", "OUT"]);
    }

    #[test]
    fn test_from_label_rejects_non_members() {
        assert_eq!(InOutState::from_label("OUT"), Some(InOutState::Out));
        assert_eq!(InOutState::from_label("CCM"), None);
        assert_eq!(PinkState::from_label("IN"), None);
        assert_eq!(PinkState::from_label("PINK"), Some(PinkState::Pink));
        // Labels are case sensitive on the wire
        assert!(!InOutCcmState::contains("ccm"));
    }

    #[test]
    fn test_suffixes() {
        assert_eq!(InOutCcmState::Ccm.suffix(), ":CCM");
        assert_eq!(PinkState::Pink.suffix(), ":PINK");
        assert_eq!(InOutState::In.to_string(), "IN");
    }

    #[test]
    fn test_domain_names() {
        assert_eq!(InOutState::NAME, "InOutState");
        assert_eq!(PinkState::NAME, "PinkState");
    }
}
