//! Logical identifier newtypes.
//!
//! These identify software-level entities (VRFs, interfaces, ports, trunks)
//! as opposed to the hardware object handles owned by the SDK layer.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An IEEE 802.1Q VLAN identifier (1-4094).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VlanId(u16);

impl VlanId {
    /// The minimum valid VLAN ID.
    pub const MIN: u16 = 1;
    /// The maximum valid VLAN ID.
    pub const MAX: u16 = 4094;

    /// Creates a VLAN ID, validating the 1-4094 range.
    pub fn new(id: u16) -> Result<Self, ParseError> {
        if !(Self::MIN..=Self::MAX).contains(&id) {
            return Err(ParseError::InvalidVlanId(id));
        }
        Ok(VlanId(id))
    }

    /// Returns the raw VLAN number.
    pub const fn as_u16(&self) -> u16 {
        self.0
    }
}

impl TryFrom<u16> for VlanId {
    type Error = ParseError;

    fn try_from(id: u16) -> Result<Self, Self::Error> {
        VlanId::new(id)
    }
}

impl fmt::Display for VlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vlan{}", self.0)
    }
}

macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident, $raw:ty, $prefix:literal) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name($raw);

        impl $name {
            /// Creates a new identifier from the raw value.
            pub const fn new(raw: $raw) -> Self {
                $name(raw)
            }

            /// Returns the raw value.
            pub const fn raw(&self) -> $raw {
                self.0
            }
        }

        impl From<$raw> for $name {
            fn from(raw: $raw) -> Self {
                $name(raw)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

define_id!(
    /// A VRF (virtual routing and forwarding) instance identifier.
    VrfId,
    i32,
    "vrf"
);

define_id!(
    /// A logical router interface identifier.
    InterfaceId,
    u32,
    "intf"
);

define_id!(
    /// A physical switch port identifier.
    PortId,
    i32,
    "port"
);

define_id!(
    /// A trunk (link aggregation group) identifier.
    TrunkId,
    i32,
    "trunk"
);

impl VrfId {
    /// The default VRF.
    pub const DEFAULT: VrfId = VrfId(0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vlan_range() {
        assert!(VlanId::new(1).is_ok());
        assert!(VlanId::new(4094).is_ok());
        assert!(VlanId::new(0).is_err());
        assert!(VlanId::new(4095).is_err());
    }

    #[test]
    fn test_id_display() {
        assert_eq!(VrfId::DEFAULT.to_string(), "vrf0");
        assert_eq!(PortId::new(42).to_string(), "port42");
        assert_eq!(TrunkId::new(3).to_string(), "trunk3");
        assert_eq!(InterfaceId::new(55).to_string(), "intf55");
        assert_eq!(VlanId::new(100).unwrap().to_string(), "Vlan100");
    }

    #[test]
    fn test_id_roundtrip() {
        let port = PortId::from(7);
        assert_eq!(port.raw(), 7);
        assert_eq!(PortId::new(7), port);
    }
}
