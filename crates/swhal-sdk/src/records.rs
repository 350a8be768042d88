//! Plain record structs mirroring the SDK's C table-entry structs.

use crate::ids::{EgressId, L3IntfId, StationId};
use std::fmt;
use std::net::IpAddr;
use swhal_types::{Label, MacAddress, VlanId, VrfId};

/// Flag bits carried on L3 table entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct L3Flags(u32);

impl L3Flags {
    /// No flags set.
    pub const NONE: Self = Self(0);
    /// Entry addresses an IPv6 destination.
    pub const IPV6: Self = Self(1 << 0);
    /// Replace an existing entry in place.
    pub const REPLACE: Self = Self(1 << 1);
    /// Program at a caller-supplied handle.
    pub const WITH_ID: Self = Self(1 << 2);
    /// Entry points at an ECMP group.
    pub const MULTIPATH: Self = Self(1 << 3);
    /// Punt matching traffic to the CPU.
    pub const COPY_TO_CPU: Self = Self(1 << 4);
    /// Discard matching traffic.
    pub const DST_DISCARD: Self = Self(1 << 5);
    /// The output is a trunk, not a physical port.
    pub const TRUNK: Self = Self(1 << 6);
    /// The entry carries an MPLS label.
    pub const ROUTE_LABEL: Self = Self(1 << 7);

    /// Returns true if all bits of `other` are set.
    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns the raw bitmask.
    pub const fn bits(&self) -> u32 {
        self.0
    }
}

impl std::ops::BitOr for L3Flags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for L3Flags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for L3Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// One hardware egress entry: rewrite and transmit toward one next hop,
/// or punt/drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EgressRecord {
    /// Owning L3 interface.
    pub intf: L3IntfId,
    /// Resolved destination MAC; absent for punt/drop entries.
    pub mac: Option<MacAddress>,
    /// Output port or trunk number; 0 when not forwarding anywhere.
    pub port: i32,
    pub flags: L3Flags,
    /// MPLS label for labeled egresses.
    pub label: Option<Label>,
}

impl EgressRecord {
    /// Returns true if this entry punts to the CPU.
    pub fn is_punt_to_cpu(&self) -> bool {
        self.flags.contains(L3Flags::COPY_TO_CPU)
    }

    /// Returns true if this entry discards traffic.
    pub fn is_drop(&self) -> bool {
        self.flags.contains(L3Flags::DST_DISCARD)
    }

    /// Returns true if the output is a trunk.
    pub fn is_trunk(&self) -> bool {
        self.flags.contains(L3Flags::TRUNK)
    }
}

/// A hardware ECMP group header. Member handles travel separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EcmpRecord {
    /// Requested hardware table size (member count rounded up by the
    /// caller to the alignment the hardware wants).
    pub max_paths: i32,
    pub flags: L3Flags,
}

/// A hardware L3 host (exact-match) entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostRecord {
    pub vrf: VrfId,
    pub addr: IpAddr,
    /// The egress (or ECMP group) the host forwards through.
    pub egress_id: EgressId,
    pub flags: L3Flags,
}

/// A hardware L3 route (LPM) entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRecord {
    pub vrf: VrfId,
    pub prefix: IpAddr,
    pub prefix_len: u8,
    pub egress_id: EgressId,
    pub flags: L3Flags,
}

/// A hardware L3 interface (RIF) entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct L3IntfRecord {
    pub intf_id: L3IntfId,
    pub vlan: VlanId,
    pub mac: MacAddress,
}

/// A hardware L2 station entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationRecord {
    pub station_id: StationId,
    pub vlan: VlanId,
    pub mac: MacAddress,
}
