//! Common types for the switch hardware abstraction layer.
//!
//! This crate provides the primitive identifier and address types shared by
//! the SDK boundary and the L3 programming layers:
//!
//! - [`MacAddress`]: 48-bit Ethernet MAC addresses
//! - [`VlanId`], [`VrfId`], [`InterfaceId`]: logical table identifiers
//! - [`PortId`], [`TrunkId`]: physical and aggregate output identifiers
//! - [`Label`], [`LabelStack`], [`LabelAction`]: MPLS label handling
//!
//! IP addresses are represented with [`std::net::IpAddr`] directly.

mod ids;
mod label;
mod mac;

pub use ids::{InterfaceId, PortId, TrunkId, VlanId, VrfId};
pub use label::{Label, LabelAction, LabelStack};
pub use mac::MacAddress;

/// Common error type for parsing and validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid MAC address format: {0}")]
    InvalidMacAddress(String),

    #[error("invalid VLAN ID: {0} (must be 1-4094)")]
    InvalidVlanId(u16),

    #[error("invalid MPLS label: {0} (must be < 2^20)")]
    InvalidLabel(u32),

    #[error("empty MPLS label stack")]
    EmptyLabelStack,
}
