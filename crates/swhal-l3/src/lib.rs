//! L3 egress, ECMP, and next-hop programming.
//!
//! This crate owns the hard part of L3 forwarding-state management on a
//! merchant-silicon ASIC: turning logical next-hop sets into hardware
//! egress objects and ECMP groups, keeping group membership in sync with
//! neighbor resolution and link state, and reconciling software intent with
//! whatever a prior run left programmed across a warm boot.
//!
//! # Architecture
//!
//! ```text
//! route layer ──> [L3Hal::lock] ──> L3HostTable ──> NextHop ──> EgressObject
//!                      │                 │                          │
//!                      │                 └──> EcmpEgressGroup ──────┤
//!                      │                                            ▼
//! link scan ───> [LinkScanHandle] ── (shrink only) ──────────> SwitchSdk
//! ```
//!
//! # Key components
//!
//! - [`EgressObject`] / [`EcmpEgressGroup`]: one hardware entry each, with
//!   skip-if-equivalent programming and incremental member maintenance
//! - [`L3HostTable`]: the reference-counted next-hop and multi-path tables
//!   plus resolution fan-out, reached through the hardware-update lock
//! - [`LinkScanHandle`]: the restricted, lock-free link-scan context
//! - [`WarmBootCache`]: prior-run state consulted by every `program` path
//!
//! Hardware programming failures are fatal by design ([`L3Error`] wraps
//! [`swhal_sdk::HardwareFault`] transparently); benign "not found" results
//! on removal paths are success.

pub mod audit;
mod egress;
mod error;
mod hal;
mod nexthop;
mod refmap;
mod resolution;
mod table;
mod warmboot;

pub use audit::{AuditCategory, AuditOutcome, AuditRecord};
pub use egress::{
    EcmpEgressGroup, EcmpProgramOutcome, EgressObject, EgressWeights, ForwardAction,
    PortDescriptor,
};
pub use error::{L3Error, L3Result};
pub use hal::{L3Hal, LinkScanHandle};
pub use nexthop::{HostKey, MultiPathNextHop, NextHop, NextHopSpec, RouteNextHopSet};
pub use refmap::{RefMap, Release};
pub use resolution::{
    EcmpResolutionAction, EgressIdSet, EgressResolutionTracker, PortEgressMap, PortEgressMapHandle,
};
pub use table::{IntfProvider, L3Config, L3HostTable, L3Stats};
pub use warmboot::{EcmpHostState, EcmpMemberState, HostState, WarmBootCache, WarmBootState};
