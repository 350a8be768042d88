//! Resolution tracking and the port-to-egress mapping.

mod portmap;
mod tracker;

pub use portmap::{EgressIdSet, PortEgressMap, PortEgressMapHandle};
pub use tracker::{EcmpResolutionAction, EgressResolutionTracker};
