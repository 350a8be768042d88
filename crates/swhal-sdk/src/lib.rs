//! Safe Rust boundary for the vendor switch SDK.
//!
//! The vendor SDK is a C-style procedural API programming L3 forwarding
//! state (egress objects, ECMP groups, host entries, routes, L2 stations)
//! identified by small integer handles. This crate wraps that boundary:
//!
//! - [`SdkStatus`]: raw status codes converted to Rust results
//! - [`HardwareFault`]: the fatal error class for failed programming calls
//! - [`HwObjectId`]: phantom-typed hardware handles
//! - [`SwitchSdk`]: the trait the L3 layer programs against
//! - [`SimSwitch`]: an in-memory software implementation for tests
//!
//! The L3 layer treats every call as returning success or a typed failure
//! code; the distinguished [`SdkStatus::NotFound`] code is benign on remove
//! paths (the desired postcondition already holds).

mod api;
mod ids;
mod records;
mod sim;
mod status;

pub use api::SwitchSdk;
pub use ids::{
    EgressId, HwObjectId, HwObjectKind, L3IntfId, StationId, DEFAULT_DROP_EGRESS_ID,
    DEFAULT_TO_CPU_EGRESS_ID,
};
pub use records::{
    EcmpRecord, EgressRecord, HostRecord, L3Flags, L3IntfRecord, RouteRecord, StationRecord,
};
pub use sim::{SimCounters, SimOp, SimSwitch};
pub use status::{check, check_remove, HardwareFault, SdkResult, SdkStatus};
