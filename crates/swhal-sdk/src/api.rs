//! The SDK programming trait.

use crate::ids::EgressId;
use crate::records::{
    EcmpRecord, EgressRecord, HostRecord, L3Flags, L3IntfRecord, RouteRecord, StationRecord,
};
use crate::status::SdkResult;
use std::net::IpAddr;
use swhal_types::VrfId;

/// The vendor SDK boundary for L3 forwarding state.
///
/// Every method mirrors one procedural SDK call and takes the hardware unit
/// number first. Implementations return raw status codes; fault conversion
/// happens in the callers via [`crate::check`] / [`crate::check_remove`].
///
/// The `find_all` traversals exist for warm-boot readback: at process start
/// the reconciler walks what a prior run left programmed.
pub trait SwitchSdk: Send + Sync + std::fmt::Debug {
    // Egress objects.

    /// Creates an egress entry, or replaces the entry at `id` in place when
    /// `flags` carry `REPLACE | WITH_ID`.
    fn l3_egress_create(
        &self,
        unit: i32,
        flags: L3Flags,
        record: &EgressRecord,
        id: Option<EgressId>,
    ) -> SdkResult<EgressId>;

    fn l3_egress_destroy(&self, unit: i32, id: EgressId) -> SdkResult<()>;

    fn l3_egress_get(&self, unit: i32, id: EgressId) -> SdkResult<EgressRecord>;

    fn l3_egress_find_all(&self, unit: i32) -> SdkResult<Vec<(EgressId, EgressRecord)>>;

    // ECMP groups. Group handles live in the same space as egress handles.

    /// Creates an ECMP group over `members`. Duplicate members encode
    /// unequal-cost weights.
    fn l3_ecmp_create(
        &self,
        unit: i32,
        max_paths: i32,
        members: &[EgressId],
        id: Option<EgressId>,
    ) -> SdkResult<EgressId>;

    fn l3_ecmp_destroy(&self, unit: i32, group: EgressId) -> SdkResult<()>;

    /// Appends one member instance to the group.
    fn l3_ecmp_add(&self, unit: i32, group: EgressId, member: EgressId) -> SdkResult<()>;

    /// Removes one member instance from the group. `NotFound` when the
    /// member is not present.
    fn l3_ecmp_delete(&self, unit: i32, group: EgressId, member: EgressId) -> SdkResult<()>;

    fn l3_ecmp_get(&self, unit: i32, group: EgressId) -> SdkResult<(EcmpRecord, Vec<EgressId>)>;

    fn l3_ecmp_find_all(
        &self,
        unit: i32,
    ) -> SdkResult<Vec<(EgressId, EcmpRecord, Vec<EgressId>)>>;

    // Host (exact match) entries, keyed by (vrf, address).

    fn l3_host_add(&self, unit: i32, record: &HostRecord) -> SdkResult<()>;

    fn l3_host_delete(&self, unit: i32, vrf: VrfId, addr: IpAddr) -> SdkResult<()>;

    fn l3_host_find_all(&self, unit: i32) -> SdkResult<Vec<HostRecord>>;

    // Readback-only traversals consumed by warm-boot reconciliation.

    fn l3_route_find_all(&self, unit: i32) -> SdkResult<Vec<RouteRecord>>;

    fn l3_intf_find_all(&self, unit: i32) -> SdkResult<Vec<L3IntfRecord>>;

    fn l2_station_find_all(&self, unit: i32) -> SdkResult<Vec<StationRecord>>;
}
