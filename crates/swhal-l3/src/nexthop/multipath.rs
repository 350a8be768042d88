//! Multi-path next hops.

use crate::egress::EcmpEgressGroup;
use crate::nexthop::types::RouteNextHopSet;
use swhal_sdk::EgressId;
use swhal_types::VrfId;

/// The per-route forwarding object: one hardware egress ID derived from a
/// set of next hops.
///
/// With one distinct underlying egress the lone member's ID is exposed
/// directly; with more, an ECMP group is created over the weighted member
/// multiset and the group's ID is exposed. Either way the route layer sees
/// exactly one ID.
#[derive(Debug)]
pub struct MultiPathNextHop {
    vrf: VrfId,
    nexthops: RouteNextHopSet,
    egress_id: EgressId,
    ecmp: Option<EcmpEgressGroup>,
}

impl MultiPathNextHop {
    pub(crate) fn single(vrf: VrfId, nexthops: RouteNextHopSet, egress_id: EgressId) -> Self {
        MultiPathNextHop {
            vrf,
            nexthops,
            egress_id,
            ecmp: None,
        }
    }

    pub(crate) fn grouped(vrf: VrfId, nexthops: RouteNextHopSet, ecmp: EcmpEgressGroup) -> Self {
        let egress_id = ecmp.id();
        MultiPathNextHop {
            vrf,
            nexthops,
            egress_id,
            ecmp: Some(ecmp),
        }
    }

    pub fn vrf(&self) -> VrfId {
        self.vrf
    }

    pub fn nexthops(&self) -> &RouteNextHopSet {
        &self.nexthops
    }

    /// The single hardware ID handed to the route layer.
    pub fn egress_id(&self) -> EgressId {
        self.egress_id
    }

    pub fn ecmp(&self) -> Option<&EcmpEgressGroup> {
        self.ecmp.as_ref()
    }

    pub(crate) fn ecmp_mut(&mut self) -> Option<&mut EcmpEgressGroup> {
        self.ecmp.as_mut()
    }

    pub(crate) fn take_ecmp(&mut self) -> Option<EcmpEgressGroup> {
        self.ecmp.take()
    }
}
