//! Egress resolution state.

use crate::egress::PortDescriptor;
use crate::resolution::portmap::{EgressIdSet, PortEgressMapHandle};
use log::debug;
use std::collections::HashSet;
use std::sync::Arc;
use swhal_sdk::EgressId;

/// Whether affected ECMP groups should add or remove a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcmpResolutionAction {
    /// The egress became reachable: install it where requested.
    Expand,
    /// The egress became unreachable: pull it out of hardware.
    Shrink,
}

/// Tracks which egress IDs have completed resolution and which port each
/// one currently leaves through.
///
/// The resolved set is consulted by next-hop programming to decide between
/// expand, shrink, and skip semantics; the port mapping answers "which
/// ECMP members are affected when port X changes state".
#[derive(Debug)]
pub struct EgressResolutionTracker {
    resolved: HashSet<EgressId>,
    port_map: Arc<PortEgressMapHandle>,
}

impl EgressResolutionTracker {
    pub fn new(port_map: Arc<PortEgressMapHandle>) -> Self {
        EgressResolutionTracker {
            resolved: HashSet::new(),
            port_map,
        }
    }

    /// Marks `id` resolved. Returns true if it was not already.
    pub fn resolved(&mut self, id: EgressId) -> bool {
        let fresh = self.resolved.insert(id);
        if fresh {
            debug!("egress {} resolved", id);
        }
        fresh
    }

    /// Marks `id` unresolved. Returns true if it was resolved before.
    pub fn unresolved(&mut self, id: EgressId) -> bool {
        let was = self.resolved.remove(&id);
        if was {
            debug!("egress {} unresolved", id);
        }
        was
    }

    pub fn is_resolved(&self, id: EgressId) -> bool {
        self.resolved.contains(&id)
    }

    /// Moves `egress_id` between ports in the published mapping.
    pub fn update_port_to_egress_mapping(
        &self,
        egress_id: EgressId,
        old: Option<PortDescriptor>,
        new: Option<PortDescriptor>,
    ) {
        debug!(
            "egress {} port mapping {:?} -> {:?}",
            egress_id, old, new
        );
        self.port_map.update(egress_id, old, new);
    }

    /// Returns the egress IDs currently leaving through `port`, if any.
    pub fn egress_ids_on_port(&self, port: &PortDescriptor) -> Option<EgressIdSet> {
        self.port_map.snapshot().egress_ids(port).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swhal_types::PortId;

    fn eid(raw: i32) -> EgressId {
        EgressId::from_raw_unchecked(raw)
    }

    #[test]
    fn test_resolved_set() {
        let mut tracker = EgressResolutionTracker::new(Arc::new(PortEgressMapHandle::new()));

        assert!(!tracker.is_resolved(eid(100002)));
        assert!(tracker.resolved(eid(100002)));
        assert!(!tracker.resolved(eid(100002)));
        assert!(tracker.is_resolved(eid(100002)));

        assert!(tracker.unresolved(eid(100002)));
        assert!(!tracker.unresolved(eid(100002)));
        assert!(!tracker.is_resolved(eid(100002)));
    }

    #[test]
    fn test_port_lookup_through_tracker() {
        let tracker = EgressResolutionTracker::new(Arc::new(PortEgressMapHandle::new()));
        let port = PortDescriptor::Physical(PortId::new(3));

        assert!(tracker.egress_ids_on_port(&port).is_none());
        tracker.update_port_to_egress_mapping(eid(100002), None, Some(port));
        assert!(tracker
            .egress_ids_on_port(&port)
            .unwrap()
            .contains(&eid(100002)));
    }
}
