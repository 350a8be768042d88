//! Copy-on-write port-to-egress mapping.
//!
//! Link-scan callbacks need to answer "which egress IDs currently leave
//! through this port" without taking the hardware-update lock. Published
//! snapshots are immutable; writers clone the current snapshot, mutate the
//! clone, and atomically swap it in. Readers load a snapshot once and
//! iterate it with no further synchronization.

use crate::egress::PortDescriptor;
use arc_swap::ArcSwap;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use swhal_sdk::EgressId;

/// The set of egress IDs leaving through one port.
pub type EgressIdSet = BTreeSet<EgressId>;

/// One immutable snapshot of the port-to-egress mapping.
///
/// Ports with no egress IDs have no entry at all; a lookup of such a port
/// returns "no mapping", never an empty set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortEgressMap {
    map: BTreeMap<PortDescriptor, EgressIdSet>,
}

impl PortEgressMap {
    /// Returns the egress IDs mapped to `port`, if any.
    pub fn egress_ids(&self, port: &PortDescriptor) -> Option<&EgressIdSet> {
        self.map.get(port)
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PortDescriptor, &EgressIdSet)> {
        self.map.iter()
    }
}

/// Publication point for [`PortEgressMap`] snapshots.
#[derive(Debug)]
pub struct PortEgressMapHandle {
    current: ArcSwap<PortEgressMap>,
}

impl PortEgressMapHandle {
    pub fn new() -> Self {
        PortEgressMapHandle {
            current: ArcSwap::from_pointee(PortEgressMap::default()),
        }
    }

    /// Loads the current published snapshot.
    pub fn snapshot(&self) -> Arc<PortEgressMap> {
        self.current.load_full()
    }

    /// Moves `egress_id` from `old` to `new`.
    ///
    /// Must be called exactly once per egress-object port transition; `None`
    /// stands for the "no port" state of punt and drop entries. A port whose
    /// set becomes empty loses its map entry entirely.
    pub fn update(
        &self,
        egress_id: EgressId,
        old: Option<PortDescriptor>,
        new: Option<PortDescriptor>,
    ) {
        let mut next = (*self.snapshot()).clone();
        if let Some(old_port) = old {
            if let Some(set) = next.map.get_mut(&old_port) {
                set.remove(&egress_id);
                if set.is_empty() {
                    next.map.remove(&old_port);
                }
            }
        }
        if let Some(new_port) = new {
            next.map.entry(new_port).or_default().insert(egress_id);
        }
        self.current.store(Arc::new(next));
    }
}

impl Default for PortEgressMapHandle {
    fn default() -> Self {
        Self::new()
    }
}
