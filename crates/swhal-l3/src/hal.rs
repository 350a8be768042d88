//! The L3 HAL front object and its two execution contexts.
//!
//! Almost all mutation of L3 forwarding state runs under one process-wide
//! hardware-update lock. Link-scan callbacks are the exception: they run on
//! an execution context that must not take that lock (it may already be
//! held by a control-path call waiting on a link-scan-related hardware
//! operation), so they are restricted to operations proven safe without
//! it: member removal only, tolerant of racing removes.
//!
//! The split is enforced by construction rather than by naming convention:
//!
//! - [`L3Hal::lock`] yields the guard through which every `*_hw_locked`
//!   operation on [`L3HostTable`] is reached. Holding the guard is holding
//!   the lock; there is no way to call an expand-capable operation without
//!   it.
//! - [`L3Hal::link_scan_handle`] yields a handle that holds only the SDK
//!   and the published port-map snapshot. It cannot reach the software
//!   tables at all, so the compiler rules out expansion from the link-scan
//!   context.

use crate::egress::{EcmpEgressGroup, PortDescriptor};
use crate::resolution::PortEgressMapHandle;
use crate::table::{IntfProvider, L3Config, L3HostTable};
use crate::warmboot::WarmBootCache;
use log::debug;
use std::sync::{Arc, Mutex, MutexGuard};
use swhal_sdk::{check, HardwareFault, SwitchSdk};
use swhal_types::{PortId, TrunkId};

/// Process-wide handle to the L3 programming subsystem.
pub struct L3Hal {
    table: Mutex<L3HostTable>,
    sdk: Arc<dyn SwitchSdk>,
    unit: i32,
    port_map: Arc<PortEgressMapHandle>,
}

impl L3Hal {
    pub fn new(
        sdk: Arc<dyn SwitchSdk>,
        config: L3Config,
        intf_provider: Arc<dyn IntfProvider>,
        warm_boot: WarmBootCache,
    ) -> Self {
        let port_map = Arc::new(PortEgressMapHandle::new());
        let unit = config.unit;
        let table = L3HostTable::new(
            Arc::clone(&sdk),
            config,
            intf_provider,
            warm_boot,
            Arc::clone(&port_map),
        );
        L3Hal {
            table: Mutex::new(table),
            sdk,
            unit,
            port_map,
        }
    }

    /// Acquires the hardware-update lock. The returned guard is the only
    /// path to the mutating table operations.
    pub fn lock(&self) -> MutexGuard<'_, L3HostTable> {
        match self.table.lock() {
            Ok(guard) => guard,
            // A poisoned lock means another thread died mid-update; the
            // hardware state is suspect either way, so keep going and let
            // the next programming failure surface it.
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Creates the restricted handle handed to the link-scan callback
    /// context.
    pub fn link_scan_handle(&self) -> LinkScanHandle {
        LinkScanHandle {
            sdk: Arc::clone(&self.sdk),
            unit: self.unit,
            port_map: Arc::clone(&self.port_map),
        }
    }
}

/// The link-scan execution context.
///
/// Holds the SDK and the lock-free port-map snapshot, nothing else. Only
/// shrink operations exist here: link-down removal is safe to race against
/// locked expansion because both sides treat "my change was already made"
/// as success.
#[derive(Clone)]
pub struct LinkScanHandle {
    sdk: Arc<dyn SwitchSdk>,
    unit: i32,
    port_map: Arc<PortEgressMapHandle>,
}

impl LinkScanHandle {
    /// A physical port went down. Returns the number of member instances
    /// removed from hardware groups.
    pub fn link_down_hw_not_locked(&self, port: PortId) -> Result<u32, HardwareFault> {
        self.egress_down(PortDescriptor::Physical(port))
    }

    /// A trunk fell below its minimum-links threshold.
    pub fn trunk_down_hw_not_locked(&self, trunk: TrunkId) -> Result<u32, HardwareFault> {
        self.egress_down(PortDescriptor::Aggregate(trunk))
    }

    /// Walks the hardware ECMP table and removes every instance of the
    /// affected egress IDs. Software state is left alone; the locked paths
    /// reconverge from hardware when they next run.
    fn egress_down(&self, port: PortDescriptor) -> Result<u32, HardwareFault> {
        let snapshot = self.port_map.snapshot();
        let Some(ids) = snapshot.egress_ids(&port) else {
            debug!("no egress entries on {}, ignoring link down", port);
            return Ok(0);
        };
        let groups = check(
            self.unit,
            "l3_ecmp_find_all",
            port,
            self.sdk.l3_ecmp_find_all(self.unit),
        )?;
        let mut removed = 0;
        for (group, _, members) in groups {
            for id in ids {
                if members.contains(id) {
                    removed += EcmpEgressGroup::remove_egress_id_hw_not_locked(
                        self.sdk.as_ref(),
                        self.unit,
                        group,
                        *id,
                    )?;
                }
            }
        }
        debug!("link down on {} removed {} member instance(s)", port, removed);
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nexthop::{NextHopSpec, RouteNextHopSet};
    use pretty_assertions::assert_eq;
    use swhal_sdk::{L3IntfId, SimSwitch};
    use swhal_types::{InterfaceId, MacAddress, VrfId};

    struct TestIntfMap;

    impl IntfProvider for TestIntfMap {
        fn hw_intf_id(&self, intf: InterfaceId) -> Option<L3IntfId> {
            Some(L3IntfId::from_raw_unchecked(1000 + intf.raw() as i32))
        }
    }

    fn make_hal(sim: &Arc<SimSwitch>) -> L3Hal {
        L3Hal::new(
            sim.clone() as Arc<dyn SwitchSdk>,
            L3Config::default(),
            Arc::new(TestIntfMap),
            WarmBootCache::empty(0),
        )
    }

    fn spec(ip: &str, intf: u32) -> NextHopSpec {
        NextHopSpec::new(ip.parse().unwrap(), InterfaceId::new(intf))
    }

    fn mac() -> MacAddress {
        "00:11:22:33:44:55".parse().unwrap()
    }

    #[test]
    fn test_not_locked_link_down_removes_members() {
        let sim = Arc::new(SimSwitch::new());
        let hal = make_hal(&sim);

        let nexthops: RouteNextHopSet = [spec("10.0.0.1", 5), spec("10.0.0.2", 6)]
            .into_iter()
            .collect();
        let group_id = {
            let mut table = hal.lock();
            let id = table.acquire_multi_path(VrfId::DEFAULT, nexthops).unwrap();
            table
                .next_hop_reachable(
                    VrfId::DEFAULT,
                    "10.0.0.1".parse().unwrap(),
                    InterfaceId::new(5),
                    mac(),
                    PortDescriptor::Physical(PortId::new(7)),
                )
                .unwrap();
            id
        };
        assert_eq!(sim.ecmp_members(group_id).unwrap().len(), 1);

        // Link-scan context: no table access, hardware-only removal.
        let handle = hal.link_scan_handle();
        let removed = handle.link_down_hw_not_locked(PortId::new(7)).unwrap();
        assert_eq!(removed, 1);
        assert!(sim.ecmp_members(group_id).unwrap().is_empty());

        // A duplicate removal is a benign no-op.
        let removed = handle.link_down_hw_not_locked(PortId::new(7)).unwrap();
        assert_eq!(removed, 0);
    }

    #[test]
    fn test_link_down_on_unmapped_port_is_noop() {
        let sim = Arc::new(SimSwitch::new());
        let hal = make_hal(&sim);

        let handle = hal.link_scan_handle();
        assert_eq!(handle.link_down_hw_not_locked(PortId::new(42)).unwrap(), 0);
        assert_eq!(sim.counters().ecmp_delete, 0);
    }
}
