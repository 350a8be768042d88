//! The L3 host table: next-hop and multi-path composition, resolution
//! fan-out, and the link-state entry points.

use crate::audit::{AuditCategory, AuditOutcome, AuditRecord};
use crate::egress::{EcmpEgressGroup, EcmpProgramOutcome, EgressWeights, PortDescriptor};
use crate::error::{L3Error, L3Result};
use crate::nexthop::{HostKey, MultiPathNextHop, NextHop, RouteNextHopSet};
use crate::refmap::{RefMap, Release};
use crate::resolution::{EcmpResolutionAction, EgressResolutionTracker, PortEgressMapHandle};
use crate::warmboot::{EcmpHostState, EcmpMemberState, HostState, WarmBootCache, WarmBootState};
use log::{debug, error, warn};
use std::collections::BTreeSet;
use std::net::IpAddr;
use std::sync::Arc;
use swhal_sdk::{EgressId, HardwareFault, L3IntfId, SwitchSdk};
use swhal_types::{InterfaceId, MacAddress, PortId, TrunkId, VrfId};

/// Resolves logical router interfaces to their hardware interface IDs.
///
/// Interface programming is owned by the RIF layer; this is the one
/// question the next-hop paths need answered.
pub trait IntfProvider: Send + Sync {
    fn hw_intf_id(&self, intf: InterfaceId) -> Option<L3IntfId>;
}

/// Host-table configuration.
#[derive(Debug, Clone, Default)]
pub struct L3Config {
    /// Hardware unit number.
    pub unit: i32,
    /// Dynamic load balancing is active on ECMP groups. A punt egress may
    /// not remain a member of a DLB-enabled group, which changes the order
    /// of shrink operations on resolution loss.
    pub dynamic_load_balancing: bool,
}

/// Operation counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct L3Stats {
    pub next_hops_created: u64,
    pub next_hops_destroyed: u64,
    pub multipaths_created: u64,
    pub multipaths_destroyed: u64,
    pub ecmp_created: u64,
    pub ecmp_adopted: u64,
    pub ecmp_destroyed: u64,
    pub expands: u64,
    pub shrinks: u64,
    pub skips: u64,
}

/// Process-wide L3 forwarding state.
///
/// All methods here mutate hardware and must run under the hardware-update
/// lock; the table is only reachable through
/// [`crate::L3Hal::lock`], whose guard is that lock. The link-scan context,
/// which cannot take the lock, goes through [`crate::LinkScanHandle`]
/// instead and can only remove ECMP members.
pub struct L3HostTable {
    sdk: Arc<dyn SwitchSdk>,
    config: L3Config,
    intf_provider: Arc<dyn IntfProvider>,
    warm_boot: WarmBootCache,
    next_hops: RefMap<HostKey, NextHop>,
    multipaths: RefMap<(VrfId, RouteNextHopSet), MultiPathNextHop>,
    resolution: EgressResolutionTracker,
    stats: L3Stats,
}

impl L3HostTable {
    pub fn new(
        sdk: Arc<dyn SwitchSdk>,
        config: L3Config,
        intf_provider: Arc<dyn IntfProvider>,
        warm_boot: WarmBootCache,
        port_map: Arc<PortEgressMapHandle>,
    ) -> Self {
        L3HostTable {
            sdk,
            config,
            intf_provider,
            warm_boot,
            next_hops: RefMap::new(),
            multipaths: RefMap::new(),
            resolution: EgressResolutionTracker::new(port_map),
            stats: L3Stats::default(),
        }
    }

    pub fn stats(&self) -> &L3Stats {
        &self.stats
    }

    pub fn warm_boot(&self) -> &WarmBootCache {
        &self.warm_boot
    }

    pub fn resolution(&self) -> &EgressResolutionTracker {
        &self.resolution
    }

    /// The platform drop egress entry.
    pub fn drop_egress_id(&self) -> EgressId {
        self.warm_boot.drop_egress_id()
    }

    /// The platform punt-to-CPU egress entry, shared by everything that has
    /// no route-specific punt state.
    pub fn to_cpu_egress_id(&self) -> EgressId {
        self.warm_boot.to_cpu_egress_id()
    }

    fn hw_intf(&self, intf: InterfaceId) -> L3Result<L3IntfId> {
        self.intf_provider
            .hw_intf_id(intf)
            .ok_or_else(|| L3Error::not_found("interface", intf))
    }

    // ------------------------------------------------------------------
    // Next-hop reference counting
    // ------------------------------------------------------------------

    /// Acquires the shared next hop for `key`, creating and programming it
    /// to punt on first reference.
    pub fn acquire_next_hop(&mut self, key: HostKey, multipath: bool) -> L3Result<EgressId> {
        key.validate()?;
        let intf_id = self.hw_intf(key.intf())?;
        let sdk = Arc::clone(&self.sdk);
        let unit = self.config.unit;
        let create_key = key.clone();
        let (ref_count, nh) = self
            .next_hops
            .acquire_with::<L3Error, _>(key, move || {
                Ok(NextHop::new(sdk, unit, create_key, multipath))
            })?;
        if ref_count == 1 {
            self.stats.next_hops_created += 1;
        }
        if !nh.is_programmed() {
            nh.program_to_cpu(&mut self.warm_boot, intf_id)?;
        }
        Ok(nh.egress_id())
    }

    /// Releases one reference; tears down hardware state at zero.
    pub fn release_next_hop(&mut self, key: &HostKey) -> L3Result<()> {
        match self.next_hops.release(key) {
            None => Err(L3Error::not_found("next hop", key)),
            Some(Release::StillHeld(_)) => Ok(()),
            Some(Release::Removed(mut nh)) => {
                let id = nh.egress_id();
                let old = nh.port();
                if id.is_valid() {
                    if old.is_some() {
                        self.resolution.update_port_to_egress_mapping(id, old, None);
                    }
                    self.resolution.unresolved(id);
                }
                nh.destroy_hw()?;
                self.stats.next_hops_destroyed += 1;
                Ok(())
            }
        }
    }

    /// Returns the egress ID for `key`, or `None` when absent.
    pub fn next_hop_egress_id_if(&self, key: &HostKey) -> Option<EgressId> {
        self.next_hops.get(key).map(NextHop::egress_id)
    }

    /// Returns the egress ID for `key`; absence is an error carrying the
    /// rendered key.
    pub fn next_hop_egress_id(&self, key: &HostKey) -> L3Result<EgressId> {
        self.next_hop_egress_id_if(key)
            .ok_or_else(|| L3Error::not_found("next hop", key))
    }

    pub fn next_hop_ref_count(&self, key: &HostKey) -> Option<u32> {
        self.next_hops.ref_count(key)
    }

    pub fn next_hop_count(&self) -> usize {
        self.next_hops.len()
    }

    // ------------------------------------------------------------------
    // Multi-path next hops
    // ------------------------------------------------------------------

    /// Acquires the per-route forwarding object for (vrf, next-hop set) and
    /// returns the single hardware egress ID the route should use.
    pub fn acquire_multi_path(
        &mut self,
        vrf: VrfId,
        nexthops: RouteNextHopSet,
    ) -> L3Result<EgressId> {
        if nexthops.is_empty() {
            return Err(L3Error::InvalidConfig("empty next-hop set".to_string()));
        }
        let key = (vrf, nexthops);
        if self.multipaths.acquire_existing(&key).is_some() {
            let id = self
                .multipaths
                .get(&key)
                .map(MultiPathNextHop::egress_id)
                .ok_or_else(|| L3Error::not_found("multi-path next hop", &key.1))?;
            return Ok(id);
        }
        let (vrf, nexthops) = key;

        let multipath = nexthops.len() > 1;
        let mut weights = EgressWeights::new();
        let mut acquired: Vec<HostKey> = Vec::new();
        let built = self.build_members(vrf, &nexthops, multipath, &mut acquired, &mut weights);
        let result = match built {
            Ok(()) => self.finish_multi_path(vrf, &nexthops, &weights),
            Err(err) => Err(err),
        };
        match result {
            Ok(id) => {
                crate::audit_log!(AuditRecord::new(
                    AuditCategory::ResourceCreate,
                    "L3HostTable",
                    "acquire_multi_path"
                )
                .with_object_id(format!("{}:{}", vrf, nexthops))
                .with_object_type("multi_path_next_hop")
                .with_details(serde_json::json!({
                    "egress_id": id.as_raw(),
                    "nexthops": nexthops.len(),
                })));
                self.stats.multipaths_created += 1;
                Ok(id)
            }
            Err(err) => {
                // Unwind the member references taken so far.
                for key in &acquired {
                    if let Err(release_err) = self.release_next_hop(key) {
                        error!("unwind of {} failed: {}", key, release_err);
                    }
                }
                crate::audit_log!(AuditRecord::new(
                    AuditCategory::ResourceCreate,
                    "L3HostTable",
                    "acquire_multi_path"
                )
                .with_outcome(AuditOutcome::Failure)
                .with_object_id(format!("{}:{}", vrf, nexthops))
                .with_object_type("multi_path_next_hop")
                .with_error(err.to_string()));
                Err(err)
            }
        }
    }

    fn build_members(
        &mut self,
        vrf: VrfId,
        nexthops: &RouteNextHopSet,
        multipath: bool,
        acquired: &mut Vec<HostKey>,
        weights: &mut EgressWeights,
    ) -> L3Result<()> {
        for spec in nexthops.iter() {
            let key = spec.host_key(vrf);
            let id = self.acquire_next_hop(key.clone(), multipath)?;
            acquired.push(key);
            *weights.entry(id).or_insert(0) += spec.effective_weight();
        }
        Ok(())
    }

    fn finish_multi_path(
        &mut self,
        vrf: VrfId,
        nexthops: &RouteNextHopSet,
        weights: &EgressWeights,
    ) -> L3Result<EgressId> {
        let mp = if weights.len() > 1 {
            let mut group =
                EcmpEgressGroup::new(Arc::clone(&self.sdk), self.config.unit, weights.clone());
            match group.program(&mut self.warm_boot, &self.resolution)? {
                EcmpProgramOutcome::Created => self.stats.ecmp_created += 1,
                EcmpProgramOutcome::Adopted => self.stats.ecmp_adopted += 1,
            }
            MultiPathNextHop::grouped(vrf, nexthops.clone(), group)
        } else {
            let id = weights
                .keys()
                .next()
                .copied()
                .ok_or_else(|| L3Error::InvalidConfig("empty next-hop set".to_string()))?;
            MultiPathNextHop::single(vrf, nexthops.clone(), id)
        };
        let id = mp.egress_id();
        if let Err(mut mp) = self.multipaths.insert_new((vrf, nexthops.clone()), mp) {
            // Cannot happen: presence was checked before building.
            error!("duplicate multi-path entry for {}:{}", vrf, nexthops);
            if let Some(mut group) = mp.take_ecmp() {
                group.destroy_hw()?;
            }
            return Err(L3Error::InvalidConfig(format!(
                "duplicate multi-path next hop {}:{}",
                vrf, nexthops
            )));
        }
        Ok(id)
    }

    /// Releases one route's reference; tears down the group and the member
    /// references at zero.
    pub fn release_multi_path(&mut self, vrf: VrfId, nexthops: &RouteNextHopSet) -> L3Result<()> {
        let key = (vrf, nexthops.clone());
        match self.multipaths.release(&key) {
            None => Err(L3Error::not_found(
                "multi-path next hop",
                format!("{}:{}", vrf, nexthops),
            )),
            Some(Release::StillHeld(_)) => Ok(()),
            Some(Release::Removed(mut mp)) => {
                if let Some(mut group) = mp.take_ecmp() {
                    group.destroy_hw()?;
                    self.stats.ecmp_destroyed += 1;
                }
                for spec in nexthops.iter() {
                    self.release_next_hop(&spec.host_key(vrf))?;
                }
                self.stats.multipaths_destroyed += 1;
                crate::audit_log!(AuditRecord::new(
                    AuditCategory::ResourceDelete,
                    "L3HostTable",
                    "release_multi_path"
                )
                .with_object_id(format!("{}:{}", vrf, nexthops))
                .with_object_type("multi_path_next_hop"));
                Ok(())
            }
        }
    }

    pub fn multi_path_egress_id_if(
        &self,
        vrf: VrfId,
        nexthops: &RouteNextHopSet,
    ) -> Option<EgressId> {
        self.multipaths
            .get(&(vrf, nexthops.clone()))
            .map(MultiPathNextHop::egress_id)
    }

    pub fn multi_path_count(&self) -> usize {
        self.multipaths.len()
    }

    // ------------------------------------------------------------------
    // Resolution transitions (ARP/NDP driven)
    // ------------------------------------------------------------------

    fn neighbor_keys(&self, vrf: VrfId, addr: IpAddr, intf: InterfaceId) -> Vec<HostKey> {
        self.next_hops
            .keys()
            .filter(|key| key.matches_neighbor(vrf, addr, intf))
            .cloned()
            .collect()
    }

    /// The neighbor resolved (or re-resolved): program every label variant
    /// of its next hop toward `mac`/`port` and expand affected groups.
    ///
    /// Expansion is issued even when the port did not change; adds are
    /// idempotent, and a group may have missed an earlier add due to
    /// initialization ordering.
    pub fn next_hop_reachable(
        &mut self,
        vrf: VrfId,
        addr: IpAddr,
        intf: InterfaceId,
        mac: MacAddress,
        port: PortDescriptor,
    ) -> L3Result<()> {
        let keys = self.neighbor_keys(vrf, addr, intf);
        if keys.is_empty() {
            debug!("no next hops for {}:{}@{}", vrf, addr, intf);
            return Ok(());
        }
        let intf_id = self.hw_intf(intf)?;
        for key in keys {
            let Some(nh) = self.next_hops.get_mut(&key) else {
                continue;
            };
            let old = nh.port();
            nh.program_to_port(&mut self.warm_boot, intf_id, mac, port)?;
            let id = nh.egress_id();
            if old != Some(port) {
                self.resolution
                    .update_port_to_egress_mapping(id, old, Some(port));
            }
            self.resolution.resolved(id);
            self.expand_one(id)?;
            self.stats.expands += 1;
        }
        Ok(())
    }

    /// The neighbor became unreachable: punt its next hops and shrink
    /// affected groups.
    pub fn next_hop_unreachable(
        &mut self,
        vrf: VrfId,
        addr: IpAddr,
        intf: InterfaceId,
    ) -> L3Result<()> {
        self.neighbor_lost(vrf, addr, intf, false)
    }

    /// The neighbor should be dropped (e.g. a null route): same shrink
    /// semantics as unreachable, but traffic is discarded instead of
    /// punted.
    pub fn next_hop_drop(&mut self, vrf: VrfId, addr: IpAddr, intf: InterfaceId) -> L3Result<()> {
        self.neighbor_lost(vrf, addr, intf, true)
    }

    fn neighbor_lost(
        &mut self,
        vrf: VrfId,
        addr: IpAddr,
        intf: InterfaceId,
        drop: bool,
    ) -> L3Result<()> {
        let keys = self.neighbor_keys(vrf, addr, intf);
        if keys.is_empty() {
            debug!("no next hops for {}:{}@{}", vrf, addr, intf);
            return Ok(());
        }
        let intf_id = self.hw_intf(intf)?;
        let dlb = self.config.dynamic_load_balancing;
        for key in keys {
            let Some((old, prev_id)) = self
                .next_hops
                .get(&key)
                .map(|nh| (nh.port(), nh.egress_id()))
            else {
                continue;
            };
            // A punt egress may not stay in a DLB-enabled group: pull it
            // out before the port association goes away.
            if dlb && old.is_some() {
                self.shrink_one(prev_id)?;
            }
            let id = {
                let Some(nh) = self.next_hops.get_mut(&key) else {
                    continue;
                };
                if drop {
                    nh.program_to_drop(&mut self.warm_boot, intf_id)?;
                } else {
                    nh.program_to_cpu(&mut self.warm_boot, intf_id)?;
                }
                nh.egress_id()
            };
            if old.is_some() {
                self.resolution.update_port_to_egress_mapping(id, old, None);
                if !dlb {
                    self.shrink_one(id)?;
                }
                self.resolution.unresolved(id);
                self.stats.shrinks += 1;
            } else {
                self.stats.skips += 1;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // ECMP fan-out and link-state handling
    // ------------------------------------------------------------------

    fn expand_one(&mut self, id: EgressId) -> Result<(), HardwareFault> {
        let ids = BTreeSet::from([id]);
        self.egress_resolution_changed_hw_locked(&ids, EcmpResolutionAction::Expand)
    }

    fn shrink_one(&mut self, id: EgressId) -> Result<(), HardwareFault> {
        let ids = BTreeSet::from([id]);
        self.egress_resolution_changed_hw_locked(&ids, EcmpResolutionAction::Shrink)
    }

    /// Applies a reachability change to every group that requested one of
    /// `ids`.
    pub fn egress_resolution_changed_hw_locked(
        &mut self,
        ids: &BTreeSet<EgressId>,
        action: EcmpResolutionAction,
    ) -> Result<(), HardwareFault> {
        for mp in self.multipaths.values_mut() {
            let Some(group) = mp.ecmp_mut() else {
                continue;
            };
            for id in ids {
                match action {
                    EcmpResolutionAction::Expand => {
                        group.path_reachable_hw_locked(*id)?;
                    }
                    EcmpResolutionAction::Shrink => {
                        group.path_unreachable_hw_locked(*id)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Link state change under the hardware-update lock.
    ///
    /// Down pulls the affected members from their groups and marks them
    /// unresolved. Up only reinstalls members that are still marked
    /// resolved; a member whose resolution was lost comes back through an
    /// explicit re-resolution, never through link-up alone.
    pub fn link_state_changed_hw_locked(
        &mut self,
        port: PortDescriptor,
        up: bool,
    ) -> Result<(), HardwareFault> {
        let Some(ids) = self.resolution.egress_ids_on_port(&port) else {
            debug!("no egress entries on {}, ignoring link {}", port, if up { "up" } else { "down" });
            return Ok(());
        };
        if up {
            let resolved: BTreeSet<EgressId> = ids
                .into_iter()
                .filter(|id| self.resolution.is_resolved(*id))
                .collect();
            if resolved.is_empty() {
                return Ok(());
            }
            self.egress_resolution_changed_hw_locked(&resolved, EcmpResolutionAction::Expand)?;
            self.stats.expands += 1;
        } else {
            self.egress_resolution_changed_hw_locked(&ids, EcmpResolutionAction::Shrink)?;
            for id in &ids {
                self.resolution.unresolved(*id);
            }
            self.stats.shrinks += 1;
        }
        Ok(())
    }

    pub fn link_up_hw_locked(&mut self, port: PortId) -> Result<(), HardwareFault> {
        self.link_state_changed_hw_locked(PortDescriptor::Physical(port), true)
    }

    pub fn link_down_hw_locked(&mut self, port: PortId) -> Result<(), HardwareFault> {
        self.link_state_changed_hw_locked(PortDescriptor::Physical(port), false)
    }

    /// A trunk fell below its minimum-links threshold.
    pub fn trunk_down_hw_locked(&mut self, trunk: TrunkId) -> Result<(), HardwareFault> {
        self.link_state_changed_hw_locked(PortDescriptor::Aggregate(trunk), false)
    }

    // ------------------------------------------------------------------
    // Warm boot
    // ------------------------------------------------------------------

    /// Replays the link transitions that happened while the process was
    /// down, after reconciliation is complete, so port mappings and group
    /// membership converge to the current physical link states.
    pub fn warm_boot_link_states_synced(
        &mut self,
        states: &[(PortDescriptor, bool)],
    ) -> Result<(), HardwareFault> {
        for (port, up) in states {
            self.link_state_changed_hw_locked(*port, *up)?;
        }
        crate::audit_log!(AuditRecord::new(
            AuditCategory::WarmRestart,
            "L3HostTable",
            "link_states_synced"
        )
        .with_details(serde_json::json!({ "ports": states.len() })));
        Ok(())
    }

    /// Dumps the state the next process instance needs for reconciliation.
    pub fn warm_boot_state(&self) -> WarmBootState {
        let mut hosts: Vec<HostState> = self
            .next_hops
            .iter()
            .map(|(key, nh)| HostState {
                vrf: key.vrf(),
                ip: key.addr(),
                intf: key.intf(),
                egress_id: nh.egress_id().as_raw(),
                port: nh.port().map(|p| p.raw()).unwrap_or(0),
                label_action: key.label_action().cloned(),
            })
            .collect();
        hosts.sort_by_key(|h| (h.vrf.raw(), h.ip, h.intf.raw()));

        let mut ecmp_hosts: Vec<EcmpHostState> = self
            .multipaths
            .iter()
            .map(|(key, mp)| EcmpHostState {
                vrf: key.0,
                nexthops: key.1.clone(),
                egress_id: mp.egress_id().as_raw(),
                ecmp_egress_id: mp.ecmp().map(|g| g.id().as_raw()).unwrap_or(-1),
                members: mp
                    .ecmp()
                    .map(|g| {
                        g.requested()
                            .iter()
                            .map(|(id, weight)| EcmpMemberState {
                                egress_id: id.as_raw(),
                                weight: *weight,
                            })
                            .collect()
                    })
                    .unwrap_or_default(),
            })
            .collect();
        ecmp_hosts.sort_by_key(|e| (e.vrf.raw(), e.egress_id));

        WarmBootState { hosts, ecmp_hosts }
    }

    /// Logs what reconciliation left unclaimed. Deletion of stale entries
    /// belongs to the platform layer.
    pub fn log_stale_warm_boot_entries(&self) {
        let stale_egresses = self.warm_boot.stale_egresses();
        let stale_groups = self.warm_boot.stale_ecmp_groups();
        let stale_hosts = self.warm_boot.stale_hosts();
        if stale_egresses.is_empty() && stale_groups.is_empty() && stale_hosts.is_empty() {
            return;
        }
        warn!(
            "warm boot left {} egress, {} ecmp, {} host entries unclaimed",
            stale_egresses.len(),
            stale_groups.len(),
            stale_hosts.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nexthop::NextHopSpec;
    use pretty_assertions::assert_eq;
    use swhal_sdk::SimSwitch;

    struct TestIntfMap;

    impl IntfProvider for TestIntfMap {
        fn hw_intf_id(&self, intf: InterfaceId) -> Option<L3IntfId> {
            Some(L3IntfId::from_raw_unchecked(1000 + intf.raw() as i32))
        }
    }

    fn make_table(sim: &Arc<SimSwitch>) -> L3HostTable {
        L3HostTable::new(
            sim.clone() as Arc<dyn SwitchSdk>,
            L3Config::default(),
            Arc::new(TestIntfMap),
            WarmBootCache::empty(0),
            Arc::new(PortEgressMapHandle::new()),
        )
    }

    fn key(ip: &str, intf: u32) -> HostKey {
        HostKey::unlabeled(VrfId::DEFAULT, ip.parse().unwrap(), InterfaceId::new(intf))
    }

    fn spec(ip: &str, intf: u32) -> NextHopSpec {
        NextHopSpec::new(ip.parse().unwrap(), InterfaceId::new(intf))
    }

    fn set(specs: &[NextHopSpec]) -> RouteNextHopSet {
        specs.iter().cloned().collect()
    }

    fn port(raw: i32) -> PortDescriptor {
        PortDescriptor::Physical(PortId::new(raw))
    }

    fn mac() -> MacAddress {
        "00:11:22:33:44:55".parse().unwrap()
    }

    #[test]
    fn test_at_most_one_next_hop_per_key() {
        let sim = Arc::new(SimSwitch::new());
        let mut table = make_table(&sim);

        let first = table.acquire_next_hop(key("10.0.0.1", 5), false).unwrap();
        let second = table.acquire_next_hop(key("10.0.0.1", 5), false).unwrap();

        assert_eq!(first, second);
        assert_eq!(table.next_hop_ref_count(&key("10.0.0.1", 5)), Some(2));
        assert_eq!(table.next_hop_count(), 1);
        assert_eq!(table.stats().next_hops_created, 1);

        table.release_next_hop(&key("10.0.0.1", 5)).unwrap();
        assert_eq!(table.next_hop_ref_count(&key("10.0.0.1", 5)), Some(1));
        assert!(sim.egress(first).is_some());

        table.release_next_hop(&key("10.0.0.1", 5)).unwrap();
        assert_eq!(table.next_hop_count(), 0);
        assert!(sim.egress(first).is_none());
    }

    #[test]
    fn test_release_missing_next_hop_is_error() {
        let sim = Arc::new(SimSwitch::new());
        let mut table = make_table(&sim);

        let err = table.release_next_hop(&key("10.0.0.1", 5)).unwrap_err();
        assert!(err.to_string().contains("10.0.0.1"));
    }

    #[test]
    fn test_single_path_exposes_member_id() {
        let sim = Arc::new(SimSwitch::new());
        let mut table = make_table(&sim);

        let nexthops = set(&[spec("10.0.0.1", 5)]);
        let id = table.acquire_multi_path(VrfId::DEFAULT, nexthops.clone()).unwrap();

        assert_eq!(table.next_hop_egress_id(&key("10.0.0.1", 5)).unwrap(), id);
        assert_eq!(sim.counters().ecmp_create, 0);
        assert_eq!(table.stats().ecmp_created, 0);

        table.release_multi_path(VrfId::DEFAULT, &nexthops).unwrap();
        assert_eq!(table.next_hop_count(), 0);
    }

    #[test]
    fn test_multi_path_creates_group() {
        let sim = Arc::new(SimSwitch::new());
        let mut table = make_table(&sim);

        let nexthops = set(&[spec("10.0.0.1", 5), spec("10.0.0.2", 6)]);
        let id = table.acquire_multi_path(VrfId::DEFAULT, nexthops.clone()).unwrap();

        assert!(sim.ecmp_members(id).is_some());
        assert_eq!(table.stats().ecmp_created, 1);
        // Unresolved members punt, so nothing is installed yet.
        assert!(sim.ecmp_members(id).unwrap().is_empty());

        table.release_multi_path(VrfId::DEFAULT, &nexthops).unwrap();
        assert!(sim.ecmp_members(id).is_none());
        assert_eq!(table.next_hop_count(), 0);
    }

    #[test]
    fn test_multi_path_shared_across_routes() {
        let sim = Arc::new(SimSwitch::new());
        let mut table = make_table(&sim);

        let nexthops = set(&[spec("10.0.0.1", 5), spec("10.0.0.2", 6)]);
        let first = table.acquire_multi_path(VrfId::DEFAULT, nexthops.clone()).unwrap();
        let second = table.acquire_multi_path(VrfId::DEFAULT, nexthops.clone()).unwrap();

        assert_eq!(first, second);
        assert_eq!(table.multi_path_count(), 1);
        assert_eq!(sim.counters().ecmp_create, 1);

        table.release_multi_path(VrfId::DEFAULT, &nexthops).unwrap();
        assert_eq!(table.multi_path_count(), 1);
        table.release_multi_path(VrfId::DEFAULT, &nexthops).unwrap();
        assert_eq!(table.multi_path_count(), 0);
    }

    #[test]
    fn test_empty_next_hop_set_rejected() {
        let sim = Arc::new(SimSwitch::new());
        let mut table = make_table(&sim);

        let err = table
            .acquire_multi_path(VrfId::DEFAULT, RouteNextHopSet::new())
            .unwrap_err();
        assert!(matches!(err, L3Error::InvalidConfig(_)));
    }

    #[test]
    fn test_resolution_installs_member() {
        let sim = Arc::new(SimSwitch::new());
        let mut table = make_table(&sim);

        let nexthops = set(&[spec("10.0.0.1", 5), spec("10.0.0.2", 6)]);
        let group_id = table.acquire_multi_path(VrfId::DEFAULT, nexthops).unwrap();
        let member = table.next_hop_egress_id(&key("10.0.0.1", 5)).unwrap();

        table
            .next_hop_reachable(
                VrfId::DEFAULT,
                "10.0.0.1".parse().unwrap(),
                InterfaceId::new(5),
                mac(),
                port(7),
            )
            .unwrap();

        assert!(table.resolution().is_resolved(member));
        assert_eq!(sim.ecmp_members(group_id).unwrap(), vec![member]);
        assert_eq!(table.stats().expands, 1);
        assert!(table
            .resolution()
            .egress_ids_on_port(&port(7))
            .unwrap()
            .contains(&member));
    }

    #[test]
    fn test_unreachable_shrinks_and_unmaps() {
        let sim = Arc::new(SimSwitch::new());
        let mut table = make_table(&sim);

        let nexthops = set(&[spec("10.0.0.1", 5), spec("10.0.0.2", 6)]);
        let group_id = table.acquire_multi_path(VrfId::DEFAULT, nexthops).unwrap();
        let member = table.next_hop_egress_id(&key("10.0.0.1", 5)).unwrap();
        let addr: IpAddr = "10.0.0.1".parse().unwrap();

        table
            .next_hop_reachable(VrfId::DEFAULT, addr, InterfaceId::new(5), mac(), port(7))
            .unwrap();
        table
            .next_hop_unreachable(VrfId::DEFAULT, addr, InterfaceId::new(5))
            .unwrap();

        assert!(!table.resolution().is_resolved(member));
        assert!(sim.ecmp_members(group_id).unwrap().is_empty());
        assert!(table.resolution().egress_ids_on_port(&port(7)).is_none());
        assert!(sim.egress(member).unwrap().is_punt_to_cpu());
        assert_eq!(table.stats().shrinks, 1);
    }

    #[test]
    fn test_unresolved_to_unresolved_is_skip() {
        let sim = Arc::new(SimSwitch::new());
        let mut table = make_table(&sim);

        table.acquire_next_hop(key("10.0.0.1", 5), false).unwrap();
        table
            .next_hop_unreachable(VrfId::DEFAULT, "10.0.0.1".parse().unwrap(), InterfaceId::new(5))
            .unwrap();

        assert_eq!(table.stats().skips, 1);
        assert_eq!(table.stats().shrinks, 0);
    }

    #[test]
    fn test_drop_neighbor_discards() {
        let sim = Arc::new(SimSwitch::new());
        let mut table = make_table(&sim);

        let id = table.acquire_next_hop(key("10.0.0.1", 5), false).unwrap();
        table
            .next_hop_drop(VrfId::DEFAULT, "10.0.0.1".parse().unwrap(), InterfaceId::new(5))
            .unwrap();

        assert!(sim.egress(id).unwrap().is_drop());
    }

    #[test]
    fn test_unknown_interface_is_recoverable() {
        struct NoIntf;
        impl IntfProvider for NoIntf {
            fn hw_intf_id(&self, _intf: InterfaceId) -> Option<L3IntfId> {
                None
            }
        }

        let sim = Arc::new(SimSwitch::new());
        let mut table = L3HostTable::new(
            sim.clone() as Arc<dyn SwitchSdk>,
            L3Config::default(),
            Arc::new(NoIntf),
            WarmBootCache::empty(0),
            Arc::new(PortEgressMapHandle::new()),
        );

        let err = table.acquire_next_hop(key("10.0.0.1", 5), false).unwrap_err();
        assert!(matches!(err, L3Error::NotFound { .. }));
        assert_eq!(table.next_hop_count(), 0);
    }

    #[test]
    fn test_labeled_variant_is_a_distinct_next_hop() {
        use swhal_types::{Label, LabelAction};

        let sim = Arc::new(SimSwitch::new());
        let mut table = make_table(&sim);

        let plain = set(&[spec("10.0.0.1", 5)]);
        let labeled = set(&[spec("10.0.0.1", 5)
            .with_label_action(LabelAction::Swap(Label::new(100).unwrap()))]);

        let plain_id = table.acquire_multi_path(VrfId::DEFAULT, plain).unwrap();
        let labeled_id = table.acquire_multi_path(VrfId::DEFAULT, labeled).unwrap();

        // Same neighbor, but the label makes it a distinct egress entry.
        assert_ne!(plain_id, labeled_id);
        assert_eq!(table.next_hop_count(), 2);

        // Resolution reaches both variants of the neighbor.
        table
            .next_hop_reachable(
                VrfId::DEFAULT,
                "10.0.0.1".parse().unwrap(),
                InterfaceId::new(5),
                mac(),
                port(7),
            )
            .unwrap();
        assert!(sim.egress(plain_id).unwrap().label.is_none());
        assert_eq!(
            sim.egress(labeled_id).unwrap().label,
            Some(Label::new(100).unwrap())
        );
        assert_eq!(sim.egress(labeled_id).unwrap().port, 7);
    }

    #[test]
    fn test_failed_member_unwinds_acquired_references() {
        let sim = Arc::new(SimSwitch::new());
        let mut table = make_table(&sim);

        // Poison the third egress create; the first two members unwind.
        sim.fail_next(swhal_sdk::SimOp::EcmpCreate, swhal_sdk::SdkStatus::Full);

        let nexthops = set(&[spec("10.0.0.1", 5), spec("10.0.0.2", 6)]);
        let err = table
            .acquire_multi_path(VrfId::DEFAULT, nexthops)
            .unwrap_err();
        assert!(err.is_hardware_fault());
        assert_eq!(table.next_hop_count(), 0);
        assert_eq!(table.multi_path_count(), 0);
    }
}
