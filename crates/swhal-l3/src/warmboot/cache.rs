//! Warm-boot reconciliation cache.

use crate::egress::EgressWeights;
use crate::nexthop::HostKey;
use crate::warmboot::state::WarmBootState;
use log::{debug, info};
use std::collections::BTreeMap;
use std::net::IpAddr;
use swhal_sdk::{
    check, EgressId, EgressRecord, HardwareFault, HostRecord, L3IntfRecord, RouteRecord,
    StationRecord, SwitchSdk, DEFAULT_DROP_EGRESS_ID, DEFAULT_TO_CPU_EGRESS_ID,
};
use swhal_types::{MacAddress, VlanId, VrfId};

/// What a prior run left in hardware, keyed the way the programming paths
/// look things up.
///
/// Populated once at process start from the serialized state dump plus a
/// hardware readback, before any new programming happens. Every `find_*`
/// lookup is paired with a `programmed_*` acknowledgment that removes the
/// entry; whatever is still here when reconciliation finishes is stale, and
/// the platform layer deletes it from hardware.
#[derive(Debug)]
pub struct WarmBootCache {
    unit: i32,
    egress_from_host: BTreeMap<HostKey, EgressId>,
    egresses: BTreeMap<EgressId, EgressRecord>,
    ecmp_from_members: BTreeMap<EgressWeights, EgressId>,
    ecmp_members: BTreeMap<EgressId, Vec<EgressId>>,
    hosts: BTreeMap<(VrfId, IpAddr), HostRecord>,
    routes: BTreeMap<(VrfId, IpAddr, u8), RouteRecord>,
    intfs: BTreeMap<(VlanId, MacAddress), L3IntfRecord>,
    stations: BTreeMap<VlanId, StationRecord>,
    drop_egress_id: EgressId,
    to_cpu_egress_id: EgressId,
}

impl WarmBootCache {
    /// An empty cache for cold boots: every lookup misses.
    pub fn empty(unit: i32) -> Self {
        WarmBootCache {
            unit,
            egress_from_host: BTreeMap::new(),
            egresses: BTreeMap::new(),
            ecmp_from_members: BTreeMap::new(),
            ecmp_members: BTreeMap::new(),
            hosts: BTreeMap::new(),
            routes: BTreeMap::new(),
            intfs: BTreeMap::new(),
            stations: BTreeMap::new(),
            drop_egress_id: DEFAULT_DROP_EGRESS_ID,
            to_cpu_egress_id: DEFAULT_TO_CPU_EGRESS_ID,
        }
    }

    /// Builds the cache from the prior run's state dump and a readback of
    /// what the hardware actually holds.
    pub fn populate(
        unit: i32,
        state: &WarmBootState,
        sdk: &dyn SwitchSdk,
    ) -> Result<Self, HardwareFault> {
        let mut cache = Self::empty(unit);

        for (id, record) in check(
            unit,
            "l3_egress_find_all",
            "warm boot readback",
            sdk.l3_egress_find_all(unit),
        )? {
            // The platform default entries are adopted by convention, not
            // reconciled.
            if id == DEFAULT_DROP_EGRESS_ID || id == DEFAULT_TO_CPU_EGRESS_ID {
                continue;
            }
            cache.egresses.insert(id, record);
        }

        for host in &state.hosts {
            let id = EgressId::from_raw_unchecked(host.egress_id);
            if cache.egresses.contains_key(&id) {
                cache.egress_from_host.insert(host.host_key(), id);
            }
        }

        for (id, _, members) in check(
            unit,
            "l3_ecmp_find_all",
            "warm boot readback",
            sdk.l3_ecmp_find_all(unit),
        )? {
            cache.ecmp_members.insert(id, members);
        }
        for ecmp_host in &state.ecmp_hosts {
            let id = EgressId::from_raw_unchecked(ecmp_host.ecmp_egress_id);
            if !id.is_valid() || !cache.ecmp_members.contains_key(&id) {
                continue;
            }
            let weights: EgressWeights = ecmp_host
                .members
                .iter()
                .map(|member| (EgressId::from_raw_unchecked(member.egress_id), member.weight))
                .collect();
            cache.ecmp_from_members.insert(weights, id);
        }
        // Groups the dump does not cover are still adoptable by their
        // hardware membership.
        for (id, members) in &cache.ecmp_members {
            let mut weights = EgressWeights::new();
            for member in members {
                *weights.entry(*member).or_insert(0) += 1;
            }
            cache.ecmp_from_members.entry(weights).or_insert(*id);
        }

        for host in check(
            unit,
            "l3_host_find_all",
            "warm boot readback",
            sdk.l3_host_find_all(unit),
        )? {
            cache.hosts.insert((host.vrf, host.addr), host);
        }
        for route in check(
            unit,
            "l3_route_find_all",
            "warm boot readback",
            sdk.l3_route_find_all(unit),
        )? {
            cache
                .routes
                .insert((route.vrf, route.prefix, route.prefix_len), route);
        }
        for intf in check(
            unit,
            "l3_intf_find_all",
            "warm boot readback",
            sdk.l3_intf_find_all(unit),
        )? {
            cache.intfs.insert((intf.vlan, intf.mac), intf);
        }
        for station in check(
            unit,
            "l2_station_find_all",
            "warm boot readback",
            sdk.l2_station_find_all(unit),
        )? {
            cache.stations.insert(station.vlan, station);
        }

        info!(
            "warm boot cache on unit {}: {} egresses, {} ecmp groups, {} hosts, {} routes",
            unit,
            cache.egresses.len(),
            cache.ecmp_members.len(),
            cache.hosts.len(),
            cache.routes.len()
        );
        Ok(cache)
    }

    pub fn unit(&self) -> i32 {
        self.unit
    }

    pub fn drop_egress_id(&self) -> EgressId {
        self.drop_egress_id
    }

    pub fn to_cpu_egress_id(&self) -> EgressId {
        self.to_cpu_egress_id
    }

    // Egress entries, looked up by next-hop identity.

    pub fn find_egress_from_host(&self, key: &HostKey) -> Option<(EgressId, EgressRecord)> {
        let id = *self.egress_from_host.get(key)?;
        let record = self.egresses.get(&id)?.clone();
        Some((id, record))
    }

    pub fn programmed_egress_from_host(&mut self, key: &HostKey) {
        if let Some(id) = self.egress_from_host.remove(key) {
            debug!("programmed egress entry {} for {}, removing from cache", id, key);
            self.egresses.remove(&id);
        }
    }

    // ECMP groups, looked up by exact member multiset.

    pub fn find_ecmp(&self, members: &EgressWeights) -> Option<(EgressId, Vec<EgressId>)> {
        let id = *self.ecmp_from_members.get(members)?;
        let hw_members = self.ecmp_members.get(&id)?.clone();
        Some((id, hw_members))
    }

    pub fn programmed_ecmp(&mut self, members: &EgressWeights) {
        if let Some(id) = self.ecmp_from_members.remove(members) {
            debug!("programmed ecmp group {}, removing from cache", id);
            self.ecmp_members.remove(&id);
        }
    }

    // Host entries.

    pub fn find_host(&self, vrf: VrfId, addr: IpAddr) -> Option<HostRecord> {
        self.hosts.get(&(vrf, addr)).cloned()
    }

    pub fn programmed_host(&mut self, vrf: VrfId, addr: IpAddr) {
        if self.hosts.remove(&(vrf, addr)).is_some() {
            debug!("programmed host {}:{}, removing from cache", vrf, addr);
        }
    }

    // Route entries.

    pub fn find_route(&self, vrf: VrfId, prefix: IpAddr, prefix_len: u8) -> Option<RouteRecord> {
        self.routes.get(&(vrf, prefix, prefix_len)).cloned()
    }

    pub fn programmed_route(&mut self, vrf: VrfId, prefix: IpAddr, prefix_len: u8) {
        if self.routes.remove(&(vrf, prefix, prefix_len)).is_some() {
            debug!(
                "programmed route {}:{}/{}, removing from cache",
                vrf, prefix, prefix_len
            );
        }
    }

    // L3 interfaces and L2 stations.

    pub fn find_l3_intf(&self, vlan: VlanId, mac: MacAddress) -> Option<L3IntfRecord> {
        self.intfs.get(&(vlan, mac)).cloned()
    }

    pub fn programmed_l3_intf(&mut self, vlan: VlanId, mac: MacAddress) {
        if self.intfs.remove(&(vlan, mac)).is_some() {
            debug!("programmed l3 interface {}/{}, removing from cache", vlan, mac);
        }
    }

    pub fn find_station(&self, vlan: VlanId) -> Option<StationRecord> {
        self.stations.get(&vlan).cloned()
    }

    pub fn programmed_station(&mut self, vlan: VlanId) {
        if self.stations.remove(&vlan).is_some() {
            debug!("programmed station {}, removing from cache", vlan);
        }
    }

    // Unclaimed leftovers. The platform layer deletes these from hardware
    // once reconciliation is complete.

    pub fn stale_egresses(&self) -> Vec<EgressId> {
        self.egresses.keys().copied().collect()
    }

    pub fn stale_ecmp_groups(&self) -> Vec<EgressId> {
        self.ecmp_members.keys().copied().collect()
    }

    pub fn stale_hosts(&self) -> Vec<HostRecord> {
        self.hosts.values().cloned().collect()
    }

    pub fn stale_routes(&self) -> Vec<RouteRecord> {
        self.routes.values().cloned().collect()
    }

    pub fn stale_l3_intfs(&self) -> Vec<L3IntfRecord> {
        self.intfs.values().cloned().collect()
    }

    pub fn stale_stations(&self) -> Vec<StationRecord> {
        self.stations.values().cloned().collect()
    }
}
