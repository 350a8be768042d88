//! Link-state and resolution scenarios across the full table.

use std::collections::BTreeMap;
use std::net::IpAddr;
use std::sync::Arc;
use swhal_l3::{
    HostKey, IntfProvider, L3Config, L3Hal, NextHopSpec, PortDescriptor, RouteNextHopSet,
    WarmBootCache,
};
use swhal_sdk::{EgressId, L3IntfId, SimSwitch, SwitchSdk};
use swhal_types::{InterfaceId, MacAddress, PortId, VrfId};

struct TestIntfMap;

impl IntfProvider for TestIntfMap {
    fn hw_intf_id(&self, intf: InterfaceId) -> Option<L3IntfId> {
        Some(L3IntfId::from_raw_unchecked(1000 + intf.raw() as i32))
    }
}

fn make_hal(sim: &Arc<SimSwitch>, config: L3Config) -> L3Hal {
    L3Hal::new(
        sim.clone() as Arc<dyn SwitchSdk>,
        config,
        Arc::new(TestIntfMap),
        WarmBootCache::empty(0),
    )
}

fn addr(i: u32) -> IpAddr {
    format!("10.0.0.{}", i).parse().unwrap()
}

fn spec(i: u32) -> NextHopSpec {
    NextHopSpec::new(addr(i), InterfaceId::new(i))
}

fn key(i: u32) -> HostKey {
    HostKey::unlabeled(VrfId::DEFAULT, addr(i), InterfaceId::new(i))
}

fn mac(i: u32) -> MacAddress {
    MacAddress::new([0x00, 0x11, 0x22, 0x33, 0x44, i as u8])
}

fn port(i: i32) -> PortDescriptor {
    PortDescriptor::Physical(PortId::new(i))
}

#[test]
fn test_link_down_up_down_up_scenario() {
    let sim = Arc::new(SimSwitch::new());
    let hal = make_hal(&sim, L3Config::default());
    let mut table = hal.lock();

    // Eight logical members, one of which resolves.
    let nexthops: RouteNextHopSet = (1..=8).map(spec).collect();
    let group_id = table
        .acquire_multi_path(VrfId::DEFAULT, nexthops)
        .unwrap();
    table
        .next_hop_reachable(VrfId::DEFAULT, addr(1), InterfaceId::new(1), mac(1), port(7))
        .unwrap();
    let member = table.next_hop_egress_id(&key(1)).unwrap();
    assert_eq!(sim.ecmp_members(group_id).unwrap(), vec![member]);

    // Link down removes the member.
    table.link_down_hw_locked(PortId::new(7)).unwrap();
    assert!(sim.ecmp_members(group_id).unwrap().is_empty());

    // Link up alone does not restore it; resolution was lost.
    table.link_up_hw_locked(PortId::new(7)).unwrap();
    assert!(sim.ecmp_members(group_id).unwrap().is_empty());

    // An explicit re-resolution does.
    table
        .next_hop_reachable(VrfId::DEFAULT, addr(1), InterfaceId::new(1), mac(1), port(7))
        .unwrap();
    assert_eq!(sim.ecmp_members(group_id).unwrap(), vec![member]);
}

#[test]
fn test_unequal_cost_weights_with_table_rounding() {
    let sim = Arc::new(SimSwitch::new());
    let hal = make_hal(&sim, L3Config::default());
    let mut table = hal.lock();

    // Weights 3,1,1,1,1,1,1,1: ten logical members over eight next hops.
    let nexthops: RouteNextHopSet = (1..=8)
        .map(|i| {
            let weight = if i == 1 { 3 } else { 1 };
            spec(i).with_weight(weight)
        })
        .collect();
    let group_id = table
        .acquire_multi_path(VrfId::DEFAULT, nexthops)
        .unwrap();

    // The hardware table is allocated in blocks of four.
    assert_eq!(sim.ecmp_max_paths(group_id), Some(12));

    for i in 1..=8 {
        table
            .next_hop_reachable(VrfId::DEFAULT, addr(i), InterfaceId::new(i), mac(i), port(i as i32))
            .unwrap();
    }

    // The installed multiset has exactly ten entries, 3/1/1/1/1/1/1/1.
    let members = sim.ecmp_members(group_id).unwrap();
    assert_eq!(members.len(), 10);
    let mut counts: BTreeMap<EgressId, u32> = BTreeMap::new();
    for member in members {
        *counts.entry(member).or_insert(0) += 1;
    }
    let heavy = table.next_hop_egress_id(&key(1)).unwrap();
    assert_eq!(counts.remove(&heavy), Some(3));
    assert!(counts.values().all(|count| *count == 1));
    assert_eq!(counts.len(), 7);
}

#[test]
fn test_idempotent_reprogramming() {
    let sim = Arc::new(SimSwitch::new());
    let hal = make_hal(&sim, L3Config::default());
    let mut table = hal.lock();

    table.acquire_next_hop(key(1), false).unwrap();
    let creates_after_punt = sim.counters().egress_create;

    table
        .next_hop_reachable(VrfId::DEFAULT, addr(1), InterfaceId::new(1), mac(1), port(7))
        .unwrap();
    assert_eq!(sim.counters().egress_create, creates_after_punt + 1);

    // Identical parameters: the second call must not touch hardware.
    table
        .next_hop_reachable(VrfId::DEFAULT, addr(1), InterfaceId::new(1), mac(1), port(7))
        .unwrap();
    assert_eq!(sim.counters().egress_create, creates_after_punt + 1);
}

#[test]
fn test_port_mapping_round_trip() {
    let sim = Arc::new(SimSwitch::new());
    let hal = make_hal(&sim, L3Config::default());
    let mut table = hal.lock();

    table.acquire_next_hop(key(1), false).unwrap();
    let id = table.next_hop_egress_id(&key(1)).unwrap();

    table
        .next_hop_reachable(VrfId::DEFAULT, addr(1), InterfaceId::new(1), mac(1), port(1))
        .unwrap();
    assert!(table
        .resolution()
        .egress_ids_on_port(&port(1))
        .unwrap()
        .contains(&id));

    // The neighbor moved to another port.
    table
        .next_hop_reachable(VrfId::DEFAULT, addr(1), InterfaceId::new(1), mac(1), port(2))
        .unwrap();
    // The old port's set became empty, so its mapping is gone entirely.
    assert!(table.resolution().egress_ids_on_port(&port(1)).is_none());
    assert!(table
        .resolution()
        .egress_ids_on_port(&port(2))
        .unwrap()
        .contains(&id));
}

#[test]
fn test_mac_only_change_reissues_expand() {
    let sim = Arc::new(SimSwitch::new());
    let hal = make_hal(&sim, L3Config::default());
    let mut table = hal.lock();

    let nexthops: RouteNextHopSet = [spec(1), spec(2)].into_iter().collect();
    let group_id = table
        .acquire_multi_path(VrfId::DEFAULT, nexthops)
        .unwrap();

    table
        .next_hop_reachable(VrfId::DEFAULT, addr(1), InterfaceId::new(1), mac(1), port(7))
        .unwrap();
    assert_eq!(sim.ecmp_members(group_id).unwrap().len(), 1);

    // Same port, different MAC: the egress is rewritten in place and the
    // expand is re-issued without duplicating the member.
    table
        .next_hop_reachable(VrfId::DEFAULT, addr(1), InterfaceId::new(1), mac(99), port(7))
        .unwrap();
    assert_eq!(sim.ecmp_members(group_id).unwrap().len(), 1);
    let member = table.next_hop_egress_id(&key(1)).unwrap();
    assert_eq!(
        sim.egress(member).unwrap().mac,
        Some(mac(99))
    );
}

#[test]
fn test_dlb_pulls_member_before_punt() {
    let sim = Arc::new(SimSwitch::new());
    let hal = make_hal(
        &sim,
        L3Config {
            unit: 0,
            dynamic_load_balancing: true,
        },
    );
    let mut table = hal.lock();

    let nexthops: RouteNextHopSet = [spec(1), spec(2)].into_iter().collect();
    let group_id = table
        .acquire_multi_path(VrfId::DEFAULT, nexthops)
        .unwrap();
    table
        .next_hop_reachable(VrfId::DEFAULT, addr(1), InterfaceId::new(1), mac(1), port(7))
        .unwrap();
    let member = table.next_hop_egress_id(&key(1)).unwrap();
    assert_eq!(sim.ecmp_members(group_id).unwrap().len(), 1);

    table
        .next_hop_unreachable(VrfId::DEFAULT, addr(1), InterfaceId::new(1))
        .unwrap();

    // No punt member remains in the group and the egress itself punts.
    assert!(sim.ecmp_members(group_id).unwrap().is_empty());
    assert!(sim.egress(member).unwrap().is_punt_to_cpu());
    assert!(!table.resolution().is_resolved(member));
}

#[test]
fn test_trunk_member_shrink() {
    let sim = Arc::new(SimSwitch::new());
    let hal = make_hal(&sim, L3Config::default());

    let group_id = {
        let mut table = hal.lock();
        let nexthops: RouteNextHopSet = [spec(1), spec(2)].into_iter().collect();
        let group_id = table
            .acquire_multi_path(VrfId::DEFAULT, nexthops)
            .unwrap();
        table
            .next_hop_reachable(
                VrfId::DEFAULT,
                addr(1),
                InterfaceId::new(1),
                mac(1),
                PortDescriptor::Aggregate(swhal_types::TrunkId::new(3)),
            )
            .unwrap();
        group_id
    };
    assert_eq!(sim.ecmp_members(group_id).unwrap().len(), 1);

    // The trunk drops below minimum links; the callback context removes
    // the member without the lock.
    let handle = hal.link_scan_handle();
    let removed = handle
        .trunk_down_hw_not_locked(swhal_types::TrunkId::new(3))
        .unwrap();
    assert_eq!(removed, 1);
    assert!(sim.ecmp_members(group_id).unwrap().is_empty());
}
