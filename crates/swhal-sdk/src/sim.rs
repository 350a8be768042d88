//! In-memory software implementation of the SDK boundary.
//!
//! `SimSwitch` stands in for the vendor SDK in tests and software-only
//! deployments: it keeps the L3 tables in plain maps, allocates handles the
//! way the hardware does, and counts every programming call so tests can
//! assert not just on final state but on how many hardware writes it took
//! to get there.

use crate::api::SwitchSdk;
use crate::ids::{EgressId, DEFAULT_DROP_EGRESS_ID, DEFAULT_TO_CPU_EGRESS_ID};
use crate::records::{
    EcmpRecord, EgressRecord, HostRecord, L3Flags, L3IntfRecord, RouteRecord, StationRecord,
};
use crate::status::{SdkResult, SdkStatus};
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::sync::Mutex;
use swhal_types::VrfId;

/// Programming operations that can be failure-injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimOp {
    EgressCreate,
    EgressDestroy,
    EcmpCreate,
    EcmpAdd,
    EcmpDelete,
    EcmpDestroy,
    HostAdd,
    HostDelete,
}

/// Per-operation call counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimCounters {
    pub egress_create: u64,
    pub egress_destroy: u64,
    pub ecmp_create: u64,
    pub ecmp_add: u64,
    pub ecmp_delete: u64,
    pub ecmp_destroy: u64,
    pub host_add: u64,
    pub host_delete: u64,
}

#[derive(Debug, Default)]
struct Inner {
    egresses: BTreeMap<i32, EgressRecord>,
    ecmps: BTreeMap<i32, (EcmpRecord, Vec<EgressId>)>,
    hosts: BTreeMap<(VrfId, IpAddr), HostRecord>,
    routes: Vec<RouteRecord>,
    intfs: Vec<L3IntfRecord>,
    stations: Vec<StationRecord>,
    next_egress: i32,
    next_ecmp: i32,
    counters: SimCounters,
    fail_next: Option<(SimOp, SdkStatus)>,
}

impl Inner {
    fn take_failure(&mut self, op: SimOp) -> Option<SdkStatus> {
        match self.fail_next {
            Some((fail_op, status)) if fail_op == op => {
                self.fail_next = None;
                Some(status)
            }
            _ => None,
        }
    }

    fn reserve_id(&mut self, raw: i32) {
        if raw >= self.next_egress {
            self.next_egress = raw + 1;
        }
        if raw >= self.next_ecmp {
            self.next_ecmp = raw + 1;
        }
    }
}

/// An in-memory switch.
#[derive(Debug)]
pub struct SimSwitch {
    inner: Mutex<Inner>,
}

impl SimSwitch {
    fn guard(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Creates a switch with the two platform default egress entries seeded
    /// at their well-known handles.
    pub fn new() -> Self {
        let mut inner = Inner {
            next_egress: DEFAULT_TO_CPU_EGRESS_ID.as_raw() + 1,
            next_ecmp: 200000,
            ..Inner::default()
        };
        inner.egresses.insert(
            DEFAULT_DROP_EGRESS_ID.as_raw(),
            EgressRecord {
                intf: crate::ids::L3IntfId::INVALID,
                mac: None,
                port: 0,
                flags: L3Flags::DST_DISCARD,
                label: None,
            },
        );
        inner.egresses.insert(
            DEFAULT_TO_CPU_EGRESS_ID.as_raw(),
            EgressRecord {
                intf: crate::ids::L3IntfId::INVALID,
                mac: None,
                port: 0,
                flags: L3Flags::COPY_TO_CPU,
                label: None,
            },
        );
        SimSwitch {
            inner: Mutex::new(inner),
        }
    }

    /// Returns a snapshot of the call counters.
    pub fn counters(&self) -> SimCounters {
        self.guard().counters
    }

    /// Fails the next call of the given operation with `status`.
    pub fn fail_next(&self, op: SimOp, status: SdkStatus) {
        self.guard().fail_next = Some((op, status));
    }

    /// Returns the egress record at `id`, if programmed.
    pub fn egress(&self, id: EgressId) -> Option<EgressRecord> {
        self.guard().egresses.get(&id.as_raw()).cloned()
    }

    /// Returns the member list of the group, if programmed.
    pub fn ecmp_members(&self, group: EgressId) -> Option<Vec<EgressId>> {
        self.guard()
            .ecmps
            .get(&group.as_raw())
            .map(|(_, members)| members.clone())
    }

    /// Returns the table size requested when the group was created.
    pub fn ecmp_max_paths(&self, group: EgressId) -> Option<i32> {
        self.guard()
            .ecmps
            .get(&group.as_raw())
            .map(|(record, _)| record.max_paths)
    }

    /// Returns true if a host entry exists for (vrf, addr).
    pub fn has_host(&self, vrf: VrfId, addr: IpAddr) -> bool {
        self.guard().hosts.contains_key(&(vrf, addr))
    }

    // Seeding of prior-run state for warm-boot tests.

    pub fn seed_egress(&self, id: EgressId, record: EgressRecord) {
        let mut inner = self.guard();
        inner.reserve_id(id.as_raw());
        inner.egresses.insert(id.as_raw(), record);
    }

    pub fn seed_ecmp(&self, id: EgressId, max_paths: i32, members: Vec<EgressId>) {
        let mut inner = self.guard();
        inner.reserve_id(id.as_raw());
        inner.ecmps.insert(
            id.as_raw(),
            (
                EcmpRecord {
                    max_paths,
                    flags: L3Flags::MULTIPATH,
                },
                members,
            ),
        );
    }

    pub fn seed_host(&self, record: HostRecord) {
        let mut inner = self.guard();
        inner.hosts.insert((record.vrf, record.addr), record);
    }

    pub fn seed_route(&self, record: RouteRecord) {
        self.guard().routes.push(record);
    }

    pub fn seed_l3_intf(&self, record: L3IntfRecord) {
        self.guard().intfs.push(record);
    }

    pub fn seed_station(&self, record: StationRecord) {
        self.guard().stations.push(record);
    }
}

impl Default for SimSwitch {
    fn default() -> Self {
        Self::new()
    }
}

impl SwitchSdk for SimSwitch {
    fn l3_egress_create(
        &self,
        _unit: i32,
        flags: L3Flags,
        record: &EgressRecord,
        id: Option<EgressId>,
    ) -> SdkResult<EgressId> {
        let mut inner = self.guard();
        if let Some(status) = inner.take_failure(SimOp::EgressCreate) {
            return Err(status);
        }
        inner.counters.egress_create += 1;

        let raw = match id {
            Some(id) if flags.contains(L3Flags::WITH_ID) => {
                if flags.contains(L3Flags::REPLACE) && !inner.egresses.contains_key(&id.as_raw()) {
                    return Err(SdkStatus::NotFound);
                }
                id.as_raw()
            }
            Some(_) => return Err(SdkStatus::Param),
            None => {
                let raw = inner.next_egress;
                inner.next_egress += 1;
                raw
            }
        };
        inner.egresses.insert(raw, record.clone());
        Ok(EgressId::from_raw_unchecked(raw))
    }

    fn l3_egress_destroy(&self, _unit: i32, id: EgressId) -> SdkResult<()> {
        let mut inner = self.guard();
        if let Some(status) = inner.take_failure(SimOp::EgressDestroy) {
            return Err(status);
        }
        inner.counters.egress_destroy += 1;
        match inner.egresses.remove(&id.as_raw()) {
            Some(_) => Ok(()),
            None => Err(SdkStatus::NotFound),
        }
    }

    fn l3_egress_get(&self, _unit: i32, id: EgressId) -> SdkResult<EgressRecord> {
        self.guard()
            .egresses
            .get(&id.as_raw())
            .cloned()
            .ok_or(SdkStatus::NotFound)
    }

    fn l3_egress_find_all(&self, _unit: i32) -> SdkResult<Vec<(EgressId, EgressRecord)>> {
        Ok(self
            .guard()
            .egresses
            .iter()
            .map(|(raw, record)| (EgressId::from_raw_unchecked(*raw), record.clone()))
            .collect())
    }

    fn l3_ecmp_create(
        &self,
        _unit: i32,
        max_paths: i32,
        members: &[EgressId],
        id: Option<EgressId>,
    ) -> SdkResult<EgressId> {
        let mut inner = self.guard();
        if let Some(status) = inner.take_failure(SimOp::EcmpCreate) {
            return Err(status);
        }
        inner.counters.ecmp_create += 1;

        let raw = match id {
            Some(id) => id.as_raw(),
            None => {
                let raw = inner.next_ecmp;
                inner.next_ecmp += 1;
                raw
            }
        };
        inner.ecmps.insert(
            raw,
            (
                EcmpRecord {
                    max_paths,
                    flags: L3Flags::MULTIPATH,
                },
                members.to_vec(),
            ),
        );
        Ok(EgressId::from_raw_unchecked(raw))
    }

    fn l3_ecmp_destroy(&self, _unit: i32, group: EgressId) -> SdkResult<()> {
        let mut inner = self.guard();
        if let Some(status) = inner.take_failure(SimOp::EcmpDestroy) {
            return Err(status);
        }
        inner.counters.ecmp_destroy += 1;
        match inner.ecmps.remove(&group.as_raw()) {
            Some(_) => Ok(()),
            None => Err(SdkStatus::NotFound),
        }
    }

    fn l3_ecmp_add(&self, _unit: i32, group: EgressId, member: EgressId) -> SdkResult<()> {
        let mut inner = self.guard();
        if let Some(status) = inner.take_failure(SimOp::EcmpAdd) {
            return Err(status);
        }
        inner.counters.ecmp_add += 1;
        match inner.ecmps.get_mut(&group.as_raw()) {
            Some((_, members)) => {
                members.push(member);
                Ok(())
            }
            None => Err(SdkStatus::NotFound),
        }
    }

    fn l3_ecmp_delete(&self, _unit: i32, group: EgressId, member: EgressId) -> SdkResult<()> {
        let mut inner = self.guard();
        if let Some(status) = inner.take_failure(SimOp::EcmpDelete) {
            return Err(status);
        }
        inner.counters.ecmp_delete += 1;
        match inner.ecmps.get_mut(&group.as_raw()) {
            Some((_, members)) => match members.iter().position(|m| *m == member) {
                Some(pos) => {
                    members.remove(pos);
                    Ok(())
                }
                None => Err(SdkStatus::NotFound),
            },
            None => Err(SdkStatus::NotFound),
        }
    }

    fn l3_ecmp_get(&self, _unit: i32, group: EgressId) -> SdkResult<(EcmpRecord, Vec<EgressId>)> {
        self.guard()
            .ecmps
            .get(&group.as_raw())
            .cloned()
            .ok_or(SdkStatus::NotFound)
    }

    fn l3_ecmp_find_all(
        &self,
        _unit: i32,
    ) -> SdkResult<Vec<(EgressId, EcmpRecord, Vec<EgressId>)>> {
        Ok(self
            .guard()
            .ecmps
            .iter()
            .map(|(raw, (record, members))| {
                (EgressId::from_raw_unchecked(*raw), *record, members.clone())
            })
            .collect())
    }

    fn l3_host_add(&self, _unit: i32, record: &HostRecord) -> SdkResult<()> {
        let mut inner = self.guard();
        if let Some(status) = inner.take_failure(SimOp::HostAdd) {
            return Err(status);
        }
        inner.counters.host_add += 1;
        let key = (record.vrf, record.addr);
        if inner.hosts.contains_key(&key) {
            return Err(SdkStatus::Exists);
        }
        inner.hosts.insert(key, record.clone());
        Ok(())
    }

    fn l3_host_delete(&self, _unit: i32, vrf: VrfId, addr: IpAddr) -> SdkResult<()> {
        let mut inner = self.guard();
        if let Some(status) = inner.take_failure(SimOp::HostDelete) {
            return Err(status);
        }
        inner.counters.host_delete += 1;
        match inner.hosts.remove(&(vrf, addr)) {
            Some(_) => Ok(()),
            None => Err(SdkStatus::NotFound),
        }
    }

    fn l3_host_find_all(&self, _unit: i32) -> SdkResult<Vec<HostRecord>> {
        Ok(self.guard().hosts.values().cloned().collect())
    }

    fn l3_route_find_all(&self, _unit: i32) -> SdkResult<Vec<RouteRecord>> {
        Ok(self.guard().routes.clone())
    }

    fn l3_intf_find_all(&self, _unit: i32) -> SdkResult<Vec<L3IntfRecord>> {
        Ok(self.guard().intfs.clone())
    }

    fn l2_station_find_all(&self, _unit: i32) -> SdkResult<Vec<StationRecord>> {
        Ok(self.guard().stations.clone())
    }
}
