//! Hardware ECMP egress groups.

use crate::resolution::EgressResolutionTracker;
use crate::warmboot::WarmBootCache;
use log::{debug, warn};
use std::collections::BTreeMap;
use std::sync::Arc;
use swhal_sdk::{check, check_remove, EgressId, HardwareFault, SwitchSdk};

/// Requested membership of an ECMP group: egress ID to weight. Weights
/// above one repeat the member in hardware for unequal-cost balancing.
pub type EgressWeights = BTreeMap<EgressId, u32>;

/// How a group reached its hardware ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcmpProgramOutcome {
    /// A fresh hardware object was created.
    Created,
    /// An equivalent prior-run object was adopted from the warm-boot cache.
    Adopted,
}

/// The hardware table size is allocated in blocks of four entries.
fn round_up_to_table_block(count: u32) -> i32 {
    (count.div_ceil(4) * 4) as i32
}

/// One hardware ECMP object whose installed membership tracks the
/// reachable subset of a logical next-hop set.
///
/// The requested multiset never changes after construction; what changes
/// is which requested members are present in hardware. Unreachable members
/// stay requested but uninstalled, and the group's hardware ID is stable
/// across every membership change.
#[derive(Debug)]
pub struct EcmpEgressGroup {
    sdk: Arc<dyn SwitchSdk>,
    unit: i32,
    id: EgressId,
    requested: EgressWeights,
    installed: EgressWeights,
}

impl EcmpEgressGroup {
    pub fn new(sdk: Arc<dyn SwitchSdk>, unit: i32, requested: EgressWeights) -> Self {
        EcmpEgressGroup {
            sdk,
            unit,
            id: EgressId::INVALID,
            requested,
            installed: EgressWeights::new(),
        }
    }

    pub fn id(&self) -> EgressId {
        self.id
    }

    pub fn requested(&self) -> &EgressWeights {
        &self.requested
    }

    /// Returns true if `id` is a requested member.
    pub fn contains(&self, id: EgressId) -> bool {
        self.requested.contains_key(&id)
    }

    /// Total logical member count, duplicates included.
    pub fn logical_member_count(&self) -> u32 {
        self.requested.values().sum()
    }

    /// Count of member instances currently installed in hardware.
    pub fn installed_member_count(&self) -> u32 {
        self.installed.values().sum()
    }

    fn describe(&self) -> String {
        let members: Vec<String> = self
            .requested
            .iter()
            .map(|(id, weight)| format!("{}x{}", id, weight))
            .collect();
        format!("ecmp[{}]", members.join(","))
    }

    /// Programs the group.
    ///
    /// An equivalent prior-run hardware object (same requested multiset) is
    /// adopted instead of re-created; otherwise the group is created listing
    /// only the members that are currently resolved. Unresolved members are
    /// added later through [`EcmpEgressGroup::path_reachable_hw_locked`].
    pub fn program(
        &mut self,
        warm_boot: &mut WarmBootCache,
        resolution: &EgressResolutionTracker,
    ) -> Result<EcmpProgramOutcome, HardwareFault> {
        if let Some((cached_id, hw_members)) = warm_boot.find_ecmp(&self.requested) {
            debug!(
                "ecmp group {} already at {}, adopting",
                self.describe(),
                cached_id
            );
            self.id = cached_id;
            self.installed = count_members(&hw_members);
            warm_boot.programmed_ecmp(&self.requested);
            return Ok(EcmpProgramOutcome::Adopted);
        }

        let mut members = Vec::new();
        let mut installed = EgressWeights::new();
        for (&member, &weight) in &self.requested {
            if resolution.is_resolved(member) {
                members.extend(std::iter::repeat(member).take(weight as usize));
                installed.insert(member, weight);
            }
        }
        let max_paths = round_up_to_table_block(self.logical_member_count());
        let id = check(
            self.unit,
            "l3_ecmp_create",
            self.describe(),
            self.sdk.l3_ecmp_create(self.unit, max_paths, &members, None),
        )?;
        debug!(
            "created ecmp group {} at {} ({} of {} members installed)",
            self.describe(),
            id,
            members.len(),
            self.logical_member_count()
        );
        self.id = id;
        self.installed = installed;
        Ok(EcmpProgramOutcome::Created)
    }

    /// A requested member became reachable: install it.
    ///
    /// No-op when `id` is not a requested member or is already fully
    /// installed. The delta is computed against the member instances the
    /// hardware actually holds, so a racing not-locked removal cannot cause
    /// a double add. Returns the number of instances added.
    pub fn path_reachable_hw_locked(&mut self, id: EgressId) -> Result<u32, HardwareFault> {
        let Some(&want) = self.requested.get(&id) else {
            return Ok(0);
        };
        let (_, hw_members) = check(
            self.unit,
            "l3_ecmp_get",
            self.describe(),
            self.sdk.l3_ecmp_get(self.unit, self.id),
        )?;
        let have = hw_members.iter().filter(|member| **member == id).count() as u32;
        for _ in have..want {
            check(
                self.unit,
                "l3_ecmp_add",
                format!("{}/{}", self.id, id),
                self.sdk.l3_ecmp_add(self.unit, self.id, id),
            )?;
        }
        self.installed.insert(id, want);
        Ok(want.saturating_sub(have))
    }

    /// A requested member became unreachable: remove every installed
    /// instance.
    ///
    /// A "not found" result from the hardware remove is treated as already
    /// satisfied; link-flap races legitimately cause double removal
    /// attempts. Returns the number of instances removed.
    pub fn path_unreachable_hw_locked(&mut self, id: EgressId) -> Result<u32, HardwareFault> {
        if !self.requested.contains_key(&id) {
            return Ok(0);
        }
        let removed =
            Self::remove_egress_id_hw_not_locked(self.sdk.as_ref(), self.unit, self.id, id)?;
        self.installed.remove(&id);
        Ok(removed)
    }

    /// Removes every instance of `member` from the hardware group without
    /// touching any software state.
    ///
    /// This is the only group operation legal without the hardware-update
    /// lock. Link-scan callbacks cannot take that lock, so their link-down
    /// handling calls this against the hardware table directly; the locked
    /// paths tolerate the resulting divergence because installs re-read
    /// hardware membership and removes treat "not found" as success.
    pub fn remove_egress_id_hw_not_locked(
        sdk: &dyn SwitchSdk,
        unit: i32,
        group: EgressId,
        member: EgressId,
    ) -> Result<u32, HardwareFault> {
        let mut removed = 0;
        loop {
            let present = check_remove(
                unit,
                "l3_ecmp_delete",
                format!("{}/{}", group, member),
                sdk.l3_ecmp_delete(unit, group, member),
            )?;
            if !present {
                break;
            }
            removed += 1;
        }
        if removed > 0 {
            debug!("removed {} instance(s) of {} from ecmp {}", removed, member, group);
        }
        Ok(removed)
    }

    /// Destroys the hardware object.
    pub fn destroy_hw(&mut self) -> Result<(), HardwareFault> {
        if self.id.is_invalid() {
            return Ok(());
        }
        check(
            self.unit,
            "l3_ecmp_destroy",
            self.describe(),
            self.sdk.l3_ecmp_destroy(self.unit, self.id),
        )?;
        debug!("destroyed ecmp group {} at {}", self.describe(), self.id);
        self.id = EgressId::INVALID;
        self.installed.clear();
        Ok(())
    }
}

impl Drop for EcmpEgressGroup {
    fn drop(&mut self) {
        if self.id.is_valid() {
            warn!("ecmp group {} dropped without hardware teardown", self.id);
        }
    }
}

fn count_members(members: &[EgressId]) -> EgressWeights {
    let mut counts = EgressWeights::new();
    for member in members {
        *counts.entry(*member).or_insert(0) += 1;
    }
    counts
}
