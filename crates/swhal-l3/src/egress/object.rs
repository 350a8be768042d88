//! Single hardware egress entries.

use crate::egress::types::{ForwardAction, PortDescriptor};
use crate::nexthop::HostKey;
use crate::warmboot::WarmBootCache;
use log::{debug, error};
use std::sync::Arc;
use swhal_sdk::{
    check, EgressId, EgressRecord, HardwareFault, L3Flags, L3IntfId, SwitchSdk,
    DEFAULT_DROP_EGRESS_ID, DEFAULT_TO_CPU_EGRESS_ID,
};
use swhal_types::MacAddress;

/// One hardware egress entry, owned for its whole lifetime.
///
/// The hardware ID starts INVALID and becomes immutable after the first
/// successful create; every later update replaces the entry at the same ID
/// in place. Intended state (MAC, output, action) lives here alongside the
/// last record actually written to hardware, which is what makes the
/// skip-if-equivalent checks possible.
///
/// Skipping redundant writes is a correctness requirement, not a
/// performance tweak: re-issuing an identical create/replace has been seen
/// to transiently break forwarding on the target hardware.
#[derive(Debug)]
pub struct EgressObject {
    sdk: Arc<dyn SwitchSdk>,
    unit: i32,
    key: HostKey,
    id: EgressId,
    intf: Option<L3IntfId>,
    mac: Option<MacAddress>,
    port: Option<PortDescriptor>,
    action: ForwardAction,
    /// The record currently programmed at `id`, if any.
    programmed: Option<EgressRecord>,
}

impl EgressObject {
    pub fn new(sdk: Arc<dyn SwitchSdk>, unit: i32, key: HostKey) -> Self {
        EgressObject {
            sdk,
            unit,
            key,
            id: EgressId::INVALID,
            intf: None,
            mac: None,
            port: None,
            action: ForwardAction::ToCpu,
            programmed: None,
        }
    }

    pub fn id(&self) -> EgressId {
        self.id
    }

    pub fn key(&self) -> &HostKey {
        &self.key
    }

    pub fn port(&self) -> Option<PortDescriptor> {
        self.port
    }

    pub fn mac(&self) -> Option<MacAddress> {
        self.mac
    }

    /// The hardware interface the entry was last programmed against.
    pub fn hw_intf(&self) -> Option<L3IntfId> {
        self.intf
    }

    pub fn action(&self) -> ForwardAction {
        self.action
    }

    /// Returns true once the entry has been written to (or adopted from)
    /// hardware.
    pub fn is_programmed(&self) -> bool {
        self.programmed.is_some()
    }

    /// Intended state becomes FORWARD to `mac` out `port`.
    pub fn program_to_port(
        &mut self,
        warm_boot: &mut WarmBootCache,
        intf: L3IntfId,
        mac: MacAddress,
        port: PortDescriptor,
    ) -> Result<bool, HardwareFault> {
        self.program(warm_boot, intf, Some(mac), Some(port), ForwardAction::Forward)
    }

    /// Intended state becomes punt-to-CPU with no MAC or output.
    pub fn program_to_cpu(
        &mut self,
        warm_boot: &mut WarmBootCache,
        intf: L3IntfId,
    ) -> Result<bool, HardwareFault> {
        self.program(warm_boot, intf, None, None, ForwardAction::ToCpu)
    }

    /// Intended state becomes discard with no MAC or output.
    pub fn program_to_drop(
        &mut self,
        warm_boot: &mut WarmBootCache,
        intf: L3IntfId,
    ) -> Result<bool, HardwareFault> {
        self.program(warm_boot, intf, None, None, ForwardAction::Drop)
    }

    /// Common programming routine. Returns true when a hardware write was
    /// actually issued.
    fn program(
        &mut self,
        warm_boot: &mut WarmBootCache,
        intf: L3IntfId,
        mac: Option<MacAddress>,
        port: Option<PortDescriptor>,
        action: ForwardAction,
    ) -> Result<bool, HardwareFault> {
        let record = self.make_record(intf, mac, port, action);

        if self.id.is_invalid() {
            if let Some((cached_id, existing)) = warm_boot.find_egress_from_host(&self.key) {
                self.id = cached_id;
                warm_boot.programmed_egress_from_host(&self.key);
                if Self::warm_boot_equivalent(&record, &existing) {
                    debug!(
                        "egress entry for {} already at {}, skipping program",
                        self.key, cached_id
                    );
                    self.programmed = Some(existing);
                    self.set_intent(intf, mac, port, action);
                    return Ok(false);
                }
            }
        }

        if self.id.is_valid() && self.programmed.as_ref() == Some(&record) {
            debug!("egress {} for {} unchanged, skipping program", self.id, self.key);
            self.set_intent(intf, mac, port, action);
            return Ok(false);
        }

        let (call_flags, with_id) = if self.id.is_valid() {
            (L3Flags::REPLACE | L3Flags::WITH_ID, Some(self.id))
        } else {
            (L3Flags::NONE, None)
        };
        let id = check(
            self.unit,
            "l3_egress_create",
            &self.key,
            self.sdk.l3_egress_create(self.unit, call_flags, &record, with_id),
        )?;
        if self.id.is_invalid() {
            self.id = id;
        }
        debug!("programmed egress {} for {}", self.id, self.key);
        self.programmed = Some(record);
        self.set_intent(intf, mac, port, action);
        Ok(true)
    }

    fn set_intent(
        &mut self,
        intf: L3IntfId,
        mac: Option<MacAddress>,
        port: Option<PortDescriptor>,
        action: ForwardAction,
    ) {
        self.intf = Some(intf);
        self.mac = mac;
        self.port = port;
        self.action = action;
    }

    fn make_record(
        &self,
        intf: L3IntfId,
        mac: Option<MacAddress>,
        port: Option<PortDescriptor>,
        action: ForwardAction,
    ) -> EgressRecord {
        let mut flags = L3Flags::NONE;
        if self.key.addr().is_ipv6() {
            flags |= L3Flags::IPV6;
        }
        match action {
            ForwardAction::Forward => {}
            ForwardAction::ToCpu => flags |= L3Flags::COPY_TO_CPU,
            ForwardAction::Drop => flags |= L3Flags::DST_DISCARD,
        }
        if matches!(port, Some(PortDescriptor::Aggregate(_))) {
            flags |= L3Flags::TRUNK;
        }
        let label = self.key.egress_label();
        if label.is_some() {
            flags |= L3Flags::ROUTE_LABEL;
        }
        EgressRecord {
            intf,
            mac,
            port: port.map(|p| p.raw()).unwrap_or(0),
            flags,
            label,
        }
    }

    /// Compares an intended record against one found during warm-boot
    /// recovery.
    ///
    /// A punt entry on either side compares equal regardless of the other
    /// fields: recovery never downgrades a live forwarding entry to punt,
    /// and a stale punt entry is upgraded once the owning next hop signals
    /// reachable. Otherwise the records must match exactly.
    fn warm_boot_equivalent(new: &EgressRecord, existing: &EgressRecord) -> bool {
        if new.is_punt_to_cpu() || existing.is_punt_to_cpu() {
            return true;
        }
        new.mac == existing.mac
            && new.port == existing.port
            && new.intf == existing.intf
            && new.label == existing.label
            && new.is_trunk() == existing.is_trunk()
            && new.is_drop() == existing.is_drop()
    }

    /// Deletes the hardware entry. The platform default drop and punt
    /// entries are never deleted.
    pub fn destroy_hw(&mut self) -> Result<(), HardwareFault> {
        if self.id.is_invalid() || self.programmed.is_none() {
            self.id = EgressId::INVALID;
            return Ok(());
        }
        if self.id == DEFAULT_DROP_EGRESS_ID || self.id == DEFAULT_TO_CPU_EGRESS_ID {
            self.programmed = None;
            return Ok(());
        }
        check(
            self.unit,
            "l3_egress_destroy",
            &self.key,
            self.sdk.l3_egress_destroy(self.unit, self.id),
        )?;
        debug!("destroyed egress {} for {}", self.id, self.key);
        self.id = EgressId::INVALID;
        self.programmed = None;
        Ok(())
    }
}

impl Drop for EgressObject {
    fn drop(&mut self) {
        if self.id.is_valid() && self.programmed.is_some() {
            error!(
                "egress {} for {} dropped without hardware teardown",
                self.id, self.key
            );
        }
    }
}
