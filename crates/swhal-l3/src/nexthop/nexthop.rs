//! Single next-hop handles.

use crate::egress::{EgressObject, PortDescriptor};
use crate::nexthop::types::HostKey;
use crate::warmboot::WarmBootCache;
use log::debug;
use std::net::IpAddr;
use std::sync::Arc;
use swhal_sdk::{
    check, check_remove, EgressId, HardwareFault, HostRecord, L3Flags, L3IntfId, SdkStatus,
    SwitchSdk,
};
use swhal_types::MacAddress;

/// A shared handle binding one next-hop key to exactly one egress entry.
///
/// Next hops are held in the reference-counted table; every route or group
/// that needs the same key shares this object. The plain (unlabeled)
/// variant also owns the hardware host entry for its address, so traffic to
/// an unresolved neighbor traps to the CPU and triggers discovery.
#[derive(Debug)]
pub struct NextHop {
    sdk: Arc<dyn SwitchSdk>,
    unit: i32,
    key: HostKey,
    egress: EgressObject,
    multipath: bool,
    host_added: bool,
}

impl NextHop {
    pub fn new(sdk: Arc<dyn SwitchSdk>, unit: i32, key: HostKey, multipath: bool) -> Self {
        let egress = EgressObject::new(Arc::clone(&sdk), unit, key.clone());
        NextHop {
            sdk,
            unit,
            key,
            egress,
            multipath,
            host_added: false,
        }
    }

    pub fn key(&self) -> &HostKey {
        &self.key
    }

    pub fn egress_id(&self) -> EgressId {
        self.egress.id()
    }

    pub fn port(&self) -> Option<PortDescriptor> {
        self.egress.port()
    }

    pub fn is_programmed(&self) -> bool {
        self.egress.is_programmed()
    }

    /// Programs the egress to punt while resolution is pending (or after it
    /// was lost).
    pub fn program_to_cpu(
        &mut self,
        warm_boot: &mut WarmBootCache,
        intf: L3IntfId,
    ) -> Result<bool, HardwareFault> {
        let wrote = self.egress.program_to_cpu(warm_boot, intf)?;
        self.ensure_host(warm_boot)?;
        Ok(wrote)
    }

    /// Programs the egress to discard.
    pub fn program_to_drop(
        &mut self,
        warm_boot: &mut WarmBootCache,
        intf: L3IntfId,
    ) -> Result<bool, HardwareFault> {
        let wrote = self.egress.program_to_drop(warm_boot, intf)?;
        self.ensure_host(warm_boot)?;
        Ok(wrote)
    }

    /// The neighbor resolved: program the egress toward `mac` out `port`.
    pub fn program_to_port(
        &mut self,
        warm_boot: &mut WarmBootCache,
        intf: L3IntfId,
        mac: MacAddress,
        port: PortDescriptor,
    ) -> Result<bool, HardwareFault> {
        let wrote = self.egress.program_to_port(warm_boot, intf, mac, port)?;
        self.ensure_host(warm_boot)?;
        Ok(wrote)
    }

    fn host_record(&self) -> HostRecord {
        let mut flags = L3Flags::NONE;
        if matches!(self.key.addr(), IpAddr::V6(_)) {
            flags |= L3Flags::IPV6;
        }
        if self.multipath {
            flags |= L3Flags::MULTIPATH;
        }
        HostRecord {
            vrf: self.key.vrf(),
            addr: self.key.addr(),
            egress_id: self.egress.id(),
            flags,
        }
    }

    /// Adds the hardware host entry pointing at this next hop's egress.
    ///
    /// Labeled next hops carry no host entry; they are reached through
    /// label switching, not the host table. A warm-boot cached entry that
    /// matches is claimed silently; one that differs is a fault, because
    /// host entries never legitimately change across a restart.
    fn ensure_host(&mut self, warm_boot: &mut WarmBootCache) -> Result<(), HardwareFault> {
        if self.host_added || !self.key.is_unlabeled() {
            return Ok(());
        }
        let record = self.host_record();
        if let Some(existing) = warm_boot.find_host(self.key.vrf(), self.key.addr()) {
            let equivalent = existing.egress_id == record.egress_id
                && existing.flags.contains(L3Flags::IPV6) == record.flags.contains(L3Flags::IPV6)
                && existing.flags.contains(L3Flags::MULTIPATH)
                    == record.flags.contains(L3Flags::MULTIPATH);
            if !equivalent {
                return Err(HardwareFault {
                    unit: self.unit,
                    op: "l3_host_add",
                    key: self.key.to_string(),
                    status: SdkStatus::Exists,
                });
            }
            debug!("host entry for {} already exists", self.key);
            warm_boot.programmed_host(self.key.vrf(), self.key.addr());
        } else {
            check(
                self.unit,
                "l3_host_add",
                &self.key,
                self.sdk.l3_host_add(self.unit, &record),
            )?;
            debug!("added host entry for {} at egress {}", self.key, record.egress_id);
        }
        self.host_added = true;
        Ok(())
    }

    /// Tears down the hardware host entry and egress object.
    pub fn destroy_hw(&mut self) -> Result<(), HardwareFault> {
        if self.host_added {
            // A racing warm-boot cleanup may already have removed the
            // entry; that satisfies the postcondition.
            check_remove(
                self.unit,
                "l3_host_delete",
                &self.key,
                self.sdk
                    .l3_host_delete(self.unit, self.key.vrf(), self.key.addr()),
            )?;
            self.host_added = false;
        }
        self.egress.destroy_hw()
    }
}
