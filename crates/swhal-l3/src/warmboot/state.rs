//! Serialized warm-boot state.
//!
//! Before a planned restart the host table dumps what it owns; the next
//! process instance feeds the dump into [`crate::warmboot::WarmBootCache`]
//! alongside a hardware readback. The dump carries the software identities
//! (keys) that the hardware tables alone cannot reconstruct.

use crate::nexthop::{HostKey, RouteNextHopSet};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use swhal_types::{InterfaceId, LabelAction, VrfId};

/// One dumped next-hop entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostState {
    pub vrf: VrfId,
    pub ip: IpAddr,
    pub intf: InterfaceId,
    #[serde(rename = "egressId")]
    pub egress_id: i32,
    pub port: i32,
    #[serde(
        default,
        rename = "labelAction",
        skip_serializing_if = "Option::is_none"
    )]
    pub label_action: Option<LabelAction>,
}

impl HostState {
    /// Reconstructs the next-hop identity key.
    pub fn host_key(&self) -> HostKey {
        match &self.label_action {
            Some(action) => HostKey::labeled(self.vrf, self.ip, self.intf, action.clone()),
            None => HostKey::unlabeled(self.vrf, self.ip, self.intf),
        }
    }
}

/// One installed member of a dumped ECMP group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EcmpMemberState {
    #[serde(rename = "egressId")]
    pub egress_id: i32,
    pub weight: u32,
}

/// One dumped multi-path next hop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EcmpHostState {
    pub vrf: VrfId,
    pub nexthops: RouteNextHopSet,
    #[serde(rename = "egressId")]
    pub egress_id: i32,
    #[serde(rename = "ecmpEgressId")]
    pub ecmp_egress_id: i32,
    #[serde(default)]
    pub members: Vec<EcmpMemberState>,
}

/// The full state dump.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WarmBootState {
    #[serde(default)]
    pub hosts: Vec<HostState>,
    #[serde(default, rename = "ecmpHosts")]
    pub ecmp_hosts: Vec<EcmpHostState>,
}

impl WarmBootState {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swhal_types::Label;

    #[test]
    fn test_json_round_trip() {
        let state = WarmBootState {
            hosts: vec![HostState {
                vrf: VrfId::DEFAULT,
                ip: "10.0.0.1".parse().unwrap(),
                intf: InterfaceId::new(5),
                egress_id: 100002,
                port: 7,
                label_action: Some(LabelAction::Swap(Label::new(100).unwrap())),
            }],
            ecmp_hosts: vec![EcmpHostState {
                vrf: VrfId::DEFAULT,
                nexthops: RouteNextHopSet::new(),
                egress_id: 200000,
                ecmp_egress_id: 200000,
                members: vec![EcmpMemberState {
                    egress_id: 100002,
                    weight: 3,
                }],
            }],
        };

        let json = state.to_json().unwrap();
        assert!(json.contains("egressId"));
        assert!(json.contains("ecmpEgressId"));

        let parsed = WarmBootState::from_json(&json).unwrap();
        assert_eq!(parsed.hosts.len(), 1);
        assert_eq!(parsed.hosts[0].host_key(), state.hosts[0].host_key());
        assert_eq!(parsed.ecmp_hosts[0].members[0].weight, 3);
    }

    #[test]
    fn test_missing_fields_default() {
        let parsed = WarmBootState::from_json("{}").unwrap();
        assert!(parsed.hosts.is_empty());
        assert!(parsed.ecmp_hosts.is_empty());
    }
}
