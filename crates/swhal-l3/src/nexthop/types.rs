//! Next-hop identity types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::net::IpAddr;
use swhal_types::{InterfaceId, Label, LabelAction, VrfId};

/// The identity of one next hop: where traffic goes, through which
/// interface, under which VRF, with an optional MPLS label operation.
///
/// At most one live next-hop object exists per distinct key; plain and
/// labeled variants of the same (vrf, addr, intf) are distinct keys and get
/// distinct hardware egress entries.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum HostKey {
    Unlabeled {
        vrf: VrfId,
        addr: IpAddr,
        intf: InterfaceId,
    },
    Labeled {
        vrf: VrfId,
        addr: IpAddr,
        intf: InterfaceId,
        label: LabelAction,
    },
}

impl HostKey {
    pub fn unlabeled(vrf: VrfId, addr: IpAddr, intf: InterfaceId) -> Self {
        HostKey::Unlabeled { vrf, addr, intf }
    }

    pub fn labeled(vrf: VrfId, addr: IpAddr, intf: InterfaceId, label: LabelAction) -> Self {
        HostKey::Labeled {
            vrf,
            addr,
            intf,
            label,
        }
    }

    pub fn vrf(&self) -> VrfId {
        match self {
            HostKey::Unlabeled { vrf, .. } | HostKey::Labeled { vrf, .. } => *vrf,
        }
    }

    pub fn addr(&self) -> IpAddr {
        match self {
            HostKey::Unlabeled { addr, .. } | HostKey::Labeled { addr, .. } => *addr,
        }
    }

    pub fn intf(&self) -> InterfaceId {
        match self {
            HostKey::Unlabeled { intf, .. } | HostKey::Labeled { intf, .. } => *intf,
        }
    }

    pub fn label_action(&self) -> Option<&LabelAction> {
        match self {
            HostKey::Unlabeled { .. } => None,
            HostKey::Labeled { label, .. } => Some(label),
        }
    }

    /// The label the egress entry carries, if any.
    pub fn egress_label(&self) -> Option<Label> {
        self.label_action().and_then(LabelAction::egress_label)
    }

    /// Returns true for the plain (non-MPLS) variant.
    pub fn is_unlabeled(&self) -> bool {
        matches!(self, HostKey::Unlabeled { .. })
    }

    /// Returns true if this key names the neighbor (vrf, addr, intf); all
    /// label variants of one neighbor match.
    pub fn matches_neighbor(&self, vrf: VrfId, addr: IpAddr, intf: InterfaceId) -> bool {
        self.vrf() == vrf && self.addr() == addr && self.intf() == intf
    }

    /// Validates caller-supplied key content.
    pub fn validate(&self) -> Result<(), swhal_types::ParseError> {
        match self.label_action() {
            Some(action) => action.validate(),
            None => Ok(()),
        }
    }
}

impl fmt::Display for HostKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostKey::Unlabeled { vrf, addr, intf } => {
                write!(f, "{}:{}@{}", vrf, addr, intf)
            }
            HostKey::Labeled {
                vrf,
                addr,
                intf,
                label,
            } => write!(f, "{}:{}@{}+{}", vrf, addr, intf, label),
        }
    }
}

/// One next hop as a route provides it: identity plus weight.
///
/// Weight participates in multi-path identity (the same addresses with a
/// different weight distribution are a different group) but not in next-hop
/// identity: every weight shares one underlying egress entry.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct NextHopSpec {
    pub addr: IpAddr,
    pub intf: InterfaceId,
    pub weight: u32,
    pub label_action: Option<LabelAction>,
}

impl NextHopSpec {
    pub fn new(addr: IpAddr, intf: InterfaceId) -> Self {
        NextHopSpec {
            addr,
            intf,
            weight: 1,
            label_action: None,
        }
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_label_action(mut self, action: LabelAction) -> Self {
        self.label_action = Some(action);
        self
    }

    /// Effective unequal-cost weight; zero means default.
    pub fn effective_weight(&self) -> u32 {
        self.weight.max(1)
    }

    /// The next-hop identity key under `vrf`.
    pub fn host_key(&self, vrf: VrfId) -> HostKey {
        match &self.label_action {
            Some(action) => HostKey::labeled(vrf, self.addr, self.intf, action.clone()),
            None => HostKey::unlabeled(vrf, self.addr, self.intf),
        }
    }
}

impl fmt::Display for NextHopSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.addr, self.intf)?;
        if let Some(action) = &self.label_action {
            write!(f, "+{}", action)?;
        }
        if self.weight > 1 {
            write!(f, "x{}", self.weight)?;
        }
        Ok(())
    }
}

/// The set of next hops a route forwards through.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct RouteNextHopSet(BTreeSet<NextHopSpec>);

impl RouteNextHopSet {
    pub fn new() -> Self {
        RouteNextHopSet(BTreeSet::new())
    }

    pub fn insert(&mut self, spec: NextHopSpec) -> bool {
        self.0.insert(spec)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NextHopSpec> {
        self.0.iter()
    }
}

impl FromIterator<NextHopSpec> for RouteNextHopSet {
    fn from_iter<T: IntoIterator<Item = NextHopSpec>>(iter: T) -> Self {
        RouteNextHopSet(iter.into_iter().collect())
    }
}

impl fmt::Display for RouteNextHopSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let specs: Vec<String> = self.0.iter().map(NextHopSpec::to_string).collect();
        write!(f, "{}", specs.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swhal_types::Label;

    fn addr(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_host_key_variants_distinct() {
        let plain = HostKey::unlabeled(VrfId::DEFAULT, addr("10.0.0.1"), InterfaceId::new(5));
        let labeled = HostKey::labeled(
            VrfId::DEFAULT,
            addr("10.0.0.1"),
            InterfaceId::new(5),
            LabelAction::Swap(Label::new(100).unwrap()),
        );
        assert_ne!(plain, labeled);
        assert!(plain.is_unlabeled());
        assert!(!labeled.is_unlabeled());
        assert!(plain.matches_neighbor(VrfId::DEFAULT, addr("10.0.0.1"), InterfaceId::new(5)));
        assert!(labeled.matches_neighbor(VrfId::DEFAULT, addr("10.0.0.1"), InterfaceId::new(5)));
    }

    #[test]
    fn test_host_key_display() {
        let key = HostKey::unlabeled(VrfId::DEFAULT, addr("10.0.0.1"), InterfaceId::new(5));
        assert_eq!(key.to_string(), "vrf0:10.0.0.1@intf5");

        let labeled = HostKey::labeled(
            VrfId::DEFAULT,
            addr("10.0.0.1"),
            InterfaceId::new(5),
            LabelAction::Swap(Label::new(100).unwrap()),
        );
        assert_eq!(labeled.to_string(), "vrf0:10.0.0.1@intf5+swap:100");
    }

    #[test]
    fn test_empty_label_stack_invalid() {
        let key = HostKey::labeled(
            VrfId::DEFAULT,
            addr("10.0.0.1"),
            InterfaceId::new(5),
            LabelAction::Push(vec![]),
        );
        assert!(key.validate().is_err());
    }

    #[test]
    fn test_spec_weight_excluded_from_key() {
        let light = NextHopSpec::new(addr("10.0.0.1"), InterfaceId::new(5));
        let heavy = light.clone().with_weight(5);
        assert_eq!(
            light.host_key(VrfId::DEFAULT),
            heavy.host_key(VrfId::DEFAULT)
        );
        assert_eq!(heavy.effective_weight(), 5);
        assert_eq!(light.clone().with_weight(0).effective_weight(), 1);
    }

    #[test]
    fn test_nexthop_set_identity_includes_weight() {
        let a: RouteNextHopSet =
            [NextHopSpec::new(addr("10.0.0.1"), InterfaceId::new(5)).with_weight(1)]
                .into_iter()
                .collect();
        let b: RouteNextHopSet =
            [NextHopSpec::new(addr("10.0.0.1"), InterfaceId::new(5)).with_weight(3)]
                .into_iter()
                .collect();
        assert_ne!(a, b);
    }
}
