//! Shared egress-layer types.

use serde::{Deserialize, Serialize};
use std::fmt;
use swhal_types::{PortId, TrunkId};

/// What an egress entry does with matching traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ForwardAction {
    /// Rewrite and forward out a port or trunk.
    Forward,
    /// Punt to the control-plane CPU.
    ToCpu,
    /// Discard.
    Drop,
}

/// The output an egress entry transmits through: a physical port or a
/// trunk (link aggregation group). Punt and drop entries have no output.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum PortDescriptor {
    Physical(PortId),
    Aggregate(TrunkId),
}

impl PortDescriptor {
    /// Returns the raw port or trunk number.
    pub fn raw(&self) -> i32 {
        match self {
            PortDescriptor::Physical(port) => port.raw(),
            PortDescriptor::Aggregate(trunk) => trunk.raw(),
        }
    }

    /// Returns true if this is a trunk.
    pub fn is_aggregate(&self) -> bool {
        matches!(self, PortDescriptor::Aggregate(_))
    }
}

impl fmt::Display for PortDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortDescriptor::Physical(port) => write!(f, "{}", port),
            PortDescriptor::Aggregate(trunk) => write!(f, "{}", trunk),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_descriptor() {
        let port = PortDescriptor::Physical(PortId::new(7));
        let trunk = PortDescriptor::Aggregate(TrunkId::new(7));

        assert_eq!(port.raw(), trunk.raw());
        assert_ne!(port, trunk);
        assert!(!port.is_aggregate());
        assert!(trunk.is_aggregate());
        assert_eq!(port.to_string(), "port7");
        assert_eq!(trunk.to_string(), "trunk7");
    }
}
