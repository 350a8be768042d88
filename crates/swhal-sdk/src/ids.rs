//! Type-safe hardware object handles.
//!
//! The SDK identifies programmed objects by small integers in per-type
//! handle spaces. The phantom type parameter prevents passing, say, an L2
//! station handle where an egress handle is expected. Egress objects and
//! ECMP groups deliberately share one kind: both live in the interface-ID
//! handle space, and a route consumes either interchangeably.

use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;

/// Marker trait for hardware object kinds.
pub trait HwObjectKind: Send + Sync + 'static {
    /// Returns the object type name for diagnostics.
    fn type_name() -> &'static str;
}

/// A type-safe hardware object handle.
///
/// The raw value `-1` is the INVALID sentinel: an object that has not been
/// programmed yet. Once a handle is valid it stays the same for the
/// object's whole lifetime; updates reprogram the same handle in place.
pub struct HwObjectId<K: HwObjectKind> {
    raw: i32,
    _marker: PhantomData<K>,
}

impl<K: HwObjectKind> HwObjectId<K> {
    /// The sentinel for a not-yet-programmed object.
    pub const INVALID: Self = Self {
        raw: -1,
        _marker: PhantomData,
    };

    /// Creates a handle from a raw value, rejecting the sentinel.
    pub fn from_raw(raw: i32) -> Option<Self> {
        if raw == -1 {
            None
        } else {
            Some(Self {
                raw,
                _marker: PhantomData,
            })
        }
    }

    /// Creates a handle from a raw value, including the sentinel.
    pub const fn from_raw_unchecked(raw: i32) -> Self {
        Self {
            raw,
            _marker: PhantomData,
        }
    }

    /// Returns the raw handle value.
    pub const fn as_raw(&self) -> i32 {
        self.raw
    }

    /// Returns true if this is the INVALID sentinel.
    pub const fn is_invalid(&self) -> bool {
        self.raw == -1
    }

    /// Returns true if this handle refers to a programmed object.
    pub const fn is_valid(&self) -> bool {
        self.raw != -1
    }
}

impl<K: HwObjectKind> Clone for HwObjectId<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K: HwObjectKind> Copy for HwObjectId<K> {}

impl<K: HwObjectKind> fmt::Debug for HwObjectId<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", K::type_name(), self.raw)
    }
}

impl<K: HwObjectKind> fmt::Display for HwObjectId<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl<K: HwObjectKind> PartialEq for HwObjectId<K> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<K: HwObjectKind> Eq for HwObjectId<K> {}

impl<K: HwObjectKind> PartialOrd for HwObjectId<K> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: HwObjectKind> Ord for HwObjectId<K> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl<K: HwObjectKind> Hash for HwObjectId<K> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<K: HwObjectKind> Default for HwObjectId<K> {
    fn default() -> Self {
        Self::INVALID
    }
}

macro_rules! define_object_kind {
    ($name:ident, $type_name:literal, $id_alias:ident) => {
        #[derive(Debug, Clone, Copy)]
        pub struct $name;

        impl HwObjectKind for $name {
            fn type_name() -> &'static str {
                $type_name
            }
        }

        pub type $id_alias = HwObjectId<$name>;
    };
}

// Egress objects and ECMP groups share the interface-ID handle space.
define_object_kind!(EgressKind, "Egress", EgressId);
define_object_kind!(L3IntfKind, "L3Intf", L3IntfId);
define_object_kind!(StationKind, "Station", StationId);

/// The platform drop egress entry.
///
/// Created by the platform at init at a fixed handle rather than allocated
/// at runtime, so warm-boot recovery always finds it deterministically.
pub const DEFAULT_DROP_EGRESS_ID: EgressId = EgressId::from_raw_unchecked(100000);

/// The platform punt-to-CPU egress entry. Same convention as the drop entry.
pub const DEFAULT_TO_CPU_EGRESS_ID: EgressId = EgressId::from_raw_unchecked(100001);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_sentinel() {
        assert!(EgressId::INVALID.is_invalid());
        assert!(!EgressId::INVALID.is_valid());
        assert!(EgressId::from_raw(-1).is_none());
        assert!(EgressId::from_raw(100002).unwrap().is_valid());
    }

    #[test]
    fn test_debug_includes_kind() {
        let id = EgressId::from_raw(100002).unwrap();
        assert_eq!(format!("{:?}", id), "Egress(100002)");
        let intf = L3IntfId::from_raw(10).unwrap();
        assert_eq!(format!("{:?}", intf), "L3Intf(10)");
    }

    #[test]
    fn test_platform_defaults_distinct() {
        assert!(DEFAULT_DROP_EGRESS_ID.is_valid());
        assert!(DEFAULT_TO_CPU_EGRESS_ID.is_valid());
        assert_ne!(DEFAULT_DROP_EGRESS_ID, DEFAULT_TO_CPU_EGRESS_ID);
    }
}
