//! Reference-counted entity arena.
//!
//! Shared ownership of next hops and multi-path next hops is expressed as
//! an explicit arena keyed by entity identity: `acquire` increments or
//! inserts, `release` decrements and removes at zero. The map never creates
//! entries implicitly, so "exactly one live instance per key" is enforced
//! structurally rather than by convention, and a removal hands the value
//! back so the caller can tear down its hardware state.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug)]
struct RefEntry<V> {
    value: V,
    ref_count: u32,
}

/// Outcome of a [`RefMap::release`].
#[derive(Debug)]
pub enum Release<V> {
    /// The last reference was dropped; the value is handed back for teardown.
    Removed(V),
    /// Other references remain; the new count is returned.
    StillHeld(u32),
}

/// A reference-counted map from entity key to entity.
#[derive(Debug, Default)]
pub struct RefMap<K, V> {
    inner: HashMap<K, RefEntry<V>>,
}

impl<K, V> RefMap<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        RefMap {
            inner: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.contains_key(key)
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.inner.get(key).map(|entry| &entry.value)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.inner.get_mut(key).map(|entry| &mut entry.value)
    }

    /// Returns the reference count for `key`, if present.
    pub fn ref_count(&self, key: &K) -> Option<u32> {
        self.inner.get(key).map(|entry| entry.ref_count)
    }

    /// Acquires `key`, creating the value with `create` on first reference.
    ///
    /// Returns the reference count after the acquire along with the value.
    /// A failed `create` leaves the map unchanged.
    pub fn acquire_with<E, F>(&mut self, key: K, create: F) -> Result<(u32, &mut V), E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        match self.inner.entry(key) {
            Entry::Occupied(occupied) => {
                let entry = occupied.into_mut();
                entry.ref_count += 1;
                Ok((entry.ref_count, &mut entry.value))
            }
            Entry::Vacant(vacant) => {
                let value = create()?;
                let entry = vacant.insert(RefEntry {
                    value,
                    ref_count: 1,
                });
                Ok((1, &mut entry.value))
            }
        }
    }

    /// Increments the reference count of an existing entry.
    pub fn acquire_existing(&mut self, key: &K) -> Option<u32> {
        self.inner.get_mut(key).map(|entry| {
            entry.ref_count += 1;
            entry.ref_count
        })
    }

    /// Inserts a fresh entry with a reference count of one.
    ///
    /// Returns the value back unchanged if the key is already present.
    pub fn insert_new(&mut self, key: K, value: V) -> Result<(), V> {
        match self.inner.entry(key) {
            Entry::Occupied(_) => Err(value),
            Entry::Vacant(vacant) => {
                vacant.insert(RefEntry {
                    value,
                    ref_count: 1,
                });
                Ok(())
            }
        }
    }

    /// Releases one reference to `key`.
    ///
    /// Returns `None` when the key is absent.
    pub fn release(&mut self, key: &K) -> Option<Release<V>> {
        let count = {
            let entry = self.inner.get_mut(key)?;
            if entry.ref_count > 1 {
                entry.ref_count -= 1;
                Some(entry.ref_count)
            } else {
                None
            }
        };
        match count {
            Some(remaining) => Some(Release::StillHeld(remaining)),
            None => self
                .inner
                .remove(key)
                .map(|entry| Release::Removed(entry.value)),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.inner.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.inner.iter().map(|(k, entry)| (k, &entry.value))
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.inner.values().map(|entry| &entry.value)
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.inner.values_mut().map(|entry| &mut entry.value)
    }
}
