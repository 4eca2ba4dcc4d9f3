//! Concurrent map of `(resource-type, resource-id) -> LockEntry`, one
//! `DashMap` per resource type so unrelated types never contend on the
//! same shard.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::common::{ResourceId, TypeId};
use crate::lock::error::{LockClientError, LockResult};
use crate::lock::locks::LockEntry;

pub struct LockTable {
    maps: Vec<DashMap<ResourceId, LockEntry>>,
}

impl LockTable {
    pub fn new(resource_type_count: usize) -> Self {
        LockTable {
            maps: (0..resource_type_count).map(|_| DashMap::new()).collect(),
        }
    }

    pub fn resource_type_count(&self) -> usize {
        self.maps.len()
    }

    fn map(&self, resource_type: TypeId) -> LockResult<&DashMap<ResourceId, LockEntry>> {
        self.maps
            .get(resource_type)
            .ok_or(LockClientError::UnknownResourceType(resource_type))
    }

    pub fn get(&self, resource_type: TypeId, resource_id: ResourceId) -> Option<LockEntry> {
        self.maps.get(resource_type)?.get(&resource_id).map(|e| e.clone())
    }

    /// Installs `entry` if no entry currently exists for this slot. Returns
    /// the entry that actually ended up there — either the one just
    /// inserted, or whatever another thread beat us to installing.
    pub fn put_if_absent(
        &self,
        resource_type: TypeId,
        resource_id: ResourceId,
        entry: LockEntry,
    ) -> LockResult<LockEntry> {
        let map = self.map(resource_type)?;
        match map.entry(resource_id) {
            Entry::Occupied(occupied) => Ok(occupied.get().clone()),
            Entry::Vacant(vacant) => {
                vacant.insert(entry.clone());
                Ok(entry)
            }
        }
    }

    /// Replaces whatever is in the slot unconditionally. Used for
    /// downgrade (exclusive -> fresh shared) and for installing a grown
    /// shared lock after an update-lock upgrade attempt is abandoned.
    pub fn replace(&self, resource_type: TypeId, resource_id: ResourceId, entry: LockEntry) -> LockResult<()> {
        self.map(resource_type)?.insert(resource_id, entry);
        Ok(())
    }

    /// Removes the slot unconditionally. Only safe for exclusive locks,
    /// where by construction no other client can be holding (only
    /// waiting for) the slot while its sole owner releases it.
    pub fn remove(&self, resource_type: TypeId, resource_id: ResourceId) -> LockResult<()> {
        self.map(resource_type)?.remove(&resource_id);
        Ok(())
    }

    /// Removes the slot, but only if it still holds `expected` and that
    /// lock is dead/empty. Protects against racing with a concurrent
    /// acquire that revived the slot between our last check and the
    /// removal.
    pub fn remove_if_dead(&self, resource_type: TypeId, resource_id: ResourceId) -> LockResult<()> {
        let map = self.map(resource_type)?;
        if let Entry::Occupied(occupied) = map.entry(resource_id) {
            let dead = match occupied.get() {
                LockEntry::Shared(lock) => lock.is_dead(),
                LockEntry::Exclusive(_) => false,
            };
            if dead {
                occupied.remove();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lock::locks::SharedLock;
    use std::sync::Arc;

    #[test]
    fn put_if_absent_installs_once() {
        let table = LockTable::new(1);
        let first = LockEntry::Shared(Arc::new(SharedLock::new(1)));
        let second = LockEntry::Shared(Arc::new(SharedLock::new(2)));
        let installed = table.put_if_absent(0, 7, first).unwrap();
        let observed = table.put_if_absent(0, 7, second).unwrap();
        match (installed, observed) {
            (LockEntry::Shared(a), LockEntry::Shared(b)) => assert!(Arc::ptr_eq(&a, &b)),
            _ => panic!("expected shared locks"),
        }
    }

    #[test]
    fn unknown_resource_type_is_an_error() {
        let table = LockTable::new(1);
        assert!(table.get(5, 1).is_none());
        assert!(table.replace(5, 1, LockEntry::Shared(Arc::new(SharedLock::new(1)))).is_err());
    }

    #[test]
    fn remove_if_dead_clears_empty_shared_locks_only() {
        let table = LockTable::new(1);
        let lock = Arc::new(SharedLock::new(1));
        table.put_if_absent(0, 1, LockEntry::Shared(lock.clone())).unwrap();
        lock.release(1);
        table.remove_if_dead(0, 1).unwrap();
        assert!(table.get(0, 1).is_none());
    }
}
