//! Lock instances held in a `LockTable` slot.
//!
//! A `SharedLock` tracks a holder count per client (reentrancy) plus an
//! optional single update-lock holder. An `ExclusiveLock` is a single,
//! reusable, per-client object — there is exactly one per `Client`, reused
//! across every resource that client holds exclusively, since only one
//! client can ever own the slot at a time.

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use crate::common::{ClientId, ResourceId, TypeId, NO_CLIENT};
use crate::lock::directory::ClientDirectory;
use crate::lock::lock_table::LockTable;
use crate::lock::wait_set::WaitSet;

/// A shared (read) lock on one resource. Holds any number of distinct
/// clients, each with its own reentrancy count, plus at most one of them
/// also holding the update-lock reservation.
pub struct SharedLock {
    holders: DashMap<ClientId, u32>,
    update_holder: AtomicI32,
    /// Set once the last holder releases. A lock in this state must never
    /// be handed out again; the table slot holding it is stale and should
    /// be removed or replaced.
    dead: AtomicBool,
}

impl SharedLock {
    pub fn new(first_holder: ClientId) -> Self {
        let holders = DashMap::new();
        holders.insert(first_holder, 1);
        SharedLock {
            holders,
            update_holder: AtomicI32::new(NO_CLIENT),
            dead: AtomicBool::new(false),
        }
    }

    pub fn is_dead(&self) -> bool {
        self.dead.load(Ordering::Acquire)
    }

    /// Adds `client` as a holder (or bumps its reentrancy count). Fails if
    /// the lock is dead, or if another client already holds the update
    /// reservation.
    pub fn acquire(&self, client: ClientId) -> bool {
        if self.dead.load(Ordering::Acquire) {
            return false;
        }
        let update_holder = self.update_holder.load(Ordering::Acquire);
        if update_holder != NO_CLIENT && update_holder != client {
            return false;
        }
        self.holders
            .entry(client)
            .and_modify(|count| *count = count.saturating_add(1))
            .or_insert(1);
        if self.dead.load(Ordering::Acquire) {
            // Raced with the last other holder releasing between our dead
            // check and our insert. Undo and report failure.
            self.release(client);
            return false;
        }
        true
    }

    /// Decrements `client`'s reentrancy count, removing it once it hits
    /// zero. Returns true once the lock has no holders left (the caller
    /// should remove the table slot, or replace it if it's mid-downgrade).
    pub fn release(&self, client: ClientId) -> bool {
        let mut now_empty = false;
        if let Some(mut entry) = self.holders.get_mut(&client) {
            *entry -= 1;
            if *entry == 0 {
                drop(entry);
                self.holders.remove(&client);
            }
        }
        if self.holders.is_empty() {
            self.dead.store(true, Ordering::Release);
            now_empty = true;
        }
        now_empty
    }

    pub fn number_of_holders(&self) -> usize {
        self.holders.len()
    }

    pub fn is_sole_holder(&self, client: ClientId) -> bool {
        self.holders.len() == 1 && self.holders.contains_key(&client)
    }

    pub fn holds(&self, client: ClientId) -> bool {
        self.holders.contains_key(&client)
    }

    /// Reserves the update-lock slot for `client`. At most one client may
    /// hold it at a time; it does not by itself block new shared holders.
    pub fn try_acquire_update_lock(&self, client: ClientId) -> bool {
        self.update_holder
            .compare_exchange(NO_CLIENT, client, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn release_update_lock(&self, client: ClientId) {
        let _ = self.update_holder.compare_exchange(
            client,
            NO_CLIENT,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    pub fn is_update_lock_held(&self) -> bool {
        self.update_holder.load(Ordering::Acquire) != NO_CLIENT
    }

    pub fn update_lock_holder(&self) -> Option<ClientId> {
        match self.update_holder.load(Ordering::Acquire) {
            NO_CLIENT => None,
            id => Some(id),
        }
    }

    /// ORs every current holder's wait-list into `into`. Used when a new
    /// client starts waiting on this lock: it inherits who its blockers
    /// are themselves (transitively) waiting for.
    pub fn copy_holder_wait_lists_into(&self, into: &WaitSet, directory: &ClientDirectory) {
        for entry in self.holders.iter() {
            if let Some(holder) = directory.get(*entry.key()) {
                into.or_from(holder.wait_list());
            }
        }
    }

    pub fn holder_ids(&self) -> Vec<ClientId> {
        self.holders.iter().map(|e| *e.key()).collect()
    }

    pub fn detect_deadlock(
        &self,
        probe: ClientId,
        directory: &ClientDirectory,
        table: &LockTable,
        budget: usize,
    ) -> Option<ClientId> {
        detect_deadlock_among(self.holder_ids(), probe, directory, table, budget)
    }
}

/// An exclusive (write) lock. A single client holds it; it is re-entrant
/// only in the sense that the same client can be handed back the same
/// `ExclusiveLock` instance on retry.
#[derive(Debug)]
pub struct ExclusiveLock {
    pub owner: ClientId,
}

impl ExclusiveLock {
    pub fn new(owner: ClientId) -> Self {
        ExclusiveLock { owner }
    }

    pub fn detect_deadlock(
        &self,
        probe: ClientId,
        directory: &ClientDirectory,
        table: &LockTable,
        budget: usize,
    ) -> Option<ClientId> {
        detect_deadlock_among(vec![self.owner], probe, directory, table, budget)
    }
}

fn detect_deadlock_among(
    holders: Vec<ClientId>,
    probe: ClientId,
    directory: &ClientDirectory,
    table: &LockTable,
    budget: usize,
) -> Option<ClientId> {
    for holder in holders {
        if holder == probe {
            continue;
        }
        let Some(view) = directory.get(holder) else {
            continue;
        };
        if view.wait_list().contains(probe) {
            return Some(holder);
        }
        if budget == 0 {
            continue;
        }
        if let Some((resource_type, resource_id, _exclusive)) = view.waiting_on() {
            if let Some(entry) = table.get(resource_type, resource_id) {
                if let Some(blocker) = entry.detect_deadlock(probe, directory, table, budget - 1) {
                    return Some(blocker);
                }
            }
        }
    }
    None
}

/// A table slot: either flavor of lock, cheap to clone (both are
/// `Arc`-backed).
#[derive(Clone)]
pub enum LockEntry {
    Shared(Arc<SharedLock>),
    Exclusive(Arc<ExclusiveLock>),
}

impl LockEntry {
    pub fn detect_deadlock(
        &self,
        probe: ClientId,
        directory: &ClientDirectory,
        table: &LockTable,
        budget: usize,
    ) -> Option<ClientId> {
        match self {
            LockEntry::Shared(lock) => lock.detect_deadlock(probe, directory, table, budget),
            LockEntry::Exclusive(lock) => lock.detect_deadlock(probe, directory, table, budget),
        }
    }

    pub fn copy_holder_wait_lists_into(&self, into: &WaitSet, directory: &ClientDirectory) {
        match self {
            LockEntry::Shared(lock) => lock.copy_holder_wait_lists_into(into, directory),
            LockEntry::Exclusive(lock) => {
                if let Some(holder) = directory.get(lock.owner) {
                    into.or_from(holder.wait_list());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_lock_is_reentrant_for_the_same_client() {
        let lock = SharedLock::new(1);
        assert!(lock.acquire(1));
        assert_eq!(lock.number_of_holders(), 1);
        assert!(!lock.release(1));
        assert!(lock.release(1));
    }

    #[test]
    fn shared_lock_allows_multiple_distinct_holders() {
        let lock = SharedLock::new(1);
        assert!(lock.acquire(2));
        assert_eq!(lock.number_of_holders(), 2);
    }

    #[test]
    fn update_lock_is_exclusive_among_holders() {
        let lock = SharedLock::new(1);
        lock.acquire(2);
        assert!(lock.try_acquire_update_lock(1));
        assert!(!lock.try_acquire_update_lock(2));
        lock.release_update_lock(1);
        assert!(lock.try_acquire_update_lock(2));
    }

    #[test]
    fn dead_lock_rejects_new_acquires() {
        let lock = SharedLock::new(1);
        assert!(lock.release(1));
        assert!(lock.is_dead());
        assert!(!lock.acquire(2));
    }

    #[test]
    fn acquire_with_foreign_update_holder_fails() {
        let lock = SharedLock::new(1);
        lock.try_acquire_update_lock(1);
        assert!(!lock.acquire(2));
        assert!(lock.acquire(1));
    }
}
