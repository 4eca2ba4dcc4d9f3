//! `Client` — a per-transaction agent checked out from a `ClientPool`,
//! tracking its own reentrant shared/exclusive holds and driving the
//! acquire retry loop, upgrade protocol, and deadlock checks.
//!
//! Grounded in `transaction::lock_manager::LockManager::acquire_lock_with_timeout`
//! for the retry/backoff/timeout shape, and in the reentrant counter maps
//! described in the data model: one shared count and one exclusive count
//! per `(resource_type, resource_id)`, independent of the lock table's own
//! bookkeeping.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::common::{ClientId, ResourceId, SessionId, TypeId};
use crate::lock::config::LockManagerConfig;
use crate::lock::deadlock::DeadlockDetector;
use crate::lock::directory::{ClientDirectory, ClientView};
use crate::lock::error::{LockClientError, LockResult};
use crate::lock::lock_table::LockTable;
use crate::lock::locks::{ExclusiveLock, LockEntry, SharedLock};
use crate::lock::pool::ClientPool;
use crate::lock::tracer::{LockTracer, WaitEvent};
use crate::lock::types::{ActiveLock, LockType};
use crate::lock::wait_set::WaitSet;
use crate::lock::wait_strategy::WaitStrategy;

/// Tries before a shared holder stops waiting passively for other readers
/// to drain and starts reserving the update-lock slot to guarantee it
/// eventually wins the upgrade race.
const UPGRADE_GRACE_TRIES: u32 = 50;

pub struct Client {
    id: ClientId,
    session: SessionId,
    shared_counts: Vec<DashMap<ResourceId, u32>>,
    exclusive_counts: Vec<DashMap<ResourceId, u32>>,
    wait_list: WaitSet,
    waiting_on: Mutex<Option<(TypeId, ResourceId, bool)>>,
    stopped: AtomicBool,
    active_calls: AtomicU32,
    my_exclusive: Arc<ExclusiveLock>,
    table: Arc<LockTable>,
    directory: Arc<ClientDirectory>,
    detector: Arc<DeadlockDetector>,
    config: Arc<LockManagerConfig>,
    wait_strategies: Arc<Vec<Box<dyn WaitStrategy>>>,
    pool: Arc<ClientPool>,
}

struct ActiveCallGuard<'a> {
    active_calls: &'a AtomicU32,
}

impl Drop for ActiveCallGuard<'_> {
    fn drop(&mut self) {
        self.active_calls.fetch_sub(1, Ordering::AcqRel);
    }
}

/// A wait event is opened the first time an enclosing `acquire_*` call has
/// to back off, and stays open across every retry of that same call — it
/// is never re-opened per iteration, only closed once, when the slot
/// drops.
#[derive(Default)]
struct WaitEventSlot {
    event: Option<Box<dyn WaitEvent>>,
}

impl WaitEventSlot {
    fn ensure_open(&mut self, tracer: &dyn LockTracer, exclusive: bool, resource_type: TypeId, resource_id: ResourceId) {
        if self.event.is_none() {
            self.event = Some(tracer.wait_for_lock(exclusive, resource_type, resource_id));
        }
    }
}

impl Drop for WaitEventSlot {
    fn drop(&mut self) {
        if let Some(event) = self.event.take() {
            event.close();
        }
    }
}

impl Client {
    pub(crate) fn new(
        id: ClientId,
        session: SessionId,
        table: Arc<LockTable>,
        directory: Arc<ClientDirectory>,
        detector: Arc<DeadlockDetector>,
        config: Arc<LockManagerConfig>,
        wait_strategies: Arc<Vec<Box<dyn WaitStrategy>>>,
        pool: Arc<ClientPool>,
    ) -> Self {
        let resource_type_count = config.resource_type_count;
        Client {
            id,
            session,
            shared_counts: (0..resource_type_count).map(|_| DashMap::new()).collect(),
            exclusive_counts: (0..resource_type_count).map(|_| DashMap::new()).collect(),
            wait_list: WaitSet::new(config.max_clients),
            waiting_on: Mutex::new(None),
            stopped: AtomicBool::new(false),
            active_calls: AtomicU32::new(0),
            my_exclusive: Arc::new(ExclusiveLock::new(id)),
            table,
            directory,
            detector,
            config,
            wait_strategies,
            pool,
        }
    }

    pub fn id(&self) -> ClientId {
        self.id
    }

    pub fn lock_session_id(&self) -> SessionId {
        self.session
    }

    fn enter(&self) -> ActiveCallGuard<'_> {
        self.active_calls.fetch_add(1, Ordering::AcqRel);
        ActiveCallGuard { active_calls: &self.active_calls }
    }

    fn ensure_running(&self) -> LockResult<()> {
        if self.stopped.load(Ordering::Acquire) {
            return Err(LockClientError::client_stopped(self.id));
        }
        Ok(())
    }

    fn check_resource_type(&self, resource_type: TypeId) -> LockResult<()> {
        if resource_type >= self.shared_counts.len() {
            return Err(LockClientError::UnknownResourceType(resource_type));
        }
        Ok(())
    }

    fn shared_counts_contains(&self, resource_type: TypeId, resource_id: ResourceId) -> bool {
        self.shared_counts[resource_type].contains_key(&resource_id)
    }

    fn exclusive_counts_contains(&self, resource_type: TypeId, resource_id: ResourceId) -> bool {
        self.exclusive_counts[resource_type].contains_key(&resource_id)
    }

    fn bump_shared_count(&self, resource_type: TypeId, resource_id: ResourceId) {
        self.shared_counts[resource_type]
            .entry(resource_id)
            .and_modify(|c| *c += 1)
            .or_insert(1);
    }

    /// Undoes a single `bump_shared_count`, removing the entry once it
    /// drops to zero.
    fn unbump_shared_count(&self, resource_type: TypeId, resource_id: ResourceId) {
        let map = &self.shared_counts[resource_type];
        let done = if let Some(mut entry) = map.get_mut(&resource_id) {
            *entry -= 1;
            *entry == 0
        } else {
            false
        };
        if done {
            map.remove(&resource_id);
        }
    }

    fn bump_exclusive_count(&self, resource_type: TypeId, resource_id: ResourceId) {
        self.exclusive_counts[resource_type]
            .entry(resource_id)
            .and_modify(|c| *c += 1)
            .or_insert(1);
    }

    fn wait_strategy_for(&self, resource_type: TypeId) -> &dyn WaitStrategy {
        self.wait_strategies
            .get(resource_type)
            .map(|s| s.as_ref())
            .unwrap_or(&crate::lock::wait_strategy::FALLBACK_WAIT_STRATEGY)
    }

    #[allow(clippy::too_many_arguments)]
    fn wait_for(
        &self,
        tracer: &dyn LockTracer,
        event: &mut WaitEventSlot,
        resource_type: TypeId,
        resource_id: ResourceId,
        exclusive: bool,
        started: Instant,
        tries: u32,
    ) -> LockResult<()> {
        if let Some(timeout) = self.config.timeout() {
            if started.elapsed() >= timeout {
                let mode = if exclusive { LockType::Exclusive } else { LockType::Shared };
                tracing::warn!(
                    client_id = self.id,
                    resource_type,
                    resource_id,
                    "lock acquisition timed out"
                );
                return Err(LockClientError::acquire_timeout(
                    self.id,
                    resource_type,
                    resource_id,
                    mode,
                    started.elapsed().as_millis() as u64,
                    timeout.as_millis() as u64,
                ));
            }
        }

        *self.waiting_on.lock() = Some((resource_type, resource_id, exclusive));
        if let Err(e) = self.detector.mark_as_waiting_for(self, resource_type, resource_id, exclusive) {
            *self.waiting_on.lock() = None;
            return Err(e);
        }

        tracing::debug!(client_id = self.id, resource_type, resource_id, tries, "retrying lock acquisition");
        event.ensure_open(tracer, exclusive, resource_type, resource_id);
        self.wait_strategy_for(resource_type).apply(tries);
        *self.waiting_on.lock() = None;
        Ok(())
    }

    fn acquire_shared_one(&self, tracer: &dyn LockTracer, resource_type: TypeId, resource_id: ResourceId) -> LockResult<()> {
        self.ensure_running()?;
        self.check_resource_type(resource_type)?;

        if self.exclusive_counts_contains(resource_type, resource_id) || self.shared_counts_contains(resource_type, resource_id) {
            self.bump_shared_count(resource_type, resource_id);
            return Ok(());
        }

        let started = Instant::now();
        let mut tries: u32 = 0;
        let mut wait_event = WaitEventSlot::default();
        loop {
            self.ensure_running()?;
            let entry = self
                .table
                .put_if_absent(resource_type, resource_id, LockEntry::Shared(Arc::new(SharedLock::new(self.id))))?;
            match entry {
                LockEntry::Shared(lock) => {
                    if lock.acquire(self.id) {
                        self.bump_shared_count(resource_type, resource_id);
                        return Ok(());
                    }
                    if lock.is_dead() {
                        let _ = self.table.remove_if_dead(resource_type, resource_id);
                        continue;
                    }
                    self.wait_for(tracer, &mut wait_event, resource_type, resource_id, false, started, tries)?;
                    tries += 1;
                }
                LockEntry::Exclusive(lock) => {
                    if lock.owner == self.id {
                        self.bump_shared_count(resource_type, resource_id);
                        return Ok(());
                    }
                    self.wait_for(tracer, &mut wait_event, resource_type, resource_id, false, started, tries)?;
                    tries += 1;
                }
            }
        }
    }

    fn acquire_exclusive_one(&self, tracer: &dyn LockTracer, resource_type: TypeId, resource_id: ResourceId) -> LockResult<()> {
        self.ensure_running()?;
        self.check_resource_type(resource_type)?;

        if self.exclusive_counts_contains(resource_type, resource_id) {
            self.bump_exclusive_count(resource_type, resource_id);
            return Ok(());
        }

        let started = Instant::now();
        let mut tries: u32 = 0;
        let mut wait_event = WaitEventSlot::default();
        loop {
            self.ensure_running()?;
            match self.table.get(resource_type, resource_id) {
                None => {
                    let installed = self.table.put_if_absent(
                        resource_type,
                        resource_id,
                        LockEntry::Exclusive(self.my_exclusive.clone()),
                    )?;
                    if let LockEntry::Exclusive(lock) = &installed {
                        if lock.owner == self.id {
                            self.bump_exclusive_count(resource_type, resource_id);
                            return Ok(());
                        }
                    }
                    self.wait_for(tracer, &mut wait_event, resource_type, resource_id, true, started, tries)?;
                    tries += 1;
                }
                Some(LockEntry::Exclusive(lock)) => {
                    if lock.owner == self.id {
                        self.bump_exclusive_count(resource_type, resource_id);
                        return Ok(());
                    }
                    self.wait_for(tracer, &mut wait_event, resource_type, resource_id, true, started, tries)?;
                    tries += 1;
                }
                Some(LockEntry::Shared(lock)) => {
                    if lock.is_dead() {
                        let _ = self.table.remove_if_dead(resource_type, resource_id);
                        continue;
                    }

                    // Readers get a grace period before any acquirer starts
                    // angling for the update-lock reservation, win or lose;
                    // this is deliberate even when we'd already be the sole
                    // holder and could upgrade for free.
                    if tries > UPGRADE_GRACE_TRIES {
                        if self.try_upgrade(tracer, &mut wait_event, &lock, resource_type, resource_id, started)? {
                            self.bump_exclusive_count(resource_type, resource_id);
                            return Ok(());
                        }
                    }

                    self.wait_for(tracer, &mut wait_event, resource_type, resource_id, true, started, tries)?;
                    tries += 1;
                }
            }
        }
    }

    /// Attempts the shared-to-exclusive upgrade protocol against `lock`,
    /// the table's current entry for `(resource_type, resource_id)`. On
    /// success the table entry is left untouched — still the same
    /// `SharedLock`, now with this client as its update-lock holder —
    /// which is what lets `release_exclusive` downgrade back in place
    /// without replacing the slot. Returns `Ok(false)` when the update
    /// reservation itself can't be won right now (the caller should keep
    /// waiting, not treat it as an error).
    #[allow(clippy::too_many_arguments)]
    fn try_upgrade(
        &self,
        tracer: &dyn LockTracer,
        wait_event: &mut WaitEventSlot,
        lock: &Arc<SharedLock>,
        resource_type: TypeId,
        resource_id: ResourceId,
        started: Instant,
    ) -> LockResult<bool> {
        let mut just_acquired = false;
        if !self.shared_counts_contains(resource_type, resource_id) {
            if !lock.acquire(self.id) {
                return Ok(false);
            }
            just_acquired = true;
        }

        if !lock.try_acquire_update_lock(self.id) {
            if just_acquired {
                lock.release(self.id);
            }
            return Ok(false);
        }
        if just_acquired {
            self.bump_shared_count(resource_type, resource_id);
        }

        // The grace counter on the outer loop has already been spent;
        // the inner spin here always restarts from zero.
        let mut inner_tries: u32 = 0;
        loop {
            if lock.is_sole_holder(self.id) {
                return Ok(true);
            }

            if let Err(e) = self.ensure_running() {
                lock.release_update_lock(self.id);
                if just_acquired {
                    lock.release(self.id);
                    self.unbump_shared_count(resource_type, resource_id);
                }
                return Err(e);
            }
            if let Some(timeout) = self.config.timeout() {
                if started.elapsed() >= timeout {
                    lock.release_update_lock(self.id);
                    if just_acquired {
                        lock.release(self.id);
                        self.unbump_shared_count(resource_type, resource_id);
                    }
                    return Err(LockClientError::acquire_timeout(
                        self.id,
                        resource_type,
                        resource_id,
                        LockType::Exclusive,
                        started.elapsed().as_millis() as u64,
                        timeout.as_millis() as u64,
                    ));
                }
            }

            *self.waiting_on.lock() = Some((resource_type, resource_id, true));
            if let Err(e) = self.detector.mark_as_waiting_for(self, resource_type, resource_id, true) {
                // The detector already cleared our wait list before
                // raising; we only need to give back the reservation (and,
                // if we only just acquired the shared holder for this
                // upgrade attempt, the holder and count too).
                lock.release_update_lock(self.id);
                if just_acquired {
                    lock.release(self.id);
                    self.unbump_shared_count(resource_type, resource_id);
                }
                return Err(e);
            }

            wait_event.ensure_open(tracer, true, resource_type, resource_id);
            self.wait_strategy_for(resource_type).apply(inner_tries);
            inner_tries += 1;
            *self.waiting_on.lock() = None;
        }
    }

    pub fn acquire_shared(&self, tracer: &dyn LockTracer, resource_type: TypeId, resource_ids: &[ResourceId]) -> LockResult<()> {
        let _guard = self.enter();
        for &resource_id in resource_ids {
            self.acquire_shared_one(tracer, resource_type, resource_id)?;
        }
        Ok(())
    }

    pub fn acquire_exclusive(&self, tracer: &dyn LockTracer, resource_type: TypeId, resource_ids: &[ResourceId]) -> LockResult<()> {
        let _guard = self.enter();
        for &resource_id in resource_ids {
            self.acquire_exclusive_one(tracer, resource_type, resource_id)?;
        }
        Ok(())
    }

    pub fn try_shared(&self, resource_type: TypeId, resource_id: ResourceId) -> LockResult<bool> {
        let _guard = self.enter();
        self.ensure_running()?;
        self.check_resource_type(resource_type)?;

        if self.exclusive_counts_contains(resource_type, resource_id) || self.shared_counts_contains(resource_type, resource_id) {
            self.bump_shared_count(resource_type, resource_id);
            return Ok(true);
        }

        let entry = self
            .table
            .put_if_absent(resource_type, resource_id, LockEntry::Shared(Arc::new(SharedLock::new(self.id))))?;
        match entry {
            LockEntry::Shared(lock) => {
                if lock.acquire(self.id) {
                    self.bump_shared_count(resource_type, resource_id);
                    Ok(true)
                } else {
                    let _ = self.table.remove_if_dead(resource_type, resource_id);
                    Ok(false)
                }
            }
            LockEntry::Exclusive(lock) => {
                if lock.owner == self.id {
                    self.bump_shared_count(resource_type, resource_id);
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
        }
    }

    pub fn try_exclusive(&self, resource_type: TypeId, resource_id: ResourceId) -> LockResult<bool> {
        let _guard = self.enter();
        self.ensure_running()?;
        self.check_resource_type(resource_type)?;

        if self.exclusive_counts_contains(resource_type, resource_id) {
            self.bump_exclusive_count(resource_type, resource_id);
            return Ok(true);
        }

        match self.table.get(resource_type, resource_id) {
            None => {
                let installed =
                    self.table
                        .put_if_absent(resource_type, resource_id, LockEntry::Exclusive(self.my_exclusive.clone()))?;
                if let LockEntry::Exclusive(lock) = &installed {
                    if lock.owner == self.id {
                        self.bump_exclusive_count(resource_type, resource_id);
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Some(LockEntry::Exclusive(lock)) => Ok(lock.owner == self.id),
            Some(LockEntry::Shared(lock)) => {
                if !self.shared_counts_contains(resource_type, resource_id) || !lock.is_sole_holder(self.id) {
                    return Ok(false);
                }
                if !lock.try_acquire_update_lock(self.id) {
                    return Ok(false);
                }
                // Table entry stays Shared; exclusivity is enforced by the
                // update-lock reservation, same as the retry-loop upgrade.
                self.bump_exclusive_count(resource_type, resource_id);
                Ok(true)
            }
        }
    }

    pub fn release_shared(&self, resource_type: TypeId, resource_id: ResourceId) -> LockResult<()> {
        let _guard = self.enter();
        self.check_resource_type(resource_type)?;
        let map = &self.shared_counts[resource_type];
        let done = {
            let mut entry = map.get_mut(&resource_id).ok_or_else(|| {
                LockClientError::illegal_state(format!(
                    "client {} does not hold a shared lock on type {} id {}",
                    self.id, resource_type, resource_id
                ))
            })?;
            *entry -= 1;
            *entry == 0
        };
        if done {
            map.remove(&resource_id);
            // If we still hold the matching exclusive count, this shared
            // hold came from an in-place upgrade that hasn't been
            // released yet; leave our holder slot (and update-lock
            // reservation) on the table alone until `release_exclusive`
            // unwinds the rest.
            if !self.exclusive_counts_contains(resource_type, resource_id) {
                if let Some(LockEntry::Shared(lock)) = self.table.get(resource_type, resource_id) {
                    lock.release(self.id);
                    self.table.remove_if_dead(resource_type, resource_id)?;
                }
            }
        }
        Ok(())
    }

    pub fn release_exclusive(&self, resource_type: TypeId, resource_id: ResourceId) -> LockResult<()> {
        let _guard = self.enter();
        self.check_resource_type(resource_type)?;
        let map = &self.exclusive_counts[resource_type];
        let done = {
            let mut entry = map.get_mut(&resource_id).ok_or_else(|| {
                LockClientError::illegal_state(format!(
                    "client {} does not hold an exclusive lock on type {} id {}",
                    self.id, resource_type, resource_id
                ))
            })?;
            *entry -= 1;
            *entry == 0
        };
        if !done {
            return Ok(());
        }
        map.remove(&resource_id);

        if self.shared_counts_contains(resource_type, resource_id) {
            match self.table.get(resource_type, resource_id) {
                Some(LockEntry::Shared(lock)) if lock.update_lock_holder() == Some(self.id) => {
                    // This hold came from an in-place upgrade: the table
                    // slot is still the original SharedLock, now with us
                    // as the update-lock holder. Releasing the
                    // reservation downgrades us back to a plain shared
                    // holder without touching the slot.
                    lock.release_update_lock(self.id);
                }
                _ => {
                    // The shared count was armed while we already held a
                    // direct exclusive lock (acquire_shared's "exclusive
                    // held" fast path), so the table slot is still our
                    // ExclusiveLock. Downgrade by replacing it with a
                    // fresh SharedLock we own.
                    self.table.replace(
                        resource_type,
                        resource_id,
                        LockEntry::Shared(Arc::new(SharedLock::new(self.id))),
                    )?;
                }
            }
            return Ok(());
        }

        match self.table.get(resource_type, resource_id) {
            Some(LockEntry::Exclusive(lock)) if lock.owner == self.id => {
                self.table.remove(resource_type, resource_id)?;
            }
            Some(LockEntry::Shared(lock)) if lock.update_lock_holder() == Some(self.id) => {
                // The matching shared count was already released (via
                // `release_shared`'s deferred-downgrade path) before this
                // call, so there is no downgrade to perform — just give
                // back our holder slot and update-lock reservation on the
                // still-live SharedLock, the same as any other full
                // release, instead of leaving it stranded forever.
                lock.release(self.id);
                lock.release_update_lock(self.id);
                self.table.remove_if_dead(resource_type, resource_id)?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Releases this client's hold on one table slot, consulting the
    /// table entry itself rather than our local counters: an exclusive
    /// entry we own is removed outright; a shared entry has our holder
    /// slot (and, if we still held it, our update-lock reservation)
    /// released, and is removed once that empties it out.
    fn release_global_one(&self, resource_type: TypeId, resource_id: ResourceId) {
        match self.table.get(resource_type, resource_id) {
            Some(LockEntry::Exclusive(lock)) if lock.owner == self.id => {
                let _ = self.table.remove(resource_type, resource_id);
            }
            Some(LockEntry::Shared(lock)) => {
                let emptied = lock.release(self.id);
                if lock.update_lock_holder() == Some(self.id) {
                    lock.release_update_lock(self.id);
                }
                if emptied {
                    let _ = self.table.remove_if_dead(resource_type, resource_id);
                }
            }
            _ => {}
        }
    }

    /// Releases every lock this client currently holds. Used by `close`;
    /// exposed directly for callers that want to drop all locks between
    /// retries of the same transaction without returning the client to
    /// the pool.
    ///
    /// Exclusive holds are released first — each one also clears any
    /// matching shared count directly, skipping the usual
    /// release-triggers-downgrade dance, since there is no point
    /// downgrading a lock this client is about to drop entirely.
    /// Whatever shared-only holds remain are then released the same way.
    pub fn release_global(&self) {
        let _guard = self.enter();

        for (resource_type, map) in self.exclusive_counts.iter().enumerate() {
            for entry in map.iter() {
                let resource_id = *entry.key();
                self.release_global_one(resource_type, resource_id);
                self.shared_counts[resource_type].remove(&resource_id);
            }
            map.clear();
        }

        for (resource_type, map) in self.shared_counts.iter().enumerate() {
            for entry in map.iter() {
                self.release_global_one(resource_type, *entry.key());
            }
            map.clear();
        }
    }

    pub fn active_locks(&self) -> Vec<ActiveLock> {
        let mut locks = Vec::new();
        for (resource_type, map) in self.shared_counts.iter().enumerate() {
            for entry in map.iter() {
                locks.push(ActiveLock {
                    resource_type,
                    resource_id: *entry.key(),
                    lock_type: LockType::Shared,
                });
            }
        }
        for (resource_type, map) in self.exclusive_counts.iter().enumerate() {
            for entry in map.iter() {
                locks.push(ActiveLock {
                    resource_type,
                    resource_id: *entry.key(),
                    lock_type: LockType::Exclusive,
                });
            }
        }
        locks
    }

    pub fn wait_list_size(&self) -> usize {
        self.wait_list.count()
    }

    pub fn is_waiting_for(&self, other: ClientId) -> bool {
        self.wait_list.contains(other)
    }

    /// ORs this client's wait list into `into`, the way a `SharedLock`
    /// propagates its holders' wait lists to a newly blocked waiter.
    pub fn copy_wait_list_to(&self, into: &WaitSet) {
        into.or_from(&self.wait_list);
    }

    /// Stops accepting new work and blocks until any in-flight call on
    /// this client (running on another thread) has returned. Idempotent.
    pub fn stop(&self) {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }
        tracing::info!(client_id = self.id, "lock client stopping");
        self.wait_list.clear();
        while self.active_calls.load(Ordering::Acquire) > 0 {
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
    }

    /// Stops the client, releases every lock it holds, and returns its id
    /// to the pool. The `Client` handle should not be used again after
    /// this call; the next checkout of the same id constructs a fresh
    /// `Client` with a bumped session id.
    pub fn close(&self) {
        self.stop();
        self.release_global();
        self.directory.deregister(self.id);
        self.pool.release(self.id);
        tracing::info!(client_id = self.id, session_id = self.session, "lock client closed");
    }
}

impl ClientView for Client {
    fn id(&self) -> ClientId {
        self.id
    }

    fn wait_list(&self) -> &WaitSet {
        &self.wait_list
    }

    fn waiting_on(&self) -> Option<(TypeId, ResourceId, bool)> {
        *self.waiting_on.lock()
    }

    fn held_lock_count(&self) -> usize {
        self.shared_counts.iter().map(|m| m.len()).sum::<usize>()
            + self.exclusive_counts.iter().map(|m| m.len()).sum::<usize>()
    }
}
