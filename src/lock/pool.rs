//! Minimal client pool. The client-pool lifecycle controller is an
//! out-of-scope collaborator per the spec, but `Client::close` needs
//! somewhere to return its id, so a small concrete implementation is
//! provided, grounded in the free-list-over-a-mutex pattern the teacher's
//! `pool` module uses ahead of its `DashMap`-backed session tables.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::common::{ClientId, SessionId};
use crate::lock::client::Client;
use crate::lock::config::LockManagerConfig;
use crate::lock::deadlock::DeadlockDetector;
use crate::lock::directory::ClientDirectory;
use crate::lock::lock_table::LockTable;
use crate::lock::wait_strategy::WaitStrategy;

pub struct ClientPool {
    free: Mutex<Vec<ClientId>>,
    next_id: AtomicI32,
    sessions: DashMap<ClientId, SessionId>,
    table: Arc<LockTable>,
    directory: Arc<ClientDirectory>,
    detector: Arc<DeadlockDetector>,
    config: Arc<LockManagerConfig>,
    wait_strategies: Arc<Vec<Box<dyn WaitStrategy>>>,
}

impl ClientPool {
    pub fn new(
        table: Arc<LockTable>,
        directory: Arc<ClientDirectory>,
        detector: Arc<DeadlockDetector>,
        config: Arc<LockManagerConfig>,
        wait_strategies: Arc<Vec<Box<dyn WaitStrategy>>>,
    ) -> Self {
        ClientPool {
            free: Mutex::new(Vec::new()),
            next_id: AtomicI32::new(0),
            sessions: DashMap::new(),
            table,
            directory,
            detector,
            config,
            wait_strategies,
        }
    }

    /// Checks out a client id — reused from the free list if one is
    /// available, otherwise the next unused id — and constructs a fresh
    /// `Client` for it with a bumped session stamp.
    pub fn acquire(self: &Arc<Self>) -> Arc<Client> {
        let id = {
            let mut free = self.free.lock();
            free.pop()
        }
        .unwrap_or_else(|| self.next_id.fetch_add(1, Ordering::Relaxed));

        let session = {
            let mut entry = self.sessions.entry(id).or_insert(0);
            *entry += 1;
            *entry
        };

        let client = Arc::new(Client::new(
            id,
            session,
            self.table.clone(),
            self.directory.clone(),
            self.detector.clone(),
            self.config.clone(),
            self.wait_strategies.clone(),
            self.clone(),
        ));
        self.directory.register(client.clone());
        client
    }

    pub fn release(&self, id: ClientId) {
        self.free.lock().push(id);
    }

    pub fn live_count(&self) -> usize {
        self.directory.live_count()
    }
}
