//! `LockManager` — wires together the lock table, client directory,
//! deadlock detector, and client pool, and is the entry point a
//! transaction layer uses to check out a `Client`.

use std::sync::Arc;

use crate::lock::client::Client;
use crate::lock::config::{LockManagerConfig, ResolutionStrategyKind};
use crate::lock::deadlock::{AbortOlder, AbortYounger, AlwaysAbortSelf, DeadlockDetector, Random, ResolutionStrategy};
use crate::lock::directory::ClientDirectory;
use crate::lock::lock_table::LockTable;
use crate::lock::pool::ClientPool;
use crate::lock::wait_strategy::{ConstantSleep, WaitStrategy};

pub struct LockManager {
    config: Arc<LockManagerConfig>,
    table: Arc<LockTable>,
    directory: Arc<ClientDirectory>,
    detector: Arc<DeadlockDetector>,
    pool: Arc<ClientPool>,
}

impl LockManager {
    pub fn new(config: LockManagerConfig, wait_strategies: Vec<Box<dyn WaitStrategy>>) -> Self {
        let resource_type_count = config.resource_type_count;
        let config = Arc::new(config);
        let table = Arc::new(LockTable::new(resource_type_count));
        let directory = Arc::new(ClientDirectory::new());
        let resolution = resolve_strategy(&config.deadlock_resolution_strategy);
        let detector = Arc::new(DeadlockDetector::new(table.clone(), directory.clone(), resolution));

        let wait_strategies = if wait_strategies.is_empty() {
            default_wait_strategies(resource_type_count)
        } else {
            wait_strategies
        };
        let pool = Arc::new(ClientPool::new(
            table.clone(),
            directory.clone(),
            detector.clone(),
            config.clone(),
            Arc::new(wait_strategies),
        ));

        tracing::info!(resource_type_count, "lock manager initialized");
        LockManager {
            config,
            table,
            directory,
            detector,
            pool,
        }
    }

    pub fn with_defaults(resource_type_count: usize) -> Self {
        Self::new(
            LockManagerConfig {
                resource_type_count,
                ..LockManagerConfig::default()
            },
            Vec::new(),
        )
    }

    pub fn new_client(&self) -> Arc<Client> {
        self.pool.acquire()
    }

    pub fn resource_type_count(&self) -> usize {
        self.table.resource_type_count()
    }

    pub fn live_client_count(&self) -> usize {
        self.directory.live_count()
    }

    /// `(deadlocks_detected, checks_performed)`.
    pub fn deadlock_stats(&self) -> (u64, u64) {
        self.detector.stats().snapshot()
    }

    pub fn config(&self) -> &LockManagerConfig {
        &self.config
    }
}

fn resolve_strategy(kind: &ResolutionStrategyKind) -> Arc<dyn ResolutionStrategy> {
    match kind {
        ResolutionStrategyKind::AbortYounger => Arc::new(AbortYounger),
        ResolutionStrategyKind::AbortOlder => Arc::new(AbortOlder),
        ResolutionStrategyKind::Random => Arc::new(Random),
        ResolutionStrategyKind::AlwaysAbortSelf => Arc::new(AlwaysAbortSelf),
        ResolutionStrategyKind::Custom(strategy) => strategy.clone(),
    }
}

fn default_wait_strategies(resource_type_count: usize) -> Vec<Box<dyn WaitStrategy>> {
    (0..resource_type_count)
        .map(|_| Box::new(ConstantSleep(std::time::Duration::from_millis(1))) as Box<dyn WaitStrategy>)
        .collect()
}
