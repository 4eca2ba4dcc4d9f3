//! `graphlock` — a client-side re-entrant lock manager for a transactional
//! graph storage engine.
//!
//! A [`LockManager`] hands out [`Client`]s from an internal pool; each
//! `Client` acquires shared/exclusive locks on `(resource-type,
//! resource-id)` pairs, cooperatively detects deadlocks against every
//! other live client, and releases everything it holds on `close`.
//!
//! ```no_run
//! use graphlock::{LockManager, NoOpTracer};
//!
//! let manager = LockManager::with_defaults(4);
//! let client = manager.new_client();
//! let tracer = NoOpTracer;
//!
//! client.acquire_shared(&tracer, 0, &[1, 2, 3]).unwrap();
//! client.release_shared(0, 1).unwrap();
//! client.close();
//! ```

pub mod common;
pub mod lock;

pub use common::{ClientId, ResourceId, SessionId, TypeId};
pub use lock::{
    ActiveLock, Client, DeadlockDetector, LockClientError, LockManager, LockManagerConfig, LockResult, LockTracer,
    LockType, NoOpTracer, ResolutionStrategy, ResolutionStrategyKind, ResourceType, WaitEvent, WaitStrategy,
};

pub type Result<T> = LockResult<T>;
