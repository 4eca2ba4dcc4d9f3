//! Client-side re-entrant lock manager for a transactional graph storage
//! engine.
//!
//! ```text
//!  Client ──acquire/release──> LockTable ──indexed by resource-type──> DashMap<ResourceId, LockEntry>
//!    │                                                                        │
//!    ├─ wait_list (WaitSet) <──copy_holder_wait_lists_into────────── SharedLock / ExclusiveLock
//!    │
//!    └─ mark_as_waiting_for ──> DeadlockDetector ──should_abort──> ResolutionStrategy
//! ```
//!
//! | Module | Responsibility |
//! |---|---|
//! | [`wait_set`] | Bitset of client ids a client transitively waits on |
//! | [`locks`] | `SharedLock`/`ExclusiveLock` table entries |
//! | [`lock_table`] | Concurrent map from resource to lock entry, one per resource type |
//! | [`client`] | Per-transaction agent: reentrancy, retries, upgrade/downgrade |
//! | [`deadlock`] | Cycle detection and victim selection |
//! | [`directory`] | Registry used by deadlock detection to look up other live clients |
//! | [`pool`] | Client id checkout/reuse |
//! | [`manager`] | Top-level entry point tying the above together |
//! | [`config`] | `LockManagerConfig` |
//! | [`error`] | `LockClientError` |
//! | [`tracer`] | Wait-observation hook |
//! | [`wait_strategy`] | Backoff between retries |
//! | [`types`] | `LockType`, `ActiveLock`, `ResourceType` |

pub mod client;
pub mod config;
pub mod deadlock;
pub mod directory;
pub mod error;
pub mod lock_table;
pub mod locks;
pub mod manager;
pub mod pool;
pub mod tracer;
pub mod types;
pub mod wait_set;
pub mod wait_strategy;

pub use client::Client;
pub use config::{LockManagerConfig, ResolutionStrategyKind};
pub use deadlock::{DeadlockDetector, ResolutionStrategy};
pub use error::{LockClientError, LockResult};
pub use manager::LockManager;
pub use tracer::{LockTracer, NoOpTracer, WaitEvent};
pub use types::{ActiveLock, LockType, ResourceType};
pub use wait_strategy::WaitStrategy;
