//! Lock modes and the resource-type extension point.

use std::fmt;

use crate::common::TypeId;

/// The two lock modes a client can hold on a resource.
///
/// Unlike `transaction::types::LockMode` this crate has no intent-lock
/// hierarchy — the resource model underneath (node/relationship/schema
/// records) has no natural containment to escalate across, so only the
/// leaf modes survive the transplant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum LockType {
    Shared,
    Exclusive,
}

impl fmt::Display for LockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockType::Shared => write!(f, "SHARED"),
            LockType::Exclusive => write!(f, "EXCLUSIVE"),
        }
    }
}

/// A lock a client currently holds, as reported by [`crate::lock::client::Client::active_locks`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ActiveLock {
    pub resource_type: TypeId,
    pub resource_id: i64,
    pub lock_type: LockType,
}

/// Out-of-scope collaborator: names the `TypeId` namespaces a [`crate::lock::manager::LockManager`]
/// is configured for. Only the interface is specified by the caller; this
/// crate ships one concrete implementation so tests and examples have
/// something to address resources with.
pub trait ResourceType: Send + Sync {
    fn type_id(&self) -> TypeId;
    fn name(&self) -> &str;
}

/// A fixed, named resource type. Good enough for diagnostics and tests;
/// a real deployment would back this with a schema-driven registry.
#[derive(Debug, Clone, Copy)]
pub struct StaticResourceType {
    pub id: TypeId,
    pub name: &'static str,
}

impl ResourceType for StaticResourceType {
    fn type_id(&self) -> TypeId {
        self.id
    }

    fn name(&self) -> &str {
        self.name
    }
}
