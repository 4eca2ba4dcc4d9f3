// Shared identifier types used across the lock manager.
//
// Mirrors `rusty_db::common`'s pattern of collecting the identifiers every
// subsystem agrees on into plain type aliases rather than newtypes, so
// callers can pass raw integers without conversion ceremony.

/// Dense index naming a namespace of resources (nodes, relationships,
/// schema, ...). Fixed at [`crate::LockManagerConfig`] construction.
pub type TypeId = usize;

/// Identifies a resource within a [`TypeId`] namespace. Unique within the
/// type, not globally.
pub type ResourceId = i64;

/// Identifies a live [`crate::lock::client::Client`]. Returned to the pool
/// on close and may be reused by a later session.
pub type ClientId = i32;

/// Sentinel meaning "no client" — used for the update-lock slot and for
/// `waiting_on` when a client isn't blocked on anything.
pub const NO_CLIENT: ClientId = -1;

/// Monotonic stamp bumped each time a pooled [`ClientId`] is checked out,
/// so two sessions that reuse the same id remain distinguishable in logs
/// and diagnostics.
pub type SessionId = u64;
