//! Lock client error taxonomy.
//!
//! Modeled on `transaction::error::TransactionError`: one enum, struct-style
//! variants carrying full context, helper constructors, and classification
//! methods so callers can decide whether to retry without matching on the
//! variant themselves.

use thiserror::Error;

use crate::common::{ClientId, ResourceId, TypeId};
use crate::lock::types::LockType;

pub type LockResult<T> = std::result::Result<T, LockClientError>;

#[derive(Debug, Error)]
pub enum LockClientError {
    #[error(
        "client {client_id} timed out after {elapsed_millis}ms (limit {timeout_millis}ms) \
         waiting for a {mode} lock on type {resource_type} id {resource_id}"
    )]
    AcquireLockTimeout {
        client_id: ClientId,
        resource_type: TypeId,
        resource_id: ResourceId,
        mode: LockType,
        elapsed_millis: u64,
        timeout_millis: u64,
    },

    #[error("deadlock detected: {message}")]
    Deadlock { message: String },

    #[error("lock client {client_id} has been stopped")]
    ClientStopped { client_id: ClientId },

    #[error("illegal lock client state: {0}")]
    IllegalState(String),

    #[error("resource type {0} is out of range for this lock manager")]
    UnknownResourceType(TypeId),
}

impl LockClientError {
    pub fn acquire_timeout(
        client_id: ClientId,
        resource_type: TypeId,
        resource_id: ResourceId,
        mode: LockType,
        elapsed_millis: u64,
        timeout_millis: u64,
    ) -> Self {
        LockClientError::AcquireLockTimeout {
            client_id,
            resource_type,
            resource_id,
            mode,
            elapsed_millis,
            timeout_millis,
        }
    }

    pub fn deadlock(message: impl Into<String>) -> Self {
        LockClientError::Deadlock { message: message.into() }
    }

    pub fn client_stopped(client_id: ClientId) -> Self {
        LockClientError::ClientStopped { client_id }
    }

    pub fn illegal_state(message: impl Into<String>) -> Self {
        LockClientError::IllegalState(message.into())
    }

    /// Whether retrying the exact same acquisition might succeed later.
    /// A timed-out acquire is retriable; a deadlock is not (the cycle the
    /// detector broke is still there until somebody's locks are released).
    pub fn is_retriable(&self) -> bool {
        matches!(self, LockClientError::AcquireLockTimeout { .. })
    }

    pub fn is_deadlock(&self) -> bool {
        matches!(self, LockClientError::Deadlock { .. })
    }

    pub fn client_id(&self) -> Option<ClientId> {
        match self {
            LockClientError::AcquireLockTimeout { client_id, .. } => Some(*client_id),
            LockClientError::ClientStopped { client_id } => Some(*client_id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_is_retriable_but_not_deadlock() {
        let err = LockClientError::acquire_timeout(1, 0, 42, LockType::Shared, 100, 50);
        assert!(err.is_retriable());
        assert!(!err.is_deadlock());
        assert_eq!(err.client_id(), Some(1));
    }

    #[test]
    fn deadlock_is_not_retriable() {
        let err = LockClientError::deadlock("1 -> 2 -> 1");
        assert!(!err.is_retriable());
        assert!(err.is_deadlock());
    }
}
