//! Out-of-scope collaborator per the spec: only the interface is required.
//! A no-op default and a `tracing`-backed default are shipped so the crate
//! is runnable standalone.

use crate::common::{ResourceId, TypeId};

/// A single wait, opened when a client starts blocking on a lock and
/// closed when it either acquires or gives up.
pub trait WaitEvent: Send + Sync {
    fn close(&self);
}

pub trait LockTracer: Send + Sync {
    fn wait_for_lock(
        &self,
        exclusive: bool,
        resource_type: TypeId,
        resource_id: ResourceId,
    ) -> Box<dyn WaitEvent>;
}

pub struct NoOpTracer;

struct NoOpWaitEvent;

impl WaitEvent for NoOpWaitEvent {
    fn close(&self) {}
}

impl LockTracer for NoOpTracer {
    fn wait_for_lock(&self, _exclusive: bool, _resource_type: TypeId, _resource_id: ResourceId) -> Box<dyn WaitEvent> {
        Box::new(NoOpWaitEvent)
    }
}

/// Logs wait start/stop at `debug` level via `tracing`.
pub struct LoggingTracer;

struct LoggingWaitEvent {
    exclusive: bool,
    resource_type: TypeId,
    resource_id: ResourceId,
    started: std::time::Instant,
}

impl WaitEvent for LoggingWaitEvent {
    fn close(&self) {
        tracing::debug!(
            exclusive = self.exclusive,
            resource_type = self.resource_type,
            resource_id = self.resource_id,
            waited_micros = self.started.elapsed().as_micros() as u64,
            "lock wait resolved"
        );
    }
}

impl LockTracer for LoggingTracer {
    fn wait_for_lock(&self, exclusive: bool, resource_type: TypeId, resource_id: ResourceId) -> Box<dyn WaitEvent> {
        tracing::debug!(exclusive, resource_type, resource_id, "waiting for lock");
        Box::new(LoggingWaitEvent {
            exclusive,
            resource_type,
            resource_id,
            started: std::time::Instant::now(),
        })
    }
}
