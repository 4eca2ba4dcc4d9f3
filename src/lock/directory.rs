//! Registry of live clients, used by deadlock detection to walk from a
//! holder back to whatever lock *that* holder is itself waiting on.
//!
//! Kept as a narrow trait (`ClientView`) rather than a hard dependency on
//! `Client` so `locks.rs` (which needs to recurse through the directory
//! during `detect_deadlock`) doesn't have to know about pooling, reentrancy
//! counters, or any of `Client`'s other state.

use std::sync::Arc;

use dashmap::DashMap;

use crate::common::{ClientId, ResourceId, TypeId};
use crate::lock::wait_set::WaitSet;

pub trait ClientView: Send + Sync {
    fn id(&self) -> ClientId;
    fn wait_list(&self) -> &WaitSet;
    /// What this client is currently blocked on, if anything.
    fn waiting_on(&self) -> Option<(TypeId, ResourceId, bool)>;
    fn held_lock_count(&self) -> usize;
}

#[derive(Default)]
pub struct ClientDirectory {
    clients: DashMap<ClientId, Arc<dyn ClientView>>,
}

impl ClientDirectory {
    pub fn new() -> Self {
        ClientDirectory { clients: DashMap::new() }
    }

    pub fn register(&self, client: Arc<dyn ClientView>) {
        self.clients.insert(client.id(), client);
    }

    pub fn deregister(&self, id: ClientId) {
        self.clients.remove(&id);
    }

    pub fn get(&self, id: ClientId) -> Option<Arc<dyn ClientView>> {
        self.clients.get(&id).map(|e| e.clone())
    }

    pub fn live_count(&self) -> usize {
        self.clients.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FakeClient {
        id: ClientId,
        wait_list: WaitSet,
        waiting_on: Mutex<Option<(TypeId, ResourceId, bool)>>,
    }

    impl ClientView for FakeClient {
        fn id(&self) -> ClientId {
            self.id
        }
        fn wait_list(&self) -> &WaitSet {
            &self.wait_list
        }
        fn waiting_on(&self) -> Option<(TypeId, ResourceId, bool)> {
            *self.waiting_on.lock().unwrap()
        }
        fn held_lock_count(&self) -> usize {
            0
        }
    }

    #[test]
    fn register_and_lookup_roundtrip() {
        let directory = ClientDirectory::new();
        let client: Arc<dyn ClientView> = Arc::new(FakeClient {
            id: 3,
            wait_list: WaitSet::new(16),
            waiting_on: Mutex::new(None),
        });
        directory.register(client);
        assert_eq!(directory.live_count(), 1);
        assert!(directory.get(3).is_some());
        directory.deregister(3);
        assert!(directory.get(3).is_none());
        assert_eq!(directory.live_count(), 0);
    }
}
