//! Lock manager configuration, mirroring `transaction::locks::LockManagerConfig`.

use std::sync::Arc;
use std::time::Duration;

use crate::lock::deadlock::ResolutionStrategy;

/// Named deadlock victim-selection policies. `Custom` carries a boxed
/// strategy for callers that need something the built-ins don't cover.
#[derive(Clone)]
pub enum ResolutionStrategyKind {
    AbortYounger,
    AbortOlder,
    Random,
    AlwaysAbortSelf,
    Custom(Arc<dyn ResolutionStrategy>),
}

impl std::fmt::Debug for ResolutionStrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolutionStrategyKind::AbortYounger => write!(f, "AbortYounger"),
            ResolutionStrategyKind::AbortOlder => write!(f, "AbortOlder"),
            ResolutionStrategyKind::Random => write!(f, "Random"),
            ResolutionStrategyKind::AlwaysAbortSelf => write!(f, "AlwaysAbortSelf"),
            ResolutionStrategyKind::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LockManagerConfig {
    /// Number of distinct `TypeId` namespaces this manager serves.
    pub resource_type_count: usize,
    /// Upper bound on concurrently live clients; sizes each client's
    /// `WaitSet`.
    pub max_clients: usize,
    /// 0 disables the timeout (wait forever, modulo deadlock detection).
    pub lock_acquisition_timeout_millis: u64,
    pub deadlock_resolution_strategy: ResolutionStrategyKind,
}

impl Default for LockManagerConfig {
    fn default() -> Self {
        LockManagerConfig {
            resource_type_count: 4,
            max_clients: 1024,
            lock_acquisition_timeout_millis: 10_000,
            deadlock_resolution_strategy: ResolutionStrategyKind::AbortYounger,
        }
    }
}

impl LockManagerConfig {
    pub fn timeout(&self) -> Option<Duration> {
        if self.lock_acquisition_timeout_millis == 0 {
            None
        } else {
            Some(Duration::from_millis(self.lock_acquisition_timeout_millis))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_a_timeout() {
        let config = LockManagerConfig::default();
        assert!(config.timeout().is_some());
    }

    #[test]
    fn zero_timeout_disables_the_limit() {
        let mut config = LockManagerConfig::default();
        config.lock_acquisition_timeout_millis = 0;
        assert!(config.timeout().is_none());
    }
}
