//! How a client backs off between failed acquisition attempts. Pluggable
//! per resource type, grounded in the retry/backoff knobs
//! `transaction::lock_manager::acquire_lock_with_timeout` hardcodes as a
//! fixed sleep — here pulled out into a trait so tests can use a
//! near-zero backoff while production configs use something gentler.

use std::thread;
use std::time::Duration;

pub trait WaitStrategy: Send + Sync {
    /// Called once per failed attempt, `tries` being the number of
    /// attempts made so far (including the one that just failed).
    fn apply(&self, tries: u32);
}

/// Used by `Client` when a caller configures fewer wait strategies than
/// resource types.
pub(crate) static FALLBACK_WAIT_STRATEGY: ConstantSleep = ConstantSleep(Duration::from_millis(5));

/// Doubles the delay on each attempt up to `cap`.
pub struct ExponentialBackoff {
    pub base: Duration,
    pub cap: Duration,
}

impl ExponentialBackoff {
    pub fn new(base: Duration, cap: Duration) -> Self {
        ExponentialBackoff { base, cap }
    }
}

impl WaitStrategy for ExponentialBackoff {
    fn apply(&self, tries: u32) {
        let shift = tries.min(20);
        let delay = self.base.checked_mul(1u32 << shift).unwrap_or(self.cap);
        thread::sleep(delay.min(self.cap));
    }
}

/// Fixed sleep regardless of attempt count.
pub struct ConstantSleep(pub Duration);

impl WaitStrategy for ConstantSleep {
    fn apply(&self, _tries: u32) {
        thread::sleep(self.0);
    }
}

/// Spins briefly before falling back to `yield_now`. Only appropriate for
/// locks expected to be held for a handful of instructions; exposed mainly
/// for tests that want retries to be as cheap as possible.
pub struct SpinYield;

impl WaitStrategy for SpinYield {
    fn apply(&self, tries: u32) {
        if tries < 10 {
            std::hint::spin_loop();
        } else {
            thread::yield_now();
        }
    }
}
