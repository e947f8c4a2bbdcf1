use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// One-shot signal. Starts unset; `signal` sets it permanently and is
/// idempotent. Waiters return immediately once set.
#[derive(Default)]
pub struct ReadinessGate {
    state: Mutex<bool>,
    cv: Condvar,
}

impl ReadinessGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signal(&self) {
        let mut signaled = self.state.lock();
        if !*signaled {
            *signaled = true;
            self.cv.notify_all();
        }
    }

    pub fn is_signaled(&self) -> bool {
        *self.state.lock()
    }

    /// Blocks the calling thread until the gate is signaled.
    pub fn wait(&self) {
        let mut signaled = self.state.lock();
        while !*signaled {
            self.cv.wait(&mut signaled);
        }
    }

    /// Bounded wait; returns whether the gate was signaled.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut signaled = self.state.lock();
        while !*signaled {
            if self.cv.wait_until(&mut signaled, deadline).timed_out() {
                return *signaled;
            }
        }
        true
    }
}
