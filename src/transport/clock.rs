//! # Clock Capability
//!
//! The throttled port paces itself against wall-clock time. Reading the
//! clock through a capability trait instead of `Instant::now()` directly
//! lets tests drive the pacing logic with a deterministic fake instead of
//! sleeping in real time.

use std::thread;
use std::time::{Duration, Instant};

/// Source of monotonic time plus the ability to block until a deadline.
pub trait Clock {
    /// Current monotonic time.
    fn now(&self) -> Instant;

    /// Block the calling thread for `duration`.
    fn sleep(&self, duration: Duration);
}

/// The real thing: `Instant::now()` and `thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Deterministic clock for pacing tests. `sleep` advances the fake time
    /// instead of blocking, and every sleep is recorded.
    #[derive(Clone)]
    pub(crate) struct FakeClock {
        inner: Rc<RefCell<Inner>>,
    }

    struct Inner {
        now: Instant,
        slept: Vec<Duration>,
    }

    impl FakeClock {
        pub(crate) fn new() -> Self {
            FakeClock {
                inner: Rc::new(RefCell::new(Inner {
                    now: Instant::now(),
                    slept: Vec::new(),
                })),
            }
        }

        /// Move time forward without sleeping (models elapsed work).
        pub(crate) fn advance(&self, duration: Duration) {
            self.inner.borrow_mut().now += duration;
        }

        pub(crate) fn slept(&self) -> Vec<Duration> {
            self.inner.borrow().slept.clone()
        }

        pub(crate) fn total_slept(&self) -> Duration {
            self.inner.borrow().slept.iter().sum()
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> Instant {
            self.inner.borrow().now
        }

        fn sleep(&self, duration: Duration) {
            let mut inner = self.inner.borrow_mut();
            inner.now += duration;
            inner.slept.push(duration);
        }
    }
}
