//! Time source abstraction.
//!
//! The controller needs `now()` (to check invoice expiry) and a way to
//! wait out the §4.1 retry delay. Both go through this trait so tests
//! can exercise scenarios 4 and 6 of §8 (delayed retry, expiry racing a
//! retry) with a virtual clock instead of real sleeps.

use std::time::{Duration, SystemTime};

use async_trait::async_trait;

#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;
    async fn sleep(&self, duration: Duration);
}

/// The real wall clock, backed by `tokio::time::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(any(test, feature = "test-util"))]
pub mod test_util {
    use super::*;
    use std::sync::Mutex;

    /// A manually-advanced clock for deterministic tests. `sleep` doesn't
    /// actually block -- it just records how long the caller asked to
    /// wait and advances `now()` by that much, so tests can assert on
    /// elapsed virtual time without a real 3-second wait.
    #[derive(Debug, Default)]
    pub struct TestClock {
        now: Mutex<SystemTime>,
    }

    impl TestClock {
        pub fn new(start: SystemTime) -> Self {
            Self {
                now: Mutex::new(start),
            }
        }

        pub fn advance(&self, by: Duration) {
            let mut now = self.now.lock().expect("poisoned");
            *now += by;
        }
    }

    #[async_trait]
    impl Clock for TestClock {
        fn now(&self) -> SystemTime {
            *self.now.lock().expect("poisoned")
        }

        async fn sleep(&self, duration: Duration) {
            self.advance(duration);
        }
    }
}
