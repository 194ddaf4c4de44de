//! Per-attempt scoped ownership region (§4.4).
//!
//! Every retryable attempt gets a fresh `AttemptArena`. All transient,
//! attempt-scoped state -- the route reply, request-side buffers, and
//! any timer the attempt scheduled -- is owned by the arena so that
//! replacing it at the next attempt boundary releases everything in one
//! move, with no cross-attempt leakage.

use tracing::debug;

/// A scoped allocation region, recreated once per attempt.
///
/// This is deliberately a plain struct rather than a generic allocator:
/// the spec only requires that attempt-scoped resources are released
/// atomically at attempt boundaries, which `Drop` already gives us for
/// free once those resources live behind `Option` fields here instead
/// of on the [`crate::model::PaymentContext`] itself.
///
/// The retry delay (§4.1's 3-second timer) is *not* stored here: the
/// controller awaits it inline as part of the attempt's own async call
/// stack, so dropping the future returned by [`crate::controller::RetryController::run`]
/// (cancellation, §5) already cancels any outstanding sleep without the
/// arena needing to hold it.
#[derive(Debug, Default)]
pub struct AttemptArena {
    attempt_no: u32,
    route: Option<crate::model::Route>,
}

impl AttemptArena {
    pub fn new(attempt_no: u32) -> Self {
        Self {
            attempt_no,
            route: None,
        }
    }

    pub fn attempt_no(&self) -> u32 {
        self.attempt_no
    }

    pub fn store_route(&mut self, route: crate::model::Route) {
        self.route = Some(route);
    }

    pub fn route(&self) -> Option<&crate::model::Route> {
        self.route.as_ref()
    }
}

impl Drop for AttemptArena {
    fn drop(&mut self) {
        debug!(
            attempt_no = self.attempt_no,
            had_route = self.route.is_some(),
            "releasing attempt arena"
        );
    }
}
