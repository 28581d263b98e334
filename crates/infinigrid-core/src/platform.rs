//! Platform abstraction for the timing services the engine needs.
//!
//! The signal adapter debounces scroll and resize notifications. Rather than
//! reading the system clock directly, it is handed instants produced by a
//! [`Clock`], so hosts (and tests) can drive time explicitly.

use std::time::Duration;
use web_time::Instant;

/// Provides timing information for a scroller session.
pub trait Clock {
    /// Returns the current instant.
    fn now(&self) -> Instant;

    /// Returns the time elapsed since `since`, saturating at zero.
    fn elapsed(&self, since: Instant) -> Duration {
        self.now().saturating_duration_since(since)
    }
}

/// Wall clock backed by [`web_time::Instant`], usable on native and wasm targets.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
