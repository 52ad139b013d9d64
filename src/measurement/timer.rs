//! Monotonic high-resolution timestamps for the timed region.
//!
//! A round-trip sample is always the difference between two reads of the
//! same monotonic clock, taken immediately before the ping is published and
//! immediately after the pong is observed. Nothing here queries a clock's
//! resolution and calls it an elapsed time; resolution is only reported as
//! a diagnostic.
//!
//! The backing clock is [`quanta::Clock`]: TSC-based with calibration on
//! the platforms that have an invariant counter, the OS monotonic source
//! elsewhere. `raw()` is the cheapest possible read, so the timestamp cost
//! intrudes as little as possible on the tens-of-nanoseconds quantity being
//! measured.

use std::sync::Arc;
use std::time::Duration;

use quanta::Clock;

/// Monotonic timestamp source bounding the timed region of a probe.
///
/// The probe takes the timer as a collaborator, so the timing backend is a
/// configuration concern: production uses the calibrated clock from
/// [`Timer::new`], tests can substitute the controllable clock from
/// [`Timer::mock`].
#[derive(Debug, Clone)]
pub struct Timer {
    clock: Clock,
}

impl Timer {
    /// Timer over the calibrated system clock.
    ///
    /// The first construction in a process calibrates the TSC against the
    /// OS monotonic clock; subsequent constructions share that calibration.
    pub fn new() -> Self {
        Self {
            clock: Clock::new(),
        }
    }

    /// Timer over a controllable mock clock.
    ///
    /// The returned handle advances time explicitly; `raw()` does not move
    /// on its own. Only useful in tests.
    pub fn mock() -> (Self, Arc<quanta::Mock>) {
        let (clock, mock) = Clock::mock();
        (Self { clock }, mock)
    }

    /// Raw monotonic timestamp. Minimal overhead; no unit of its own.
    #[inline]
    pub fn raw(&self) -> u64 {
        self.clock.raw()
    }

    /// Wall-clock time between two [`raw`](Self::raw) reads.
    #[inline]
    pub fn delta(&self, start: u64, end: u64) -> Duration {
        self.clock.delta(start, end)
    }

    /// Smallest non-zero interval observed between consecutive reads, in
    /// nanoseconds. Diagnostic only; never recorded as a sample.
    pub fn resolution_ns(&self) -> f64 {
        let mut min = Duration::MAX;
        for _ in 0..1_000 {
            let a = self.raw();
            let b = self.raw();
            let d = self.delta(a, b);
            if d > Duration::ZERO && d < min {
                min = d;
            }
        }
        if min == Duration::MAX {
            // Clock never advanced between reads (mock, or a very coarse
            // source).
            1.0
        } else {
            min.as_nanos() as f64
        }
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
