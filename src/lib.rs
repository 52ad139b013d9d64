//! # core-latency
//!
//! Measure the pairwise communication latency between CPU cores.
//!
//! For every pair of CPUs, one thread is pinned to each core and the two
//! play ping-pong through a single shared cache line: the primary writes,
//! the responder answers, and the primary times the round trip with a
//! high-resolution monotonic clock. The per-pair means are assembled into
//! a symmetric CPU-by-CPU matrix that exposes the machine's topology:
//! cores sharing a cluster or an L3 slice answer each other noticeably
//! faster than cores across sockets.
//!
//! ## Quick Start
//!
//! ```no_run
//! let matrix = core_latency::measure()?;
//! println!("{}", core_latency::output::terminal::render(&matrix));
//! # Ok::<(), core_latency::MeasureError>(())
//! ```
//!
//! Or with explicit control:
//!
//! ```no_run
//! use core_latency::LatencyMeter;
//!
//! let matrix = LatencyMeter::new().cpus(4).round_trips(16).run()?;
//! for (first, second, latency) in matrix.measured() {
//!     println!("CPU {first} <-> CPU {second}: {latency:?}");
//! }
//! # Ok::<(), core_latency::MeasureError>(())
//! ```
//!
//! ## Reading the numbers
//!
//! Both threads busy-spin for the whole session, so a run briefly takes two
//! cores to 100% per pair. Numbers are only meaningful on a quiet machine
//! with a fixed CPU clock; [`preflight::system_check`] flags the common
//! problems. Pairs that land on SMT siblings of the same physical core read
//! far below true core-to-core latency.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
mod config;
mod matrix;
mod meter;

// Functional modules
pub mod measurement;
pub mod output;
pub mod preflight;

// Re-exports for public API
pub use config::Config;
pub use matrix::LatencyMatrix;
pub use measurement::Timer;
pub use meter::{LatencyMeter, MeasureError};

/// Convenience function: measure every CPU pair with the default
/// configuration.
///
/// Equivalent to `LatencyMeter::new().run()`. Pins threads to real cores
/// and measures pairs one after another, so expect the call to occupy the
/// machine for a moment.
///
/// # Errors
///
/// Fails if no CPUs can be detected or any pair session fails; nothing is
/// returned for a partial run.
pub fn measure() -> Result<LatencyMatrix, MeasureError> {
    LatencyMeter::new().run()
}
