//! Measurement infrastructure for pair latency sessions.
//!
//! This module provides:
//! - The shared-cell ping/pong handshake between two threads
//! - CPU pinning through a swappable [`CoreBinder`]
//! - The per-pair session driver, [`LatencyProbe`]
//! - Monotonic timestamps through [`Timer`]
//!
//! A session involves exactly two threads and one cache line. Everything
//! here busy-spins; the measured quantity is the time for a write on one
//! core to become visible on another and be answered, and any blocking
//! primitive would dwarf it.

mod affinity;
mod handshake;
mod probe;
mod timer;

pub use affinity::{available_cpus, AffinityError, CoreBinder, OsBinder};
pub use handshake::{HandshakeState, SyncChannel};
pub use probe::{LatencyProbe, PairMeasurement, ProbeError};
pub use timer::Timer;
