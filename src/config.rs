//! Configuration for a measurement run.

/// Configuration options for [`LatencyMeter`](crate::LatencyMeter).
#[derive(Debug, Clone)]
pub struct Config {
    /// Number of CPUs to cover (default: `None`, meaning every CPU the OS
    /// reports).
    ///
    /// CPUs `0..cpus` are measured. An explicit value larger than the
    /// machine fails the run before any pair is probed.
    pub cpus: Option<usize>,

    /// Timed round trips per CPU pair (default: 8). Clamped to at least 1.
    pub round_trips: usize,

    /// Unrecorded round trips before the timed ones, per pair (default: 32).
    ///
    /// Warmup lands both threads on their cores and settles the cache line
    /// before anything is recorded.
    pub warmup: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cpus: None,
            round_trips: 8,
            warmup: 32,
        }
    }
}
