//! Pairwise latency results.

use std::time::Duration;

/// Symmetric CPU-by-CPU latency matrix.
///
/// Cell `(i, j)` holds the measured round-trip latency between CPUs `i`
/// and `j`, or `None` where no measurement exists. Diagonal cells are
/// always `None`: a CPU has no inter-core latency to itself. Off-diagonal
/// cells are recorded in mirrored pairs, so `get(i, j) == get(j, i)`.
#[derive(Debug, Clone)]
pub struct LatencyMatrix {
    cpus: usize,
    cells: Vec<Option<Duration>>,
}

impl LatencyMatrix {
    pub(crate) fn new(cpus: usize) -> Self {
        Self {
            cpus,
            cells: vec![None; cpus * cpus],
        }
    }

    /// Number of CPUs covered, per axis.
    pub fn cpus(&self) -> usize {
        self.cpus
    }

    /// Latency between two CPUs, if measured.
    ///
    /// # Panics
    ///
    /// Panics if either index is `>= cpus()`.
    pub fn get(&self, first: usize, second: usize) -> Option<Duration> {
        self.cells[first * self.cpus + second]
    }

    /// Record a measurement into both mirrored cells.
    pub(crate) fn record_pair(&mut self, first: usize, second: usize, latency: Duration) {
        debug_assert_ne!(first, second, "diagonal cells stay unmeasured");
        self.cells[first * self.cpus + second] = Some(latency);
        self.cells[second * self.cpus + first] = Some(latency);
    }

    /// Whether every off-diagonal cell holds a value.
    pub fn is_complete(&self) -> bool {
        if self.cpus < 2 {
            return true;
        }
        self.measured().count() == self.cpus * (self.cpus - 1) / 2
    }

    /// Every measured pair, once each, with `first < second`.
    pub fn measured(&self) -> impl Iterator<Item = (usize, usize, Duration)> + '_ {
        (0..self.cpus).flat_map(move |first| {
            ((first + 1)..self.cpus).filter_map(move |second| {
                self.get(first, second)
                    .map(|latency| (first, second, latency))
            })
        })
    }
}
