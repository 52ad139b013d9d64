//! Run orchestration: from a configuration to a finished matrix.

use tracing::{debug, info};

use crate::config::Config;
use crate::matrix::LatencyMatrix;
use crate::measurement::{
    available_cpus, CoreBinder, LatencyProbe, OsBinder, ProbeError, Timer,
};

/// Failure of a measurement run.
#[derive(Debug)]
pub enum MeasureError {
    /// The OS reported no usable CPUs.
    NoCpus,
    /// More CPUs were requested than the machine has.
    InsufficientCpus {
        /// CPU count asked for in the configuration.
        requested: usize,
        /// CPU count the OS reports.
        available: usize,
    },
    /// One pair session failed. Nothing is recorded for the run.
    Pair {
        /// CPU the primary thread was pinned to.
        first: usize,
        /// CPU the responder thread was pinned to.
        second: usize,
        /// The session failure.
        source: ProbeError,
    },
}

impl std::fmt::Display for MeasureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoCpus => write!(f, "no CPUs detected on this system"),
            Self::InsufficientCpus {
                requested,
                available,
            } => write!(
                f,
                "requested {requested} CPUs but only {available} are available"
            ),
            Self::Pair {
                first,
                second,
                source,
            } => write!(
                f,
                "measurement between CPU {first} and CPU {second} failed: {source}"
            ),
        }
    }
}

impl std::error::Error for MeasureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Pair { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Measures inter-core latency for every CPU pair and assembles the
/// [`LatencyMatrix`].
///
/// Pairs are measured strictly one after another, never concurrently, so
/// each session owns its two cores. Expect a full run to take a noticeable
/// moment on large machines: the pair count grows quadratically.
///
/// # Example
///
/// ```no_run
/// use core_latency::LatencyMeter;
///
/// let matrix = LatencyMeter::new().cpus(4).round_trips(16).run()?;
/// for (first, second, latency) in matrix.measured() {
///     println!("CPU {first} <-> CPU {second}: {latency:?}");
/// }
/// # Ok::<(), core_latency::MeasureError>(())
/// ```
#[derive(Debug, Clone)]
pub struct LatencyMeter {
    config: Config,
}

impl LatencyMeter {
    /// Meter with the default configuration.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Meter with an explicit configuration.
    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    /// Cover CPUs `0..cpus` instead of every CPU the OS reports.
    pub fn cpus(mut self, cpus: usize) -> Self {
        self.config.cpus = Some(cpus);
        self
    }

    /// Timed round trips per pair. Clamped to at least 1.
    pub fn round_trips(mut self, round_trips: usize) -> Self {
        self.config.round_trips = round_trips.max(1);
        self
    }

    /// Unrecorded round trips before the timed ones, per pair.
    pub fn warmup(mut self, warmup: usize) -> Self {
        self.config.warmup = warmup;
        self
    }

    /// The effective configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Measure every pair on the real hardware.
    ///
    /// Validates the requested CPU count against what the OS reports, then
    /// runs with OS thread pinning and the calibrated clock.
    pub fn run(&self) -> Result<LatencyMatrix, MeasureError> {
        let available = available_cpus();
        if available == 0 {
            return Err(MeasureError::NoCpus);
        }
        if let Some(requested) = self.config.cpus {
            if requested > available {
                return Err(MeasureError::InsufficientCpus {
                    requested,
                    available,
                });
            }
        }
        self.run_with(&OsBinder, &Timer::new())
    }

    /// Measure every pair with an explicit binder and timer.
    ///
    /// This is the seam for tests: substituting a binder that does not
    /// touch OS affinity exercises the full protocol on any machine.
    pub fn run_with<B: CoreBinder>(
        &self,
        binder: &B,
        timer: &Timer,
    ) -> Result<LatencyMatrix, MeasureError> {
        let cpus = self.config.cpus.unwrap_or_else(available_cpus);
        let round_trips = self.config.round_trips.max(1);
        let mut matrix = LatencyMatrix::new(cpus);

        debug!(
            "measuring {cpus} CPUs, {round_trips} round trips per pair, timer resolution ~{:.1} ns",
            timer.resolution_ns()
        );

        for first in 0..cpus {
            for second in (first + 1)..cpus {
                info!("measuring latency between CPU {first} and CPU {second}");
                let measurement = LatencyProbe::new(first, second)
                    .run(binder, timer, round_trips, self.config.warmup)
                    .map_err(|source| MeasureError::Pair {
                        first,
                        second,
                        source,
                    })?;
                debug!(
                    "pair ({first}, {second}): mean {:?} over {} round trips",
                    measurement.mean(),
                    measurement.samples().len()
                );
                matrix.record_pair(first, second, measurement.mean());
            }
        }

        Ok(matrix)
    }
}

impl Default for LatencyMeter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::AffinityError;

    struct Permissive;

    impl CoreBinder for Permissive {
        fn bind(&self, _cpu: usize) -> Result<(), AffinityError> {
            Ok(())
        }
    }

    #[test]
    fn builder_methods_update_the_config() {
        let meter = LatencyMeter::new().cpus(4).round_trips(16).warmup(5);
        assert_eq!(meter.config().cpus, Some(4));
        assert_eq!(meter.config().round_trips, 16);
        assert_eq!(meter.config().warmup, 5);
    }

    #[test]
    fn zero_round_trips_clamp_to_one() {
        let meter = LatencyMeter::new().round_trips(0);
        assert_eq!(meter.config().round_trips, 1);
    }

    #[test]
    fn with_config_keeps_the_given_values() {
        let config = Config {
            cpus: Some(2),
            round_trips: 3,
            warmup: 0,
        };
        let meter = LatencyMeter::with_config(config);
        assert_eq!(meter.config().cpus, Some(2));
        assert_eq!(meter.config().round_trips, 3);
    }

    #[test]
    fn absurd_cpu_request_is_rejected_before_measuring() {
        let err = LatencyMeter::new()
            .cpus(usize::MAX)
            .run()
            .expect_err("no machine has usize::MAX CPUs");

        match err {
            MeasureError::InsufficientCpus {
                requested,
                available,
            } => {
                assert_eq!(requested, usize::MAX);
                assert!(available >= 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn small_cpu_counts_yield_trivially_complete_matrices() {
        for cpus in [0, 1] {
            let matrix = LatencyMeter::new()
                .cpus(cpus)
                .run_with(&Permissive, &Timer::new())
                .expect("no pairs means nothing can fail");
            assert_eq!(matrix.cpus(), cpus);
            assert!(matrix.is_complete());
        }
    }
}
