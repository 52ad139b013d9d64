//! Single-pair latency session.
//!
//! A probe measures one ordered CPU pair. The calling thread pins itself to
//! the first CPU and plays the primary; a freshly spawned scoped thread pins
//! itself to the second CPU and plays the responder. The two sides then
//! exchange ping/pong writes through one [`SyncChannel`] cell, and the
//! primary timestamps each round trip with two [`Timer::raw`] reads.
//!
//! Both sides busy-spin for the whole session. No sleeps, no parking, no
//! yields: waking a blocked thread costs microseconds and would bury the
//! tens-of-nanoseconds signal being measured.

use std::io;
use std::thread;
use std::time::Duration;

use crate::measurement::affinity::{AffinityError, CoreBinder};
use crate::measurement::handshake::{HandshakeState, SyncChannel};
use crate::measurement::timer::Timer;

/// Failure of a single pair session.
#[derive(Debug)]
pub enum ProbeError {
    /// One of the two threads could not be pinned to its CPU.
    Affinity(AffinityError),
    /// The OS refused to spawn the responder thread.
    Spawn(io::Error),
    /// The responder thread panicked mid-session.
    ResponderPanicked,
}

impl std::fmt::Display for ProbeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Affinity(err) => write!(f, "could not pin a benchmark thread: {err}"),
            Self::Spawn(err) => write!(f, "could not spawn the responder thread: {err}"),
            Self::ResponderPanicked => write!(f, "the responder thread panicked"),
        }
    }
}

impl std::error::Error for ProbeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Affinity(err) => Some(err),
            Self::Spawn(err) => Some(err),
            Self::ResponderPanicked => None,
        }
    }
}

impl From<AffinityError> for ProbeError {
    fn from(err: AffinityError) -> Self {
        Self::Affinity(err)
    }
}

/// Round-trip samples from one completed pair session.
#[derive(Debug, Clone)]
pub struct PairMeasurement {
    samples: Vec<Duration>,
}

impl PairMeasurement {
    /// Individual round-trip times, in session order.
    pub fn samples(&self) -> &[Duration] {
        &self.samples
    }

    /// Arithmetic mean of the samples.
    pub fn mean(&self) -> Duration {
        if self.samples.is_empty() {
            return Duration::ZERO;
        }
        let total: Duration = self.samples.iter().sum();
        total / self.samples.len() as u32
    }
}

/// One ordered CPU pair to measure.
///
/// ```no_run
/// use core_latency::measurement::{LatencyProbe, OsBinder, Timer};
///
/// let probe = LatencyProbe::new(0, 1);
/// let measurement = probe.run(&OsBinder, &Timer::new(), 8, 32)?;
/// println!("cpu 0 <-> cpu 1: {:?}", measurement.mean());
/// # Ok::<(), core_latency::measurement::ProbeError>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct LatencyProbe {
    first_cpu: usize,
    second_cpu: usize,
}

impl LatencyProbe {
    /// Probe between `first_cpu` (the calling thread) and `second_cpu`
    /// (a spawned responder).
    pub fn new(first_cpu: usize, second_cpu: usize) -> Self {
        Self {
            first_cpu,
            second_cpu,
        }
    }

    /// Run one session: `warmup` unrecorded round trips, then
    /// `round_trips` timed ones.
    ///
    /// Pins the calling thread to the first CPU for the duration of the
    /// session and does not restore the previous affinity afterwards.
    /// `round_trips` is clamped to at least 1.
    pub fn run<B: CoreBinder>(
        &self,
        binder: &B,
        timer: &Timer,
        round_trips: usize,
        warmup: usize,
    ) -> Result<PairMeasurement, ProbeError> {
        let round_trips = round_trips.max(1);

        binder.bind(self.first_cpu)?;

        let sync = SyncChannel::new();
        let mut samples = Vec::with_capacity(round_trips);

        thread::scope(|scope| {
            let responder = thread::Builder::new()
                .name(format!("responder-cpu{}", self.second_cpu))
                .spawn_scoped(scope, || respond(binder, &sync, self.second_cpu))
                .map_err(ProbeError::Spawn)?;

            // The responder leaves Preparing for exactly one of Ready or
            // Faulted. On Faulted it has already returned, so the join is
            // near-immediate.
            if sync.wait_as_long_as(HandshakeState::Preparing) == HandshakeState::Faulted {
                return match responder.join() {
                    Ok(Err(err)) => Err(ProbeError::Affinity(err)),
                    Ok(Ok(())) => unreachable!("faulted responder reported success"),
                    Err(_) => Err(ProbeError::ResponderPanicked),
                };
            }

            for _ in 0..warmup {
                sync.set(HandshakeState::Ping);
                sync.wait_until(HandshakeState::Pong);
            }

            for _ in 0..round_trips {
                let start = timer.raw();
                sync.set(HandshakeState::Ping);
                sync.wait_until(HandshakeState::Pong);
                let end = timer.raw();
                samples.push(timer.delta(start, end));
            }

            sync.set(HandshakeState::Finish);

            match responder.join() {
                Ok(Ok(())) => Ok(()),
                Ok(Err(err)) => Err(ProbeError::Affinity(err)),
                Err(_) => Err(ProbeError::ResponderPanicked),
            }
        })?;

        Ok(PairMeasurement { samples })
    }
}

/// Responder side of the session, run on the spawned thread.
fn respond<B: CoreBinder>(
    binder: &B,
    sync: &SyncChannel,
    cpu: usize,
) -> Result<(), AffinityError> {
    if let Err(err) = binder.bind(cpu) {
        sync.set(HandshakeState::Faulted);
        return Err(err);
    }
    sync.set(HandshakeState::Ready);

    let mut state = sync.wait_as_long_as(HandshakeState::Ready);
    while state != HandshakeState::Finish {
        if state == HandshakeState::Ping {
            sync.set(HandshakeState::Pong);
        }
        state = sync.wait_as_long_as(HandshakeState::Pong);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Binder that accepts every CPU without touching OS affinity.
    struct Permissive;

    impl CoreBinder for Permissive {
        fn bind(&self, _cpu: usize) -> Result<(), AffinityError> {
            Ok(())
        }
    }

    /// Binder that rejects exactly one CPU.
    struct RejectCpu(usize);

    impl CoreBinder for RejectCpu {
        fn bind(&self, cpu: usize) -> Result<(), AffinityError> {
            if cpu == self.0 {
                Err(AffinityError::BindRejected { cpu })
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn session_records_one_sample_per_round_trip() {
        let probe = LatencyProbe::new(0, 1);
        let measurement = probe
            .run(&Permissive, &Timer::new(), 4, 2)
            .expect("session should complete");

        assert_eq!(measurement.samples().len(), 4);
        assert!(measurement.samples().iter().all(|s| *s > Duration::ZERO));
    }

    #[test]
    fn mean_is_the_truncating_average_of_the_samples() {
        let probe = LatencyProbe::new(0, 1);
        let measurement = probe
            .run(&Permissive, &Timer::new(), 8, 0)
            .expect("session should complete");

        let total: Duration = measurement.samples().iter().sum();
        assert_eq!(measurement.mean(), total / 8);

        let min = measurement.samples().iter().min().unwrap();
        let max = measurement.samples().iter().max().unwrap();
        assert!(*min <= measurement.mean() && measurement.mean() <= *max);
    }

    #[test]
    fn zero_round_trips_still_measures_once() {
        let probe = LatencyProbe::new(0, 1);
        let measurement = probe
            .run(&Permissive, &Timer::new(), 0, 0)
            .expect("session should complete");

        assert_eq!(measurement.samples().len(), 1);
    }

    #[test]
    fn self_pair_session_completes() {
        // Without real pinning both threads float, so a (0, 0) pair is
        // just a regular two-thread handshake.
        let probe = LatencyProbe::new(0, 0);
        let measurement = probe
            .run(&Permissive, &Timer::new(), 2, 0)
            .expect("session should complete");

        assert_eq!(measurement.samples().len(), 2);
    }

    #[test]
    fn responder_bind_failure_surfaces_without_hanging() {
        let probe = LatencyProbe::new(0, 1);
        let err = probe
            .run(&RejectCpu(1), &Timer::new(), 4, 4)
            .expect_err("responder bind should fail");

        match err {
            ProbeError::Affinity(AffinityError::BindRejected { cpu }) => assert_eq!(cpu, 1),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn primary_bind_failure_fails_before_spawning() {
        let probe = LatencyProbe::new(0, 1);
        let err = probe
            .run(&RejectCpu(0), &Timer::new(), 4, 4)
            .expect_err("primary bind should fail");

        match err {
            ProbeError::Affinity(AffinityError::BindRejected { cpu }) => assert_eq!(cpu, 0),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_measurement_mean_is_zero() {
        let measurement = PairMeasurement {
            samples: Vec::new(),
        };
        assert_eq!(measurement.mean(), Duration::ZERO);
    }

    #[test]
    fn probe_errors_format_with_context() {
        let err = ProbeError::Affinity(AffinityError::BindRejected { cpu: 3 });
        assert!(err.to_string().contains("pin"));
        assert!(err.to_string().contains('3'));

        assert!(ProbeError::ResponderPanicked.to_string().contains("panicked"));
    }
}
