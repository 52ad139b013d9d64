//! Measurements on real hardware.
//!
//! These tests pin threads to real cores through the OS, so they run
//! serialized and skip themselves on machines without enough CPUs.

use std::time::Duration;

use serial_test::serial;

use core_latency::measurement::{available_cpus, LatencyProbe, OsBinder, Timer};
use core_latency::LatencyMeter;

#[test]
#[serial]
fn real_pair_reads_a_positive_latency() {
    if available_cpus() < 2 {
        eprintln!("skipping: fewer than two CPUs");
        return;
    }

    let measurement = LatencyProbe::new(0, 1)
        .run(&OsBinder, &Timer::new(), 8, 32)
        .expect("session should complete");

    assert_eq!(measurement.samples().len(), 8);
    assert!(measurement.mean() > Duration::ZERO);
    // A round trip is tens to hundreds of nanoseconds; a full second
    // means something hung.
    assert!(measurement.mean() < Duration::from_secs(1));
}

#[test]
#[serial]
fn two_cpu_matrix_completes_on_real_cores() {
    if available_cpus() < 2 {
        eprintln!("skipping: fewer than two CPUs");
        return;
    }

    let matrix = LatencyMeter::new()
        .cpus(2)
        .round_trips(4)
        .warmup(8)
        .run()
        .expect("run should complete");

    assert!(matrix.is_complete());
    assert!(matrix.get(0, 1).unwrap() > Duration::ZERO);
    assert_eq!(matrix.get(0, 1), matrix.get(1, 0));
}

#[test]
#[serial]
fn self_pair_on_one_core_still_finishes() {
    if available_cpus() < 1 {
        eprintln!("skipping: no CPUs reported");
        return;
    }

    // Both threads pinned to CPU 0. The scheduler interleaves them, so
    // each round trip costs scheduling quanta instead of cache misses,
    // but the protocol still terminates.
    let measurement = LatencyProbe::new(0, 0)
        .run(&OsBinder, &Timer::new(), 1, 0)
        .expect("session should complete");

    assert_eq!(measurement.samples().len(), 1);
}
