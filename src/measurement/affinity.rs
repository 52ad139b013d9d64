//! CPU affinity binding for probe threads.
//!
//! Both threads of a probe pin themselves before any timed work; a thread
//! that silently runs on the wrong core would measure the wrong pair.
//! Binding is therefore a fallible capability rather than a fire-and-forget
//! call: the OS answer is checked and surfaced, and tests substitute their
//! own [`CoreBinder`] to exercise the failure paths without touching the
//! scheduler.

use std::error::Error;
use std::fmt;

use tracing::{debug, warn};

/// Error raised when a thread cannot be bound to a logical CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AffinityError {
    /// The requested CPU index is not among the cores the OS reports.
    UnknownCpu {
        /// The index that was asked for.
        cpu: usize,
        /// How many cores the OS reports as usable.
        available: usize,
    },
    /// The OS rejected the affinity mask for a known CPU.
    BindRejected {
        /// The index whose mask was rejected.
        cpu: usize,
    },
}

impl fmt::Display for AffinityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AffinityError::UnknownCpu { cpu, available } => write!(
                f,
                "CPU {cpu} is not available (the system reports {available} usable cores)"
            ),
            AffinityError::BindRejected { cpu } => {
                write!(f, "the OS rejected pinning the current thread to CPU {cpu}")
            }
        }
    }
}

impl Error for AffinityError {}

/// Capability to pin the calling thread to one logical CPU.
///
/// Called once per thread, immediately after thread start and before any
/// timed work. Implementations must not block: the responder calls `bind`
/// while the primary is already spinning on the handshake cell.
pub trait CoreBinder: Sync {
    /// Restrict the calling thread to `cpu`.
    fn bind(&self, cpu: usize) -> Result<(), AffinityError>;
}

/// Production binder backed by the OS scheduler.
///
/// CPU indices are resolved against the cores the OS actually reports, so
/// an out-of-range index fails here instead of silently measuring whichever
/// core the scheduler happened to pick.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsBinder;

impl CoreBinder for OsBinder {
    fn bind(&self, cpu: usize) -> Result<(), AffinityError> {
        let cores = core_affinity::get_core_ids().unwrap_or_default();
        let core = cores
            .get(cpu)
            .copied()
            .ok_or(AffinityError::UnknownCpu {
                cpu,
                available: cores.len(),
            })?;
        if core_affinity::set_for_current(core) {
            debug!("bound thread to CPU {cpu}");
            Ok(())
        } else {
            warn!("failed to bind thread to CPU {cpu}");
            Err(AffinityError::BindRejected { cpu })
        }
    }
}

/// Number of logical CPUs the OS reports as usable for pinning.
pub fn available_cpus() -> usize {
    core_affinity::get_core_ids().map_or(0, |ids| ids.len())
}
