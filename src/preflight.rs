//! Environment checks before a measurement run.
//!
//! Inter-core latency numbers are only comparable on a quiet, fixed-clock
//! machine. These checks look for the usual reasons a run comes out noisy.
//! Every finding is advisory; the run proceeds regardless.

use serde::{Deserialize, Serialize};

use crate::measurement::available_cpus;

/// Condition that can distort latency measurements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SystemWarning {
    /// CPU frequency scaling is not pinned to performance mode, so cores
    /// may change clocks between pairs.
    CpuGovernorNotPerformance {
        /// Current governor setting.
        current: String,
    },

    /// Simultaneous multithreading is active. Sibling hyperthreads share a
    /// core, so pairs landing on siblings read far lower than true
    /// core-to-core latency.
    SmtEnabled,

    /// Running under a hypervisor. Pinning a thread to a virtual CPU does
    /// not pin the virtual CPU to hardware.
    VirtualMachineDetected,

    /// The machine is busy. Busy-spinning pairs compete with the existing
    /// load for cores.
    HighSystemLoad {
        /// One-minute load average.
        load_average: f64,
        /// Threshold it exceeded.
        threshold: f64,
    },
}

impl SystemWarning {
    /// Human-readable description with a remediation hint.
    pub fn description(&self) -> String {
        match self {
            SystemWarning::CpuGovernorNotPerformance { current } => {
                format!(
                    "CPU frequency governor is '{current}', not 'performance'. \
                     Set with: sudo cpupower frequency-set -g performance"
                )
            }
            SystemWarning::SmtEnabled => {
                "SMT is active. Pairs on sibling hyperthreads share a core and \
                 will read much lower than true core-to-core latency."
                    .to_string()
            }
            SystemWarning::VirtualMachineDetected => {
                "Running in a virtual machine. CPU pinning applies to virtual \
                 CPUs only, so results may not reflect real core topology."
                    .to_string()
            }
            SystemWarning::HighSystemLoad {
                load_average,
                threshold,
            } => {
                format!(
                    "High system load: {load_average:.2} (threshold: {threshold:.2}). \
                     Other processes will steal cycles from the spinning threads."
                )
            }
        }
    }
}

/// Perform all environment checks.
///
/// Returns one warning per detected condition. On platforms without the
/// checks, returns an empty vector.
pub fn system_check() -> Vec<SystemWarning> {
    #[allow(unused_mut)]
    let mut warnings = Vec::new();

    #[cfg(target_os = "linux")]
    {
        if let Some(warning) = check_cpu_governor_linux() {
            warnings.push(warning);
        }
        if let Some(warning) = check_smt_linux() {
            warnings.push(warning);
        }
        if let Some(warning) = check_vm_linux() {
            warnings.push(warning);
        }
        if let Some(warning) = check_load_linux() {
            warnings.push(warning);
        }
    }

    warnings
}

#[cfg(target_os = "linux")]
fn check_cpu_governor_linux() -> Option<SystemWarning> {
    // Missing cpufreq (containers, some VMs) is not worth a warning of
    // its own.
    let governor =
        std::fs::read_to_string("/sys/devices/system/cpu/cpu0/cpufreq/scaling_governor").ok()?;
    let governor = governor.trim().to_lowercase();
    if governor != "performance" {
        Some(SystemWarning::CpuGovernorNotPerformance { current: governor })
    } else {
        None
    }
}

#[cfg(target_os = "linux")]
fn check_smt_linux() -> Option<SystemWarning> {
    let active = std::fs::read_to_string("/sys/devices/system/cpu/smt/active").ok()?;
    if active.trim() == "1" {
        Some(SystemWarning::SmtEnabled)
    } else {
        None
    }
}

#[cfg(target_os = "linux")]
fn check_vm_linux() -> Option<SystemWarning> {
    let cpuinfo = std::fs::read_to_string("/proc/cpuinfo").ok()?;
    if cpuinfo.to_lowercase().contains("hypervisor") {
        Some(SystemWarning::VirtualMachineDetected)
    } else {
        None
    }
}

#[cfg(target_os = "linux")]
fn check_load_linux() -> Option<SystemWarning> {
    let loadavg = std::fs::read_to_string("/proc/loadavg").ok()?;
    let load = loadavg
        .split_whitespace()
        .next()
        .and_then(|val| val.parse::<f64>().ok())?;

    // Half the cores busy already leaves little room for clean spinning.
    let threshold = (available_cpus() as f64 * 0.5).max(1.0);
    if load > threshold {
        Some(SystemWarning::HighSystemLoad {
            load_average: load,
            threshold,
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_check_does_not_panic() {
        let _warnings = system_check();
    }

    #[test]
    fn descriptions_name_the_offending_values() {
        let warning = SystemWarning::CpuGovernorNotPerformance {
            current: "powersave".to_string(),
        };
        assert!(warning.description().contains("powersave"));
        assert!(warning.description().contains("performance"));

        let warning = SystemWarning::HighSystemLoad {
            load_average: 12.5,
            threshold: 8.0,
        };
        assert!(warning.description().contains("12.50"));
        assert!(warning.description().contains("8.00"));

        assert!(SystemWarning::SmtEnabled.description().contains("SMT"));
        assert!(SystemWarning::VirtualMachineDetected
            .description()
            .contains("virtual machine"));
    }

    #[test]
    fn warnings_serialize_for_reports() {
        let warning = SystemWarning::SmtEnabled;
        let json = serde_json::to_string(&warning).unwrap();
        assert!(json.contains("SmtEnabled"));
    }
}
