//! Process and system readings from `/proc` (Linux only).
//!
//! Parsing is split from reading so the parsers are testable anywhere; on
//! other platforms the readers return `ProcError::Unsupported`.

#[cfg(target_os = "linux")]
use std::fs;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed {0}")]
    Malformed(&'static str),
    #[error("{0} is not supported on this platform")]
    Unsupported(&'static str),
}

pub type Result<T> = std::result::Result<T, ProcError>;

/// System memory in bytes, plus the used share in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemoryStats {
    pub total: u64,
    pub available: u64,
    pub used: u64,
    pub free: u64,
    pub used_percent: f64,
}

/// Aggregate CPU jiffies since boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuTimes {
    pub busy: u64,
    pub total: u64,
}

impl CpuTimes {
    /// Busy share (0..=100) between `earlier` and `self`.
    pub fn percent_since(&self, earlier: &CpuTimes) -> f64 {
        let total = self.total.saturating_sub(earlier.total);
        if total == 0 {
            return 0.0;
        }
        let busy = self.busy.saturating_sub(earlier.busy);
        (busy as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
    }
}

#[cfg(target_os = "linux")]
pub fn thread_count() -> Result<u64> {
    parse_status_threads(&fs::read_to_string("/proc/self/status")?)
}

#[cfg(not(target_os = "linux"))]
pub fn thread_count() -> Result<u64> {
    Err(ProcError::Unsupported("thread count"))
}

#[cfg(target_os = "linux")]
pub fn memory() -> Result<MemoryStats> {
    parse_meminfo(&fs::read_to_string("/proc/meminfo")?)
}

#[cfg(not(target_os = "linux"))]
pub fn memory() -> Result<MemoryStats> {
    Err(ProcError::Unsupported("memory usage"))
}

#[cfg(target_os = "linux")]
pub fn cpu_times() -> Result<CpuTimes> {
    parse_proc_stat(&fs::read_to_string("/proc/stat")?)
}

#[cfg(not(target_os = "linux"))]
pub fn cpu_times() -> Result<CpuTimes> {
    Err(ProcError::Unsupported("cpu usage"))
}

/// Raw `/proc/self/status`, served by the debug endpoints.
#[cfg(target_os = "linux")]
pub fn status_text() -> Result<String> {
    Ok(fs::read_to_string("/proc/self/status")?)
}

#[cfg(not(target_os = "linux"))]
pub fn status_text() -> Result<String> {
    Err(ProcError::Unsupported("process status"))
}

/// `Threads:` line of `/proc/<pid>/status`.
pub fn parse_status_threads(status: &str) -> Result<u64> {
    status
        .lines()
        .find_map(|l| l.strip_prefix("Threads:"))
        .and_then(|v| v.trim().parse().ok())
        .ok_or(ProcError::Malformed("/proc/self/status Threads"))
}

/// `/proc/meminfo`; values are reported in kB.
pub fn parse_meminfo(meminfo: &str) -> Result<MemoryStats> {
    let field = |key: &'static str| -> Result<u64> {
        meminfo
            .lines()
            .find_map(|l| l.strip_prefix(key)?.strip_prefix(':'))
            .and_then(|v| v.split_whitespace().next())
            .and_then(|v| v.parse::<u64>().ok())
            .map(|kb| kb * 1024)
            .ok_or(ProcError::Malformed(key))
    };

    let total = field("MemTotal")?;
    let free = field("MemFree")?;
    let available = field("MemAvailable")?;
    let used = total.saturating_sub(available);
    let used_percent = if total == 0 {
        0.0
    } else {
        used as f64 / total as f64 * 100.0
    };

    Ok(MemoryStats {
        total,
        available,
        used,
        free,
        used_percent,
    })
}

/// First `cpu ` line of `/proc/stat`: user nice system idle iowait irq softirq steal ...
/// Guest time is already included in user/nice and is not added again.
pub fn parse_proc_stat(stat: &str) -> Result<CpuTimes> {
    let line = stat
        .lines()
        .find(|l| l.starts_with("cpu "))
        .ok_or(ProcError::Malformed("/proc/stat cpu line"))?;

    let fields: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .take(8)
        .map(|v| v.parse::<u64>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| ProcError::Malformed("/proc/stat cpu fields"))?;
    if fields.len() < 4 {
        return Err(ProcError::Malformed("/proc/stat cpu fields"));
    }

    let total: u64 = fields.iter().sum();
    let idle = fields.iter().skip(3).take(2).sum::<u64>();
    Ok(CpuTimes {
        busy: total.saturating_sub(idle),
        total,
    })
}
