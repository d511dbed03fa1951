//! Periodic RSS/heap probing used to enforce the worker pool's memory guard.

use sysinfo::{Pid, System};

/// A memory usage sample in megabytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemorySample {
    /// Resident set size, in megabytes.
    pub rss_mb: u64,
    /// Allocator heap usage, in megabytes. `sysinfo` cannot distinguish
    /// heap from RSS on most platforms, so this mirrors `rss_mb` unless a
    /// custom sampler overrides it.
    pub heap_mb: u64,
}

/// Samples this process's memory usage. Swappable in tests for determinism.
pub trait MemorySampler: Send + Sync {
    /// Take one sample of current usage.
    fn sample(&self) -> MemorySample;
}

/// Samples the current process's RSS via `sysinfo`.
pub struct ProcessMemorySampler {
    pid: Pid,
}

impl ProcessMemorySampler {
    /// Build a sampler bound to the current process.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pid: sysinfo::get_current_pid().unwrap_or(Pid::from(0)),
        }
    }
}

impl Default for ProcessMemorySampler {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySampler for ProcessMemorySampler {
    fn sample(&self) -> MemorySample {
        let mut system = System::new();
        system.refresh_processes(sysinfo::ProcessesToUpdate::Some(&[self.pid]), true);
        let rss_mb = system
            .process(self.pid)
            .map(|process| process.memory() / (1024 * 1024))
            .unwrap_or(0);
        MemorySample {
            rss_mb,
            heap_mb: rss_mb,
        }
    }
}

#[cfg(test)]
pub(crate) struct FixedMemorySampler(pub MemorySample);

#[cfg(test)]
impl MemorySampler for FixedMemorySampler {
    fn sample(&self) -> MemorySample {
        self.0
    }
}
