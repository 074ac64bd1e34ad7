//! @ai:module:intent Process memory sampling after each inference call
//! @ai:module:layer infrastructure
//! @ai:module:public_api MemorySampler, SysinfoMemorySampler, NullMemorySampler
//! @ai:module:stateless false

use crate::store::MemorySnapshot;
use std::sync::Mutex;
use sysinfo::{Pid, ProcessesToUpdate, System};

/// @ai:intent Source of memory snapshots for benchmark records
pub trait MemorySampler: Send + Sync {
    /// @ai:intent Take a snapshot; unmeasurable fields are -1
    fn snapshot(&self) -> MemorySnapshot;
}

/// @ai:intent Samples the current process through sysinfo
///
/// Resident set size is reported as PSS and virtual size as native heap.
/// There is no managed heap, so the java heap field stays unavailable.
pub struct SysinfoMemorySampler {
    system: Mutex<System>,
    pid: Pid,
}

impl SysinfoMemorySampler {
    /// @ai:intent Create a sampler bound to this process
    /// @ai:effects sys:read
    pub fn new() -> Self {
        let mut system = System::new();
        let pid = Pid::from_u32(std::process::id());
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);

        Self {
            system: Mutex::new(system),
            pid,
        }
    }
}

impl Default for SysinfoMemorySampler {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySampler for SysinfoMemorySampler {
    /// @ai:effects sys:read
    fn snapshot(&self) -> MemorySnapshot {
        let Ok(mut system) = self.system.lock() else {
            return MemorySnapshot::unavailable();
        };

        system.refresh_processes(ProcessesToUpdate::Some(&[self.pid]), true);

        match system.process(self.pid) {
            Some(process) => MemorySnapshot {
                java_heap_kb: crate::codec::UNAVAILABLE,
                native_heap_kb: (process.virtual_memory() / 1024) as i64,
                pss_kb: (process.memory() / 1024) as i64,
            },
            None => {
                tracing::debug!("Process {} not visible to sysinfo", self.pid);
                MemorySnapshot::unavailable()
            }
        }
    }
}

/// @ai:intent Sampler that never measures anything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullMemorySampler;

impl MemorySampler for NullMemorySampler {
    fn snapshot(&self) -> MemorySnapshot {
        MemorySnapshot::unavailable()
    }
}
