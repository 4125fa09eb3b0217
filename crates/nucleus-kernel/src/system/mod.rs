//! System struct - combines the Axiom audit layer and the KernelCore
//! execution layer.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          SYSTEM                             │
//! │                                                             │
//! │   ┌───────────────────────────────────────────────────┐     │
//! │   │                      AXIOM                        │     │
//! │   │   - SysLog (kernel call requests / replies)       │     │
//! │   │   - CommitLog (table mutations)                   │     │
//! │   └───────────────────────────────────────────────────┘     │
//! │                              │                              │
//! │                              ▼                              │
//! │   ┌───────────────────────────────────────────────────┐     │
//! │   │                     KERNEL                        │     │
//! │   │   - Process table, privileges, interrupt hooks    │     │
//! │   │   - Teardown                                      │     │
//! │   │   - Emits Commits for state changes               │     │
//! │   └───────────────────────────────────────────────────┘     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Kernel calls flow: `Process → System.process_kernel_call() → Axiom (log)
//! → KernelCore (execute) → Axiom (record) → Process`

mod lifecycle;

use alloc::vec::Vec;

use crate::axiom::{AxiomGateway, Commit, CommitLog, SysLog};
use crate::kernel::KernelCore;
use nucleus_hal::HAL;
use nucleus_ipc::call::SYS_EXIT;
use nucleus_ipc::result::EBADREQUEST;
use nucleus_kernel_core::{Endpoint, KernelError, SlotIndex, SpawnOptions};

/// System combines the Axiom audit layer with the KernelCore execution layer.
pub struct System<H: HAL> {
    /// Axiom audit layer (SysLog + CommitLog)
    pub axiom: AxiomGateway,
    /// Kernel execution layer
    pub kernel: KernelCore<H>,
    /// Boot time (for uptime calculation)
    boot_time: u64,
}

impl<H: HAL> System<H> {
    /// Create a new System with the given HAL.
    pub fn new(hal: H) -> Self {
        let boot_time = hal.now_nanos();
        Self {
            axiom: AxiomGateway::new(boot_time),
            kernel: KernelCore::new(hal),
            boot_time,
        }
    }

    /// Get reference to HAL.
    pub fn hal(&self) -> &H {
        self.kernel.hal()
    }

    /// Get uptime in nanoseconds.
    pub fn uptime_nanos(&self) -> u64 {
        self.kernel.hal().now_nanos().saturating_sub(self.boot_time)
    }

    /// Get boot time.
    pub fn boot_time(&self) -> u64 {
        self.boot_time
    }

    /// Get the SysLog.
    pub fn syslog(&self) -> &SysLog {
        self.axiom.syslog()
    }

    /// Get the CommitLog.
    pub fn commitlog(&self) -> &CommitLog {
        self.axiom.commitlog()
    }

    // ========================================================================
    // Kernel call entry point
    // ========================================================================

    /// Process a kernel call made by the process in `caller`.
    ///
    /// 1. Logs the request to SysLog
    /// 2. Executes via KernelCore
    /// 3. Records commits to CommitLog
    /// 4. Logs the response to SysLog when there is one
    ///
    /// Returns the reply code, or `None` when the caller must not be
    /// answered (it no longer exists).
    pub fn process_kernel_call(&mut self, caller: SlotIndex, call_nr: u32, args: [u32; 4]) -> Option<i64> {
        let timestamp = self.uptime_nanos();
        let kernel = &mut self.kernel;

        let (reply, _, _) = self
            .axiom
            .kernel_call(caller.0, call_nr, args, timestamp, |call_nr, args| match call_nr {
                SYS_EXIT => lifecycle::execute_exit(kernel, caller, args),
                _ => {
                    log::debug!("unknown kernel call {:#x} from slot {}", call_nr, caller.0);
                    (Some(EBADREQUEST as i64), Vec::new())
                }
            });
        reply
    }

    // ========================================================================
    // Kernel-initiated operations (no SysLog entry)
    // ========================================================================

    /// Spawn a process and log the mutation.
    pub fn spawn(&mut self, name: &str, options: SpawnOptions) -> Result<Endpoint, KernelError> {
        let (result, commits) = self.kernel.spawn(name, options);
        self.record(commits);
        result
    }

    /// Retire a process on the kernel's own initiative (fault or signal).
    pub fn exit_process(&mut self, slot: SlotIndex) {
        let commits = self.kernel.teardown(slot);
        self.record(commits);
    }

    fn record(&mut self, commits: Vec<Commit>) {
        let timestamp = self.uptime_nanos();
        for commit in commits {
            self.axiom.append_internal_commit(commit.commit_type, timestamp);
        }
    }
}
