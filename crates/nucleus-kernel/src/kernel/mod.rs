//! KernelCore - the execution layer.
//!
//! Holds the HAL and the pure [`KernelState`] tables and performs every
//! table mutation. Operations that mutate return the [`Commit`]s describing
//! what they did; [`crate::System`] appends those to the CommitLog.
//!
//! - `exit` - process teardown and the exit request
//! - `ipc` - blocking touchpoints that drive processes into the states
//!   teardown has to unwind

mod exit;
mod ipc;

pub use exit::ExitReply;

use alloc::format;
use alloc::vec;
use alloc::vec::Vec;

use nucleus_hal::HAL;
use nucleus_kernel_core::{Endpoint, KernelError, KernelState, SpawnOptions};

use crate::axiom::{Commit, CommitType};

/// Kernel execution layer, generic over the platform HAL.
pub struct KernelCore<H: HAL> {
    hal: H,
    state: KernelState,
}

impl<H: HAL> KernelCore<H> {
    /// Create a kernel with an empty process table.
    pub fn new(hal: H) -> Self {
        Self {
            hal,
            state: KernelState::new(),
        }
    }

    /// Get reference to HAL.
    pub fn hal(&self) -> &H {
        &self.hal
    }

    /// Read-only view of the kernel tables.
    pub fn state(&self) -> &KernelState {
        &self.state
    }

    /// Direct table access.
    ///
    /// Bypasses the HAL: the ready queue is not updated. Meant for fault
    /// injection in tests.
    pub fn state_mut(&mut self) -> &mut KernelState {
        &mut self.state
    }

    /// Assign a slot to a new process and make it runnable.
    pub fn spawn(&mut self, name: &str, options: SpawnOptions) -> (Result<Endpoint, KernelError>, Vec<Commit>) {
        let endpoint = match self.state.assign_slot(name, options) {
            Ok(endpoint) => endpoint,
            Err(e) => {
                log::warn!("cannot spawn {}: {}", name, e);
                return (Err(e), Vec::new());
            }
        };
        self.hal.enqueue_ready(endpoint.slot().0);
        self.hal.debug_write(&format!(
            "[kernel] Spawned process: {} (endpoint {})",
            name, endpoint
        ));

        let commit = Commit::unsealed(CommitType::ProcessCreated {
            endpoint: endpoint.0,
            name: name.into(),
        });
        (Ok(endpoint), vec![commit])
    }
}
