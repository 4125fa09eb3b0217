//! Nucleus Kernel
//!
//! The runtime wrapper around `nucleus-kernel-core`:
//! - `KernelCore<H>`: process teardown, the exit request, IPC touchpoints
//! - `System<H>`: kernel-call gateway with the Axiom audit logs
//!
//! The process tables stay pure data in `nucleus-kernel-core`; every side
//! effect outside them (ready queue, timers, interrupt controller, VM,
//! console) goes through the `HAL`.

#![no_std]
extern crate alloc;

pub mod axiom;
mod kernel;
mod system;

pub use kernel::{ExitReply, KernelCore};
pub use system::System;

// Re-export HAL types
pub use nucleus_hal::{HalError, HAL as HalTrait};

// Re-export Axiom types
pub use axiom::{AxiomGateway, Commit, CommitLog, CommitType, SysEvent, SysEventType, SysLog};

// Re-export core types
pub use nucleus_kernel_core::{
    assert_invariants, check_all_invariants, check_ready_queue, BlockFlags, Endpoint,
    InvariantViolation, KernelError, KernelState, MiscFlags, PrivFlags, PrivId, SlotIndex,
    SpawnOptions, TimerHandle, WakeResult,
};
