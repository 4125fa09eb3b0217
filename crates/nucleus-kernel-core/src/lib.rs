//! Nucleus Kernel Core - Pure Process-Table State
//!
//! This crate contains the **pure, HAL-free** data that process teardown
//! operates on, and serves as the primary verification target.
//!
//! # Design Principles
//!
//! 1. **No HAL dependency**: ready queue, timers, interrupt controller and VM
//!    live behind the HAL in `nucleus-kernel`
//! 2. **No I/O or side effects**: pure state transformations only
//! 3. **Index-linked structures**: caller queues are `Option<SlotIndex>`
//!    links into the process table, never pointers
//! 4. **Verifiable**: every mutation can be followed by
//!    [`check_all_invariants`]
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  nucleus-kernel-core                        │
//! │                                                             │
//! │   ┌───────────────┐    ┌───────────────┐                    │
//! │   │  KernelState  │    │ Caller queues │                    │
//! │   │  - procs      │───▶│ enqueue       │                    │
//! │   │  - privileges │    │ unlink        │                    │
//! │   │  - irq_hooks  │    └───────────────┘                    │
//! │   └───────────────┘                                         │
//! │          │             ┌───────────────┐                    │
//! │          └────────────▶│  Invariants   │                    │
//! │                        └───────────────┘                    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              │ used by
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    nucleus-kernel                           │
//! │   - KernelCore<H: HAL>: teardown, request_exit              │
//! │   - System<H>: kernel-call gateway                          │
//! │   - CommitLog / SysLog audit trail                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Module Organization
//!
//! - `types` - PCB, privilege record, interrupt hook, endpoints, flags
//! - `state` - KernelState tables, endpoint resolver, slot assignment
//! - `queue` - per-process caller queues
//! - `invariants` - Formal invariant assertions for verification
//! - `error` - KernelError

#![no_std]
extern crate alloc;

pub mod error;
pub mod invariants;
pub mod queue;
pub mod state;
pub mod types;

// Re-export all public types for convenient access
pub use error::KernelError;
pub use invariants::{assert_invariants, check_all_invariants, check_ready_queue, InvariantViolation};
pub use queue::CallerQueue;
pub use state::{KernelState, SpawnOptions};
pub use types::{
    BlockFlags, Endpoint, IrqHook, MiscFlags, NotifySet, PrivFlags, PrivId, Privilege, Process,
    SlotIndex, TimerHandle, WakeResult,
};
