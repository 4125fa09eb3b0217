//! Hardware Abstraction Layer trait for Nucleus
//!
//! The kernel core owns the process table, the privilege registry and the
//! interrupt hook table. Everything else it needs during process teardown is
//! owned by a collaborator that sits behind this trait:
//!
//! - **Scheduler**: the ready queue
//! - **Timers**: the alarm timer pool
//! - **Interrupts**: the interrupt controller's handler chains
//! - **VM**: per-process address-space mappings
//!
//! All methods take `&self`. Kernel calls run to completion on a single
//! execution context, so implementations are free to use interior
//! mutability for their own bookkeeping.

#![no_std]

use core::fmt;

/// Hardware Abstraction Layer trait
///
/// Slots, timers and hooks are passed as plain numbers so this crate stays
/// independent of the kernel core's types.
pub trait HAL: Send + Sync + 'static {
    // === Scheduler ===

    /// Append a runnable process to the ready queue.
    fn enqueue_ready(&self, slot: usize);

    /// Remove a process from the ready queue.
    ///
    /// Must be a no-op when the slot is not queued.
    fn dequeue_ready(&self, slot: usize);

    // === Timers ===

    /// Disarm an alarm timer and return it to the timer pool.
    ///
    /// Must be a no-op when the timer is not armed.
    fn cancel_timer(&self, timer: u32);

    // === Interrupts ===

    /// Detach an interrupt hook from its IRQ line.
    ///
    /// # Arguments
    /// * `hook` - Index of the hook in the kernel's hook table
    /// * `irq` - IRQ line the hook is attached to
    ///
    /// # Returns
    /// * `Ok(())` - Hook detached
    /// * `Err(HalError::HookNotAttached)` - The controller had no such hook
    fn detach_hook(&self, hook: usize, irq: u32) -> Result<(), HalError>;

    // === VM ===

    /// Reset a process's address space to the default kernel mappings.
    fn reset_mappings_to_default(&self, slot: usize) -> Result<(), HalError>;

    // === Time & Debug ===

    /// Get current time in nanoseconds (monotonic)
    fn now_nanos(&self) -> u64;

    /// Write a debug message to the platform's console
    fn debug_write(&self, msg: &str);
}

/// HAL errors
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HalError {
    /// The interrupt controller has no such hook attached
    HookNotAttached,
    /// The VM subsystem rejected the request
    VmFailure,
    /// Operation not supported on this platform
    NotSupported,
}

impl fmt::Display for HalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HalError::HookNotAttached => f.write_str("interrupt hook not attached"),
            HalError::VmFailure => f.write_str("vm request failed"),
            HalError::NotSupported => f.write_str("operation not supported"),
        }
    }
}

/// A minimal test HAL for unit testing
///
/// Every collaborator operation succeeds and does nothing. Use
/// `nucleus-hal-mock` when a test needs to observe the calls.
#[derive(Default)]
pub struct TestHal {
    time: core::sync::atomic::AtomicU64,
}

impl TestHal {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HAL for TestHal {
    fn enqueue_ready(&self, _slot: usize) {}

    fn dequeue_ready(&self, _slot: usize) {}

    fn cancel_timer(&self, _timer: u32) {}

    fn detach_hook(&self, _hook: usize, _irq: u32) -> Result<(), HalError> {
        Ok(())
    }

    fn reset_mappings_to_default(&self, _slot: usize) -> Result<(), HalError> {
        Ok(())
    }

    fn now_nanos(&self) -> u64 {
        self.time
            .fetch_add(1000, core::sync::atomic::Ordering::SeqCst)
    }

    fn debug_write(&self, _msg: &str) {}
}
