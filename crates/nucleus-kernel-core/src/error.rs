//! Kernel error type

use core::fmt;
use serde::{Deserialize, Serialize};

use nucleus_ipc::result::{EAGAIN, EINVAL};

/// Kernel errors
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum KernelError {
    /// Endpoint does not resolve to a live process (stale, magic or out of range)
    InvalidEndpoint,
    /// Slot index is out of range or the slot is free
    SlotNotInUse,
    /// Process table is full
    NoFreeSlot,
    /// Interrupt hook table is full
    NoFreeHook,
    /// Process is already blocked for the requested reason
    Busy,
    /// Block reason is owned by slot retirement or the IPC paths
    InvalidBlockReason,
}

impl KernelError {
    /// ABI result code reported to the caller.
    pub fn code(self) -> i32 {
        match self {
            KernelError::InvalidEndpoint
            | KernelError::SlotNotInUse
            | KernelError::Busy
            | KernelError::InvalidBlockReason => EINVAL,
            KernelError::NoFreeSlot | KernelError::NoFreeHook => EAGAIN,
        }
    }
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelError::InvalidEndpoint => f.write_str("invalid endpoint"),
            KernelError::SlotNotInUse => f.write_str("slot not in use"),
            KernelError::NoFreeSlot => f.write_str("process table full"),
            KernelError::NoFreeHook => f.write_str("interrupt hook table full"),
            KernelError::Busy => f.write_str("process already blocked"),
            KernelError::InvalidBlockReason => f.write_str("invalid block reason"),
        }
    }
}
