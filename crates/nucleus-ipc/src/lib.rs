//! Kernel ABI constants for Nucleus
//!
//! This crate is the **single source of truth** for every number that crosses
//! the kernel-call boundary:
//!
//! - **Kernel-call numbers** (process → kernel)
//! - **Result codes** deposited in the caller's reply or wake register
//! - **Endpoint encoding** (slot + generation) and the magic endpoints
//! - **Table capacities** shared by the kernel core and its tests
//!
//! # Endpoint Encoding
//!
//! An endpoint packs a process-table slot with the generation of the process
//! that occupies it:
//!
//! ```text
//! raw = generation * ENDPOINT_GENERATION_SIZE + slot
//! ```
//!
//! The magic endpoints (`ANY`, `NONE`, `SELF`) live in generation 0 above
//! every valid slot number, so they never collide with a real process.

#![no_std]

// =============================================================================
// Table Capacities
// =============================================================================

/// Capacities of the fixed-size kernel tables.
pub mod limits {
    /// Number of process-table slots.
    pub const NR_PROCS: usize = 64;
    /// Number of interrupt hook entries.
    pub const NR_IRQ_HOOKS: usize = 16;
    /// Number of distinct privilege identities a notification set can name.
    pub const NR_PRIV_IDS: usize = 64;
}

// =============================================================================
// Well-known Slots
// =============================================================================

/// Slots with a fixed role.
pub mod slot {
    /// The process manager: the only process allowed to terminate others.
    pub const SUPERVISOR: usize = 0;
}

// =============================================================================
// Endpoints
// =============================================================================

/// Endpoint encoding constants.
pub mod endpoint {
    /// Wildcard source for receives ("from anyone").
    pub const ANY: u32 = 0x7ace;
    /// No process at all.
    pub const NONE: u32 = 0x6ace;
    /// The calling process itself.
    pub const SELF: u32 = 0x8ace;

    /// Largest magic endpoint value.
    pub const MAX_MAGIC: u32 = SELF;

    /// Distance between two generations of the same slot.
    pub const ENDPOINT_GENERATION_SIZE: u32 = MAX_MAGIC + 1;

    /// Highest generation that still fits in a `u32` endpoint.
    pub const ENDPOINT_MAX_GENERATION: u32 = u32::MAX / ENDPOINT_GENERATION_SIZE - 1;
}

// =============================================================================
// Kernel Calls
// =============================================================================

/// Kernel-call numbers.
pub mod call {
    /// Base of the kernel-call range.
    pub const KERNEL_CALL: u32 = 0x600;
    /// Exit a process.
    ///
    /// arg0 = endpoint of the process to retire, or `endpoint::SELF`.
    /// Only the supervisor may name another process.
    pub const SYS_EXIT: u32 = KERNEL_CALL + 2;
}

// =============================================================================
// Result Codes
// =============================================================================

/// Result codes returned to callers or deposited in a woken process's
/// result register.
pub mod result {
    /// Success.
    pub const OK: i32 = 0;
    /// Invalid argument (e.g. an endpoint that does not resolve).
    pub const EINVAL: i32 = -22;
    /// Source of a pending receive died.
    pub const ESRCDIED: i32 = -105;
    /// Destination of a pending send died.
    pub const EDSTDIED: i32 = -106;
    /// Unknown kernel-call number.
    pub const EBADREQUEST: i32 = -107;
    /// No free slot in a kernel table.
    pub const EAGAIN: i32 = -11;
    /// Dispatch marker: the caller must not receive a reply.
    pub const EDONTREPLY: i32 = -201;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magic_endpoints_are_distinct() {
        assert_ne!(endpoint::ANY, endpoint::NONE);
        assert_ne!(endpoint::ANY, endpoint::SELF);
        assert_ne!(endpoint::NONE, endpoint::SELF);
    }

    #[test]
    fn test_magic_endpoints_never_name_a_slot() {
        const { assert!(endpoint::NONE as usize >= limits::NR_PROCS) };
        const { assert!(endpoint::ANY as usize >= limits::NR_PROCS) };
        const { assert!(endpoint::SELF < endpoint::ENDPOINT_GENERATION_SIZE) };
    }

    #[test]
    fn test_generation_range_fits_u32() {
        let top = (endpoint::ENDPOINT_MAX_GENERATION as u64)
            * (endpoint::ENDPOINT_GENERATION_SIZE as u64)
            + (limits::NR_PROCS as u64 - 1);
        assert!(top <= u32::MAX as u64);
    }

    #[test]
    fn test_result_codes_are_unique() {
        let codes = [
            result::EINVAL,
            result::ESRCDIED,
            result::EDSTDIED,
            result::EBADREQUEST,
            result::EAGAIN,
            result::EDONTREPLY,
        ];
        for (i, a) in codes.iter().enumerate() {
            assert!(*a < result::OK);
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_supervisor_slot_in_range() {
        const { assert!(slot::SUPERVISOR < limits::NR_PROCS) };
    }
}
