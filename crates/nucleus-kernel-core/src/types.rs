//! Core kernel types
//!
//! This module contains the fundamental types used throughout the kernel core.
//! All types here are pure data - no behavior that depends on HAL.

use alloc::string::String;
use bitflags::bitflags;
use core::fmt;
use serde::{Deserialize, Serialize};

use nucleus_ipc::endpoint::{ANY, ENDPOINT_GENERATION_SIZE, ENDPOINT_MAX_GENERATION, NONE, SELF};
use nucleus_ipc::limits::NR_PRIV_IDS;
use nucleus_ipc::result::{EDSTDIED, ESRCDIED};

/// Process-table slot index
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotIndex(pub usize);

/// Privilege identity (names a process in notification sets)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PrivId(pub u16);

/// Alarm timer handle owned by a privilege record
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerHandle(pub u32);

// ============================================================================
// Endpoints
// ============================================================================

/// External process identity: a slot index combined with a generation.
///
/// The generation changes every time a slot is reassigned, so an endpoint
/// captured before the slot was recycled no longer matches the occupant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Endpoint(pub u32);

impl Endpoint {
    /// Receive from anyone
    pub const ANY: Endpoint = Endpoint(ANY);
    /// No process
    pub const NONE: Endpoint = Endpoint(NONE);
    /// The caller itself
    pub const SELF: Endpoint = Endpoint(SELF);

    /// Build the endpoint of `slot` in `generation`.
    pub const fn new(slot: SlotIndex, generation: u32) -> Self {
        Endpoint(generation * ENDPOINT_GENERATION_SIZE + slot.0 as u32)
    }

    /// Slot part of the endpoint.
    pub const fn slot(self) -> SlotIndex {
        SlotIndex((self.0 % ENDPOINT_GENERATION_SIZE) as usize)
    }

    /// Generation part of the endpoint.
    pub const fn generation(self) -> u32 {
        self.0 / ENDPOINT_GENERATION_SIZE
    }

    /// Whether this is one of `ANY`, `NONE` or `SELF`.
    pub const fn is_magic(self) -> bool {
        matches!(self.0, ANY | NONE | SELF)
    }

    /// Endpoint for the next occupant of the same slot.
    ///
    /// Wraps to generation 0 after `ENDPOINT_MAX_GENERATION`.
    pub const fn next_generation(self) -> Self {
        let generation = if self.generation() >= ENDPOINT_MAX_GENERATION {
            0
        } else {
            self.generation() + 1
        };
        Endpoint::new(self.slot(), generation)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Endpoint::ANY => f.write_str("ANY"),
            Endpoint::NONE => f.write_str("NONE"),
            Endpoint::SELF => f.write_str("SELF"),
            ep => write!(f, "{}/{}", ep.slot().0, ep.generation()),
        }
    }
}

// ============================================================================
// Flags
// ============================================================================

bitflags! {
    /// Reasons a process cannot run. A process is runnable iff none is set.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct BlockFlags: u16 {
        /// Slot is not in use
        const FREE = 0x0001;
        /// Process has no scheduling priority yet
        const NO_PRIORITY = 0x0002;
        /// Blocked sending a message
        const SENDING = 0x0004;
        /// Blocked receiving a message
        const RECEIVING = 0x0008;
        /// Signal delivery in progress
        const SIGNALED = 0x0010;
        /// Unprocessed signals pending
        const SIG_PENDING = 0x0020;
        /// Stopped by a tracer
        const STOPPED = 0x0040;
        /// Privilege record not yet attached
        const NO_PRIV = 0x0080;
        /// Endpoint not yet published
        const NO_ENDPOINT = 0x0100;
    }
}

impl BlockFlags {
    /// No block reason left.
    pub fn is_runnable(self) -> bool {
        self.is_empty()
    }
}

bitflags! {
    /// Auxiliary per-process flags.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct MiscFlags: u16 {
        /// A reply to this process is outstanding
        const REPLY_PENDING = 0x0001;
        /// Asynchronous messages are queued for this process
        const ASYNC_MSG = 0x0004;
        /// Process manages its own virtual memory
        const VM_MANAGED = 0x0008;
    }
}

bitflags! {
    /// Privilege record flags.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct PrivFlags: u8 {
        /// May be preempted
        const PREEMPTIBLE = 0x02;
        /// Billed for its own CPU time
        const BILLABLE = 0x04;
        /// Belongs to the system class tracked by identity
        const SYS_PROC = 0x10;
    }
}

// ============================================================================
// Wake results
// ============================================================================

/// Status deposited for a process that was unblocked because its peer died.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WakeResult {
    /// The process it was receiving from is gone
    SourceDied,
    /// The process it was sending to is gone
    DestinationDied,
}

impl WakeResult {
    /// Numeric code placed in the result register.
    pub fn code(self) -> i32 {
        match self {
            WakeResult::SourceDied => ESRCDIED,
            WakeResult::DestinationDied => EDSTDIED,
        }
    }
}

// ============================================================================
// Notification sets
// ============================================================================

/// Bitmap of privilege identities with an outstanding notification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct NotifySet(u64);

const _: () = assert!(NR_PRIV_IDS <= u64::BITS as usize);

impl NotifySet {
    pub const fn new() -> Self {
        NotifySet(0)
    }

    /// Mark `id` as pending. Ids beyond `NR_PRIV_IDS` are ignored.
    pub fn insert(&mut self, id: PrivId) {
        if (id.0 as usize) < NR_PRIV_IDS {
            self.0 |= 1 << id.0;
        }
    }

    pub fn remove(&mut self, id: PrivId) {
        if (id.0 as usize) < NR_PRIV_IDS {
            self.0 &= !(1 << id.0);
        }
    }

    pub fn contains(&self, id: PrivId) -> bool {
        (id.0 as usize) < NR_PRIV_IDS && self.0 & (1 << id.0) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Pending identities in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = PrivId> + '_ {
        (0..NR_PRIV_IDS as u16)
            .map(PrivId)
            .filter(move |id| self.contains(*id))
    }
}

// ============================================================================
// Process control block
// ============================================================================

/// Process control block
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Process {
    /// Current (or last) endpoint of this slot
    pub endpoint: Endpoint,
    /// Process name, for diagnostics
    pub name: String,
    /// Why the process cannot run
    pub block_flags: BlockFlags,
    /// Auxiliary flags
    pub misc_flags: MiscFlags,
    /// Destination of a pending send (valid while `SENDING`)
    pub send_target: Endpoint,
    /// Source of a pending receive (valid while `RECEIVING`)
    pub recv_source: Endpoint,
    /// First process blocked sending to this one
    pub caller_queue_head: Option<SlotIndex>,
    /// Next process in the caller queue this one is linked into
    pub queue_link: Option<SlotIndex>,
    /// Status deposited when an IPC peer died
    pub wake_result: Option<WakeResult>,
}

impl Process {
    /// A free slot whose next occupant will be generation 1.
    pub fn empty(slot: SlotIndex) -> Self {
        Self {
            endpoint: Endpoint::new(slot, 0),
            name: String::new(),
            block_flags: BlockFlags::FREE,
            misc_flags: MiscFlags::empty(),
            send_target: Endpoint::NONE,
            recv_source: Endpoint::NONE,
            caller_queue_head: None,
            queue_link: None,
            wake_result: None,
        }
    }

    pub fn is_free(&self) -> bool {
        self.block_flags.contains(BlockFlags::FREE)
    }

    pub fn is_runnable(&self) -> bool {
        self.block_flags.is_runnable()
    }

    /// Abort a receive pending on `source`.
    ///
    /// Deposits `SourceDied` and drops `RECEIVING`. Returns whether the
    /// process was receiving from `source`.
    pub fn abort_receive_from(&mut self, source: Endpoint) -> bool {
        if self.block_flags.contains(BlockFlags::RECEIVING) && self.recv_source == source {
            self.wake_result = Some(WakeResult::SourceDied);
            self.block_flags.remove(BlockFlags::RECEIVING);
            true
        } else {
            false
        }
    }

    /// Abort a send pending on `target`.
    ///
    /// Deposits `DestinationDied` and drops `SENDING`. Returns whether the
    /// process was sending to `target`.
    pub fn abort_send_to(&mut self, target: Endpoint) -> bool {
        if self.block_flags.contains(BlockFlags::SENDING) && self.send_target == target {
            self.wake_result = Some(WakeResult::DestinationDied);
            self.block_flags.remove(BlockFlags::SENDING);
            true
        } else {
            false
        }
    }
}

// ============================================================================
// Privilege record
// ============================================================================

/// Per-process privilege metadata
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Privilege {
    /// Identity used in notification sets
    pub id: PrivId,
    /// Privilege flags
    pub flags: PrivFlags,
    /// Alarm timer, `Some` while armed
    pub alarm_timer: Option<TimerHandle>,
    /// Identities with an outstanding notification for this process
    pub pending_notifications: NotifySet,
    /// Reverse map to the owning slot (system processes only)
    pub proc_slot: Option<SlotIndex>,
}

impl Privilege {
    pub fn new(id: PrivId) -> Self {
        Self {
            id,
            flags: PrivFlags::empty(),
            alarm_timer: None,
            pending_notifications: NotifySet::new(),
            proc_slot: None,
        }
    }

    pub fn is_system_process(&self) -> bool {
        self.flags.contains(PrivFlags::SYS_PROC)
    }
}

// ============================================================================
// Interrupt hooks
// ============================================================================

/// Interrupt hook table entry
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IrqHook {
    /// IRQ line
    pub irq: u32,
    /// Owning process, `None` while free
    pub owner: Option<Endpoint>,
}

impl IrqHook {
    pub fn is_free(&self) -> bool {
        self.owner.is_none()
    }
}
