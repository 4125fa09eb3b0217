//! Kernel state - pure data structure holding the process-related tables
//!
//! This module contains the KernelState struct which holds the process
//! table, the privilege registry and the interrupt hook table. It has NO HAL
//! dependency - the ready queue, timers, interrupt controller and VM live
//! behind the HAL in the runtime wrapper (`nucleus-kernel`).

use alloc::string::ToString;
use alloc::vec::Vec;

use nucleus_ipc::limits::{NR_IRQ_HOOKS, NR_PROCS};

use crate::error::KernelError;
use crate::types::{
    BlockFlags, Endpoint, IrqHook, MiscFlags, PrivFlags, PrivId, Privilege, Process, SlotIndex,
};

/// Options for a newly assigned slot
#[derive(Clone, Copy, Debug, Default)]
pub struct SpawnOptions {
    /// Initial misc flags (e.g. `VM_MANAGED`)
    pub misc_flags: MiscFlags,
    /// Privilege flags (e.g. `SYS_PROC`)
    pub priv_flags: PrivFlags,
}

/// The pure kernel state - no HAL, no I/O.
///
/// Tables are fixed-capacity and indexed by slot. The privilege registry is
/// keyed 1:1 with the process table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KernelState {
    /// Process table
    pub procs: Vec<Process>,
    /// Privilege registry (same index as `procs`)
    pub privileges: Vec<Privilege>,
    /// Interrupt hook table
    pub irq_hooks: Vec<IrqHook>,
}

impl KernelState {
    /// Create a kernel state with every slot and hook free.
    pub fn new() -> Self {
        Self {
            procs: (0..NR_PROCS).map(|i| Process::empty(SlotIndex(i))).collect(),
            privileges: (0..NR_PROCS)
                .map(|i| Privilege::new(PrivId(i as u16)))
                .collect(),
            irq_hooks: alloc::vec![IrqHook::default(); NR_IRQ_HOOKS],
        }
    }

    /// Number of process-table slots.
    pub fn capacity(&self) -> usize {
        self.procs.len()
    }

    // ========================================================================
    // Read-only accessors
    // ========================================================================

    /// Get a process by slot (free slots included)
    pub fn process(&self, slot: SlotIndex) -> Option<&Process> {
        self.procs.get(slot.0)
    }

    /// Get a mutable process by slot (free slots included)
    pub fn process_mut(&mut self, slot: SlotIndex) -> Option<&mut Process> {
        self.procs.get_mut(slot.0)
    }

    /// Get the privilege record of a slot
    pub fn privilege(&self, slot: SlotIndex) -> Option<&Privilege> {
        self.privileges.get(slot.0)
    }

    /// Get the mutable privilege record of a slot
    pub fn privilege_mut(&mut self, slot: SlotIndex) -> Option<&mut Privilege> {
        self.privileges.get_mut(slot.0)
    }

    /// Check if a slot is in range and occupied
    pub fn is_occupied(&self, slot: SlotIndex) -> bool {
        self.process(slot).map(|p| !p.is_free()).unwrap_or(false)
    }

    /// Occupied slots in table order
    pub fn occupied_slots(&self) -> impl Iterator<Item = SlotIndex> + '_ {
        self.procs
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.is_free())
            .map(|(i, _)| SlotIndex(i))
    }

    /// Resolve an endpoint to the slot of its live occupant.
    ///
    /// Fails for magic endpoints, out-of-range slots, free slots, and
    /// endpoints whose generation does not match the current occupant.
    pub fn resolve_endpoint(&self, endpoint: Endpoint) -> Option<SlotIndex> {
        if endpoint.is_magic() {
            return None;
        }
        let slot = endpoint.slot();
        match self.process(slot) {
            Some(proc) if !proc.is_free() && proc.endpoint == endpoint => Some(slot),
            _ => {
                log::trace!("endpoint {} does not resolve", endpoint);
                None
            }
        }
    }

    /// Interrupt hooks owned by `endpoint`
    pub fn hooks_owned_by(&self, endpoint: Endpoint) -> impl Iterator<Item = usize> + '_ {
        self.irq_hooks
            .iter()
            .enumerate()
            .filter(move |(_, hook)| hook.owner == Some(endpoint))
            .map(|(i, _)| i)
    }

    // ========================================================================
    // State mutation helpers (pure - no side effects)
    // ========================================================================

    /// Assign the first free slot to a new process.
    ///
    /// The slot's endpoint moves to the next generation and every field is
    /// reinitialised. The new process is runnable; putting it on the ready
    /// queue is the caller's job.
    pub fn assign_slot(&mut self, name: &str, options: SpawnOptions) -> Result<Endpoint, KernelError> {
        let slot = self
            .procs
            .iter()
            .position(|p| p.is_free())
            .map(SlotIndex)
            .ok_or(KernelError::NoFreeSlot)?;

        let endpoint = self.procs[slot.0].endpoint.next_generation();
        self.procs[slot.0] = Process {
            endpoint,
            name: name.to_string(),
            block_flags: BlockFlags::empty(),
            misc_flags: options.misc_flags,
            ..Process::empty(slot)
        };

        let privilege = &mut self.privileges[slot.0];
        *privilege = Privilege::new(privilege.id);
        privilege.flags = options.priv_flags;
        if privilege.is_system_process() {
            privilege.proc_slot = Some(slot);
        }

        Ok(endpoint)
    }

    /// Mark a slot free and return the block flags it had.
    ///
    /// Capturing and clearing happen in one step so the prior flags can
    /// never be read after the slot is already free. Also clears the system
    /// identity reverse map. Returns `None` for out-of-range slots.
    pub fn retire_slot(&mut self, slot: SlotIndex) -> Option<BlockFlags> {
        let proc = self.procs.get_mut(slot.0)?;
        let prior = core::mem::replace(&mut proc.block_flags, BlockFlags::FREE);

        if let Some(privilege) = self.privileges.get_mut(slot.0) {
            if privilege.is_system_process() {
                privilege.proc_slot = None;
            }
        }
        Some(prior)
    }

    /// Attach a free interrupt hook to `owner`.
    pub fn attach_hook(&mut self, owner: Endpoint, irq: u32) -> Result<usize, KernelError> {
        let hook = self
            .irq_hooks
            .iter()
            .position(IrqHook::is_free)
            .ok_or(KernelError::NoFreeHook)?;
        self.irq_hooks[hook] = IrqHook {
            irq,
            owner: Some(owner),
        };
        Ok(hook)
    }

    /// Mark an interrupt hook free. Returns the IRQ line it was attached to.
    pub fn release_hook(&mut self, hook: usize) -> Option<u32> {
        let entry = self.irq_hooks.get_mut(hook)?;
        entry.owner.take().map(|_| entry.irq)
    }

    /// Remove `id` from every occupied slot's pending notifications.
    pub fn clear_notifications_from(&mut self, id: PrivId) {
        for (proc, privilege) in self.procs.iter().zip(self.privileges.iter_mut()) {
            if !proc.is_free() {
                privilege.pending_notifications.remove(id);
            }
        }
    }
}

impl Default for KernelState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_creation() {
        let state = KernelState::new();
        assert_eq!(state.capacity(), NR_PROCS);
        assert_eq!(state.privileges.len(), NR_PROCS);
        assert_eq!(state.irq_hooks.len(), NR_IRQ_HOOKS);
        assert_eq!(state.occupied_slots().count(), 0);
    }

    #[test]
    fn test_assign_slot_uses_first_free_slot() {
        let mut state = KernelState::new();
        let a = state.assign_slot("a", SpawnOptions::default()).unwrap();
        let b = state.assign_slot("b", SpawnOptions::default()).unwrap();

        assert_eq!(a.slot(), SlotIndex(0));
        assert_eq!(b.slot(), SlotIndex(1));
        assert_eq!(a.generation(), 1);
        assert!(state.process(a.slot()).unwrap().is_runnable());
        assert_eq!(state.process(b.slot()).unwrap().name, "b");
    }

    #[test]
    fn test_assign_slot_table_full() {
        let mut state = KernelState::new();
        for _ in 0..NR_PROCS {
            state.assign_slot("p", SpawnOptions::default()).unwrap();
        }
        assert_eq!(
            state.assign_slot("overflow", SpawnOptions::default()),
            Err(KernelError::NoFreeSlot)
        );
    }

    #[test]
    fn test_assign_slot_records_system_identity() {
        let mut state = KernelState::new();
        let options = SpawnOptions {
            priv_flags: PrivFlags::SYS_PROC,
            ..Default::default()
        };
        let ep = state.assign_slot("driver", options).unwrap();
        let privilege = state.privilege(ep.slot()).unwrap();
        assert!(privilege.is_system_process());
        assert_eq!(privilege.proc_slot, Some(ep.slot()));
    }

    #[test]
    fn test_resolve_endpoint() {
        let mut state = KernelState::new();
        let ep = state.assign_slot("p", SpawnOptions::default()).unwrap();

        assert_eq!(state.resolve_endpoint(ep), Some(ep.slot()));
        assert_eq!(state.resolve_endpoint(Endpoint::SELF), None);
        assert_eq!(state.resolve_endpoint(Endpoint::ANY), None);
        assert_eq!(state.resolve_endpoint(Endpoint::NONE), None);
        // Free slot
        assert_eq!(state.resolve_endpoint(Endpoint::new(SlotIndex(7), 1)), None);
        // Wrong generation
        assert_eq!(state.resolve_endpoint(ep.next_generation()), None);
    }

    #[test]
    fn test_stale_endpoint_after_reuse() {
        let mut state = KernelState::new();
        let old = state.assign_slot("old", SpawnOptions::default()).unwrap();
        state.retire_slot(old.slot());

        let new = state.assign_slot("new", SpawnOptions::default()).unwrap();
        assert_eq!(new.slot(), old.slot());
        assert_ne!(new, old);
        assert_eq!(state.resolve_endpoint(old), None);
        assert_eq!(state.resolve_endpoint(new), Some(new.slot()));
    }

    #[test]
    fn test_retire_slot_returns_prior_flags() {
        let mut state = KernelState::new();
        let ep = state.assign_slot("p", SpawnOptions::default()).unwrap();
        state.procs[ep.slot().0].block_flags = BlockFlags::SENDING | BlockFlags::STOPPED;

        let prior = state.retire_slot(ep.slot()).unwrap();
        assert_eq!(prior, BlockFlags::SENDING | BlockFlags::STOPPED);
        assert_eq!(state.procs[ep.slot().0].block_flags, BlockFlags::FREE);
        assert!(!state.is_occupied(ep.slot()));
    }

    #[test]
    fn test_retire_slot_clears_system_identity() {
        let mut state = KernelState::new();
        let options = SpawnOptions {
            priv_flags: PrivFlags::SYS_PROC,
            ..Default::default()
        };
        let ep = state.assign_slot("driver", options).unwrap();
        state.retire_slot(ep.slot());
        assert_eq!(state.privilege(ep.slot()).unwrap().proc_slot, None);
    }

    #[test]
    fn test_retire_slot_out_of_range() {
        let mut state = KernelState::new();
        assert_eq!(state.retire_slot(SlotIndex(NR_PROCS)), None);
    }

    #[test]
    fn test_attach_and_release_hooks() {
        let mut state = KernelState::new();
        let ep = state.assign_slot("driver", SpawnOptions::default()).unwrap();

        let h1 = state.attach_hook(ep, 4).unwrap();
        let h2 = state.attach_hook(ep, 9).unwrap();
        assert_ne!(h1, h2);
        assert_eq!(state.hooks_owned_by(ep).collect::<Vec<_>>(), [h1, h2]);

        assert_eq!(state.release_hook(h1), Some(4));
        assert_eq!(state.release_hook(h1), None);
        assert_eq!(state.hooks_owned_by(ep).collect::<Vec<_>>(), [h2]);
    }

    #[test]
    fn test_hook_table_full() {
        let mut state = KernelState::new();
        let ep = state.assign_slot("driver", SpawnOptions::default()).unwrap();
        for irq in 0..NR_IRQ_HOOKS as u32 {
            state.attach_hook(ep, irq).unwrap();
        }
        assert_eq!(state.attach_hook(ep, 99), Err(KernelError::NoFreeHook));
    }

    #[test]
    fn test_clear_notifications_from() {
        let mut state = KernelState::new();
        let a = state.assign_slot("a", SpawnOptions::default()).unwrap();
        let b = state.assign_slot("b", SpawnOptions::default()).unwrap();
        let a_id = state.privilege(a.slot()).unwrap().id;
        let b_id = state.privilege(b.slot()).unwrap().id;

        let pending = &mut state.privilege_mut(b.slot()).unwrap().pending_notifications;
        pending.insert(a_id);
        pending.insert(b_id);

        state.clear_notifications_from(a_id);
        let pending = state.privilege(b.slot()).unwrap().pending_notifications;
        assert!(!pending.contains(a_id));
        assert!(pending.contains(b_id));
    }

    #[test]
    fn test_assign_slot_resets_previous_occupant() {
        let mut state = KernelState::new();
        let old = state.assign_slot("old", SpawnOptions::default()).unwrap();
        state.privilege_mut(old.slot()).unwrap().alarm_timer = Some(crate::types::TimerHandle(3));
        state.procs[old.slot().0].misc_flags = MiscFlags::VM_MANAGED;
        state.retire_slot(old.slot());

        let new = state.assign_slot("new", SpawnOptions::default()).unwrap();
        let proc = state.process(new.slot()).unwrap();
        assert_eq!(proc.misc_flags, MiscFlags::empty());
        assert_eq!(proc.caller_queue_head, None);
        assert_eq!(state.privilege(new.slot()).unwrap().alarm_timer, None);
    }
}
