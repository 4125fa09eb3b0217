//! IPC touchpoints for KernelCore.
//!
//! The minimal blocking operations that put processes into the states
//! teardown has to unwind:
//! - Blocking on a send or a receive
//! - Other block reasons (stop, signal delivery)
//! - Alarm timers, interrupt hooks and notifications

use nucleus_hal::HAL;
use nucleus_kernel_core::{BlockFlags, Endpoint, KernelError, Process, SlotIndex, TimerHandle};

use super::KernelCore;

/// Block reasons owned by slot retirement and the send/receive paths.
const RESERVED_REASONS: BlockFlags = BlockFlags::FREE
    .union(BlockFlags::SENDING)
    .union(BlockFlags::RECEIVING);

impl<H: HAL> KernelCore<H> {
    /// Block `slot` sending to `target`.
    ///
    /// The sender is appended to the target's caller queue and leaves the
    /// ready queue if it was runnable.
    pub fn block_send(&mut self, slot: SlotIndex, target: Endpoint) -> Result<(), KernelError> {
        let sender = self.occupied(slot)?;
        let target_slot = self
            .state
            .resolve_endpoint(target)
            .filter(|t| *t != slot)
            .ok_or(KernelError::InvalidEndpoint)?;
        if sender.block_flags.contains(BlockFlags::SENDING) {
            return Err(KernelError::Busy);
        }
        let was_runnable = sender.is_runnable();

        self.state.enqueue_caller(target_slot, slot)?;
        let sender = &mut self.state.procs[slot.0];
        sender.block_flags.insert(BlockFlags::SENDING);
        sender.send_target = target;

        if was_runnable {
            self.hal.dequeue_ready(slot.0);
        }
        Ok(())
    }

    /// Block `slot` receiving from `source` (`ANY` allowed).
    pub fn block_receive(&mut self, slot: SlotIndex, source: Endpoint) -> Result<(), KernelError> {
        let receiver = self.occupied(slot)?;
        if source != Endpoint::ANY && self.state.resolve_endpoint(source).is_none() {
            return Err(KernelError::InvalidEndpoint);
        }
        if receiver.block_flags.contains(BlockFlags::RECEIVING) {
            return Err(KernelError::Busy);
        }
        let was_runnable = receiver.is_runnable();

        let receiver = &mut self.state.procs[slot.0];
        receiver.block_flags.insert(BlockFlags::RECEIVING);
        receiver.recv_source = source;

        if was_runnable {
            self.hal.dequeue_ready(slot.0);
        }
        Ok(())
    }

    /// Add a block reason other than send/receive (e.g. `STOPPED`).
    pub fn block(&mut self, slot: SlotIndex, reason: BlockFlags) -> Result<(), KernelError> {
        if reason.is_empty() || reason.intersects(RESERVED_REASONS) {
            return Err(KernelError::InvalidBlockReason);
        }
        let was_runnable = self.occupied(slot)?.is_runnable();

        self.state.procs[slot.0].block_flags.insert(reason);
        if was_runnable {
            self.hal.dequeue_ready(slot.0);
        }
        Ok(())
    }

    /// Clear a block reason set by [`block`](Self::block).
    ///
    /// The process rejoins the ready queue once nothing blocks it.
    pub fn unblock(&mut self, slot: SlotIndex, reason: BlockFlags) -> Result<(), KernelError> {
        if reason.is_empty() || reason.intersects(RESERVED_REASONS) {
            return Err(KernelError::InvalidBlockReason);
        }
        let was_runnable = self.occupied(slot)?.is_runnable();

        let proc = &mut self.state.procs[slot.0];
        proc.block_flags.remove(reason);
        if !was_runnable && proc.is_runnable() {
            self.hal.enqueue_ready(slot.0);
        }
        Ok(())
    }

    /// Arm the alarm timer of `slot`, replacing any armed one.
    pub fn arm_alarm(&mut self, slot: SlotIndex, timer: TimerHandle) -> Result<(), KernelError> {
        self.occupied(slot)?;
        let privilege = self
            .state
            .privilege_mut(slot)
            .ok_or(KernelError::SlotNotInUse)?;
        if let Some(previous) = privilege.alarm_timer.replace(timer) {
            self.hal.cancel_timer(previous.0);
        }
        Ok(())
    }

    /// Attach an interrupt hook for `irq` owned by `slot`.
    ///
    /// Returns the hook index.
    pub fn attach_irq_hook(&mut self, slot: SlotIndex, irq: u32) -> Result<usize, KernelError> {
        let owner = self.occupied(slot)?.endpoint;
        self.state.attach_hook(owner, irq)
    }

    /// Mark a notification from `from` as pending at `to`.
    pub fn post_notification(&mut self, from: SlotIndex, to: Endpoint) -> Result<(), KernelError> {
        self.occupied(from)?;
        let target = self
            .state
            .resolve_endpoint(to)
            .ok_or(KernelError::InvalidEndpoint)?;
        let id = self.state.privileges[from.0].id;
        self.state.privileges[target.0].pending_notifications.insert(id);
        Ok(())
    }

    fn occupied(&self, slot: SlotIndex) -> Result<&Process, KernelError> {
        self.state
            .process(slot)
            .filter(|p| !p.is_free())
            .ok_or(KernelError::SlotNotInUse)
    }
}
