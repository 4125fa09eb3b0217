//! Caller queues
//!
//! Every process owns a singly-linked list of the processes blocked sending
//! to it. The process table is the arena: `caller_queue_head` points at the
//! first sender and each sender's `queue_link` at the next one. A process is
//! linked into at most one caller queue at a time.

use alloc::vec::Vec;

use crate::error::KernelError;
use crate::state::KernelState;
use crate::types::SlotIndex;

/// Iterator over the members of a caller queue, head first.
///
/// Stops after `capacity` steps so a corrupted (cyclic) list cannot hang the
/// caller; the invariant checker reports such lists separately.
pub struct CallerQueue<'a> {
    state: &'a KernelState,
    next: Option<SlotIndex>,
    remaining: usize,
}

impl Iterator for CallerQueue<'_> {
    type Item = SlotIndex;

    fn next(&mut self) -> Option<SlotIndex> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.next?;
        self.remaining -= 1;
        self.next = self.state.process(current).and_then(|p| p.queue_link);
        Some(current)
    }
}

impl KernelState {
    /// Walk the caller queue owned by `owner`.
    pub fn caller_queue(&self, owner: SlotIndex) -> CallerQueue<'_> {
        CallerQueue {
            state: self,
            next: self.process(owner).and_then(|p| p.caller_queue_head),
            remaining: self.capacity(),
        }
    }

    /// Append `sender` to the tail of `owner`'s caller queue.
    pub fn enqueue_caller(&mut self, owner: SlotIndex, sender: SlotIndex) -> Result<(), KernelError> {
        if owner.0 >= self.capacity() || sender.0 >= self.capacity() {
            return Err(KernelError::SlotNotInUse);
        }
        if self.caller_queue(owner).any(|s| s == sender) {
            return Err(KernelError::Busy);
        }

        let tail = self.caller_queue(owner).last();
        self.procs[sender.0].queue_link = None;
        match tail {
            None => self.procs[owner.0].caller_queue_head = Some(sender),
            Some(tail) => self.procs[tail.0].queue_link = Some(sender),
        }
        Ok(())
    }

    /// Splice `sender` out of `owner`'s caller queue.
    ///
    /// Walks from the head and stops at the first match; a process is queued
    /// at most once. The relative order of the remaining senders is kept.
    /// Returns whether `sender` was found.
    pub fn unlink_caller(&mut self, owner: SlotIndex, sender: SlotIndex) -> bool {
        let Some(head) = self.process(owner).map(|p| p.caller_queue_head) else {
            return false;
        };

        let mut prev: Option<SlotIndex> = None;
        let mut cursor = head;
        let mut remaining = self.capacity();
        while let Some(current) = cursor {
            if remaining == 0 {
                break;
            }
            remaining -= 1;

            let Some(next) = self.process(current).map(|p| p.queue_link) else {
                break;
            };
            if current == sender {
                match prev {
                    None => self.procs[owner.0].caller_queue_head = next,
                    Some(p) => self.procs[p.0].queue_link = next,
                }
                self.procs[current.0].queue_link = None;
                return true;
            }
            prev = Some(current);
            cursor = next;
        }
        false
    }

    /// Empty `owner`'s caller queue, clearing every member's link.
    ///
    /// Returns the former members in queue order.
    pub fn dissolve_caller_queue(&mut self, owner: SlotIndex) -> Vec<SlotIndex> {
        let members: Vec<SlotIndex> = self.caller_queue(owner).collect();
        for member in &members {
            self.procs[member.0].queue_link = None;
        }
        if let Some(proc) = self.process_mut(owner) {
            proc.caller_queue_head = None;
        }
        members
    }
}
