//! Process termination for KernelCore.
//!
//! An exiting process may still be referenced from the ready queue, the
//! interrupt hook table, another process's caller queue, the blocking state
//! of its IPC peers, notification bitmaps and the VM. `teardown` removes
//! every one of those references before the slot can be reassigned.

use alloc::format;
use alloc::vec::Vec;

use nucleus_hal::HAL;
use nucleus_ipc::result::{EDONTREPLY, OK};
use nucleus_ipc::slot::SUPERVISOR;
use nucleus_kernel_core::{BlockFlags, Endpoint, KernelError, MiscFlags, SlotIndex, WakeResult};

use super::KernelCore;
use crate::axiom::{Commit, CommitType};

/// Outcome of an exit request as seen by the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitReply {
    /// The caller survives and is answered.
    Reply(Result<(), KernelError>),
    /// The caller is gone; nobody may be answered.
    NoReply,
}

impl ExitReply {
    /// Numeric reply code; `EDONTREPLY` for `NoReply`.
    pub fn code(self) -> i64 {
        match self {
            ExitReply::Reply(Ok(())) => OK as i64,
            ExitReply::Reply(Err(e)) => e.code() as i64,
            ExitReply::NoReply => EDONTREPLY as i64,
        }
    }
}

impl<H: HAL> KernelCore<H> {
    /// Handle an exit request made by the process in `caller`.
    ///
    /// The supervisor may name another process by endpoint and is answered.
    /// Any other caller, or the supervisor naming `SELF`, retires itself and
    /// gets no reply.
    pub fn request_exit(&mut self, caller: SlotIndex, target: Endpoint) -> (ExitReply, Vec<Commit>) {
        if caller.0 == SUPERVISOR && target != Endpoint::SELF {
            return match self.state.resolve_endpoint(target) {
                Some(slot) => (ExitReply::Reply(Ok(())), self.teardown(slot)),
                None => {
                    log::debug!("exit request for stale endpoint {}", target);
                    (ExitReply::Reply(Err(KernelError::InvalidEndpoint)), Vec::new())
                }
            };
        }

        (ExitReply::NoReply, self.teardown(caller))
    }

    /// Retire the process in `slot` from every kernel structure.
    ///
    /// Idempotent: a free slot is left untouched and yields no commits, and
    /// the HAL is not called. Out-of-range slots are ignored the same way.
    pub fn teardown(&mut self, slot: SlotIndex) -> Vec<Commit> {
        let mut commits = Vec::new();

        let Some(proc) = self.state.process(slot) else {
            log::warn!("teardown of out-of-range slot {}", slot.0);
            return commits;
        };
        if proc.is_free() {
            return commits;
        }

        let endpoint = proc.endpoint;
        let name = proc.name.clone();
        let was_runnable = proc.is_runnable();
        let send_target = proc.send_target;
        let vm_managed = proc.misc_flags.contains(MiscFlags::VM_MANAGED);

        // Alarm timer
        if let Some(privilege) = self.state.privilege_mut(slot) {
            if let Some(timer) = privilege.alarm_timer.take() {
                self.hal.cancel_timer(timer.0);
                commits.push(Commit::unsealed(CommitType::AlarmCancelled {
                    endpoint: endpoint.0,
                    timer: timer.0,
                }));
            }
        }

        // Ready queue
        if was_runnable {
            self.hal.dequeue_ready(slot.0);
        }

        // Interrupt hooks: detach at the controller, then free the entry
        let hooks: Vec<usize> = self.state.hooks_owned_by(endpoint).collect();
        for hook in hooks {
            let irq = self.state.irq_hooks[hook].irq;
            if let Err(e) = self.hal.detach_hook(hook, irq) {
                log::warn!("detaching hook {} (irq {}) of {} failed: {}", hook, irq, endpoint, e);
            }
            self.state.release_hook(hook);
            commits.push(Commit::unsealed(CommitType::IrqHookReleased {
                endpoint: endpoint.0,
                hook: hook as u32,
                irq,
            }));
        }

        // Retire the slot. From here on the captured flags are authoritative.
        let prior = self.state.retire_slot(slot).unwrap_or_default();
        self.hal.debug_write(&format!(
            "[kernel] Process exited: {} (endpoint {})",
            name, endpoint
        ));
        commits.push(Commit::unsealed(CommitType::ProcessExited {
            endpoint: endpoint.0,
            slot: slot.0 as u32,
        }));

        // Leave the caller queue of the process we were sending to
        if prior.contains(BlockFlags::SENDING) {
            match self.state.resolve_endpoint(send_target) {
                Some(target) => {
                    if self.state.unlink_caller(target, slot) {
                        log::debug!("unlinked {} from caller queue of {}", endpoint, send_target);
                        commits.push(Commit::unsealed(CommitType::SenderUnlinked {
                            sender: endpoint.0,
                            target: send_target.0,
                        }));
                    } else {
                        log::warn!(
                            "{} was sending to {} but is not in its caller queue",
                            endpoint,
                            send_target
                        );
                    }
                }
                None => log::warn!("{} was sending to unresolvable {}", endpoint, send_target),
            }
        }

        // Peers: drop our notifications, wake anyone blocked on us
        if let Some(id) = self.state.privilege(slot).map(|p| p.id) {
            self.state.clear_notifications_from(id);
        }
        let peers: Vec<SlotIndex> = self.state.occupied_slots().collect();
        for peer in peers {
            let proc = &mut self.state.procs[peer.0];
            let receiving = proc.abort_receive_from(endpoint);
            let sending = proc.abort_send_to(endpoint);

            let wakes = [(receiving, WakeResult::SourceDied), (sending, WakeResult::DestinationDied)];
            for (_, wake) in wakes.iter().filter(|(hit, _)| *hit) {
                log::debug!("woke {} ({:?}) after death of {}", proc.endpoint, wake, endpoint);
                commits.push(Commit::unsealed(CommitType::PeerWoken {
                    peer: proc.endpoint.0,
                    result: wake.code(),
                }));
            }

            if (receiving || sending) && proc.is_runnable() {
                self.hal.enqueue_ready(peer.0);
            }
        }

        // Our own caller queue only held senders that were just woken
        let orphans = self.state.dissolve_caller_queue(slot);
        if !orphans.is_empty() {
            log::debug!("dissolved caller queue of {} ({} senders)", endpoint, orphans.len());
        }

        // Address space
        if vm_managed {
            match self.hal.reset_mappings_to_default(slot.0) {
                Ok(()) => commits.push(Commit::unsealed(CommitType::MappingsReset { slot: slot.0 as u32 })),
                Err(e) => log::warn!("resetting mappings of {} failed: {}", endpoint, e),
            }
        }

        commits
    }
}
