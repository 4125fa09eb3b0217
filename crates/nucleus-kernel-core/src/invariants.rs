//! Formal invariants for kernel verification
//!
//! Runtime-checkable properties of the process-related tables. Used for
//! assertion checking in tests after every teardown and as the target of the
//! Kani proof harnesses below.
//!
//! # Invariants
//!
//! 1. **Caller queue shape**: queues are acyclic and only hold occupied
//!    `SENDING` slots whose target resolves to the queue owner
//! 2. **Sender membership**: every occupied `SENDING` slot is queued exactly
//!    once, on its target's queue
//! 3. **No free links**: no queue link refers to a free slot and free slots
//!    hold no links
//! 4. **Hook ownership**: every owned interrupt hook's endpoint resolves
//! 5. **System identity**: the reverse map is set for exactly the occupied
//!    system processes
//! 6. **Notification liveness**: pending notification bits only name live
//!    identities
//!
//! The ready queue lives behind the HAL, so its invariant is checked
//! separately by [`check_ready_queue`] against a snapshot of it.

use alloc::format;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use crate::state::KernelState;
use crate::types::{BlockFlags, SlotIndex};

/// An invariant violation with details
#[derive(Clone, Debug)]
pub struct InvariantViolation {
    /// Name of the violated invariant
    pub invariant: &'static str,
    /// Description of what went wrong
    pub description: String,
}

/// Check all kernel invariants.
///
/// Returns a list of violations (empty if all invariants hold).
pub fn check_all_invariants(state: &KernelState) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    violations.extend(check_caller_queue_shape(state));
    violations.extend(check_sender_membership(state));
    violations.extend(check_no_free_links(state));
    violations.extend(check_hook_ownership(state));
    violations.extend(check_system_identity(state));
    violations.extend(check_notification_liveness(state));

    violations
}

/// Invariant 1: caller queues are acyclic and hold only valid senders
fn check_caller_queue_shape(state: &KernelState) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let capacity = state.capacity();

    for owner in state.occupied_slots() {
        let owner_ep = state.procs[owner.0].endpoint;
        let mut seen = vec![false; capacity];
        let mut cursor = state.procs[owner.0].caller_queue_head;

        while let Some(member) = cursor {
            let Some(proc) = state.process(member) else {
                violations.push(InvariantViolation {
                    invariant: "caller_queue_shape",
                    description: format!(
                        "Caller queue of slot {} links out-of-range slot {}",
                        owner.0, member.0
                    ),
                });
                break;
            };
            if seen[member.0] {
                violations.push(InvariantViolation {
                    invariant: "caller_queue_shape",
                    description: format!(
                        "Caller queue of slot {} is cyclic at slot {}",
                        owner.0, member.0
                    ),
                });
                break;
            }
            seen[member.0] = true;

            if proc.is_free() || !proc.block_flags.contains(BlockFlags::SENDING) {
                violations.push(InvariantViolation {
                    invariant: "caller_queue_shape",
                    description: format!(
                        "Caller queue of slot {} holds slot {} which is not sending",
                        owner.0, member.0
                    ),
                });
            } else if state.resolve_endpoint(proc.send_target) != Some(owner) {
                violations.push(InvariantViolation {
                    invariant: "caller_queue_shape",
                    description: format!(
                        "Slot {} is queued on slot {} but sends to {}",
                        member.0, owner_ep, proc.send_target
                    ),
                });
            }
            cursor = proc.queue_link;
        }
    }

    violations
}

/// Invariant 2: every sender is queued exactly once on its target
fn check_sender_membership(state: &KernelState) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    for slot in state.occupied_slots() {
        let proc = &state.procs[slot.0];
        if !proc.block_flags.contains(BlockFlags::SENDING) {
            continue;
        }

        let Some(target) = state.resolve_endpoint(proc.send_target) else {
            violations.push(InvariantViolation {
                invariant: "sender_membership",
                description: format!(
                    "Slot {} is sending to unresolvable endpoint {}",
                    slot.0, proc.send_target
                ),
            });
            continue;
        };

        let occurrences = state.caller_queue(target).filter(|s| *s == slot).count();
        if occurrences != 1 {
            violations.push(InvariantViolation {
                invariant: "sender_membership",
                description: format!(
                    "Slot {} appears {} times in the caller queue of slot {}",
                    slot.0, occurrences, target.0
                ),
            });
        }
    }

    violations
}

/// Invariant 3: no link refers to a free slot, free slots hold no links
fn check_no_free_links(state: &KernelState) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    for (i, proc) in state.procs.iter().enumerate() {
        if proc.is_free() {
            if proc.caller_queue_head.is_some() || proc.queue_link.is_some() {
                violations.push(InvariantViolation {
                    invariant: "no_free_links",
                    description: format!("Free slot {} still holds queue links", i),
                });
            }
            continue;
        }

        for link in [proc.caller_queue_head, proc.queue_link].into_iter().flatten() {
            if !state.is_occupied(link) {
                violations.push(InvariantViolation {
                    invariant: "no_free_links",
                    description: format!("Slot {} links to free slot {}", i, link.0),
                });
            }
        }
    }

    violations
}

/// Invariant 4: owned interrupt hooks belong to live processes
fn check_hook_ownership(state: &KernelState) -> Vec<InvariantViolation> {
    state
        .irq_hooks
        .iter()
        .enumerate()
        .filter_map(|(i, hook)| {
            let owner = hook.owner?;
            state.resolve_endpoint(owner).is_none().then(|| InvariantViolation {
                invariant: "hook_ownership",
                description: format!("Hook {} (irq {}) owned by dead endpoint {}", i, hook.irq, owner),
            })
        })
        .collect()
}

/// Invariant 5: system identity reverse map matches occupied system slots
fn check_system_identity(state: &KernelState) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    for (i, privilege) in state.privileges.iter().enumerate() {
        let slot = SlotIndex(i);
        let expected = (state.is_occupied(slot) && privilege.is_system_process()).then_some(slot);
        if privilege.proc_slot != expected {
            violations.push(InvariantViolation {
                invariant: "system_identity",
                description: format!(
                    "Privilege {} maps to {:?}, expected {:?}",
                    i, privilege.proc_slot, expected
                ),
            });
        }
    }

    violations
}

/// Invariant 6: pending notifications only name live identities
fn check_notification_liveness(state: &KernelState) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    for slot in state.occupied_slots() {
        for id in state.privileges[slot.0].pending_notifications.iter() {
            let live = state
                .occupied_slots()
                .any(|other| state.privileges[other.0].id == id);
            if !live {
                violations.push(InvariantViolation {
                    invariant: "notification_liveness",
                    description: format!(
                        "Slot {} has a pending notification from dead identity {}",
                        slot.0, id.0
                    ),
                });
            }
        }
    }

    violations
}

/// Check a ready-queue snapshot against the process table.
///
/// A slot is queued iff it is occupied and runnable, and at most once.
pub fn check_ready_queue(state: &KernelState, ready: &[SlotIndex]) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let mut counts = vec![0usize; state.capacity()];

    for slot in ready {
        match counts.get_mut(slot.0) {
            Some(count) => *count += 1,
            None => violations.push(InvariantViolation {
                invariant: "ready_queue",
                description: format!("Ready queue holds out-of-range slot {}", slot.0),
            }),
        }
    }

    for (i, count) in counts.into_iter().enumerate() {
        let proc = &state.procs[i];
        let should_be_queued = !proc.is_free() && proc.is_runnable();
        let description = match (count, should_be_queued) {
            (0, true) => format!("Runnable slot {} is not on the ready queue", i),
            (1, true) | (0, false) => continue,
            (_, true) => format!("Slot {} is on the ready queue {} times", i, count),
            (_, false) if proc.is_free() => format!("Free slot {} is on the ready queue", i),
            (_, false) => format!(
                "Blocked slot {} ({:?}) is on the ready queue",
                i, proc.block_flags
            ),
        };
        violations.push(InvariantViolation {
            invariant: "ready_queue",
            description,
        });
    }

    violations
}

/// Assert all invariants hold (panic if not)
pub fn assert_invariants(state: &KernelState) {
    if let Some(v) = check_all_invariants(state).first() {
        panic!("Invariant violated: {}: {}", v.invariant, v.description);
    }
}

// ============================================================================
// Kani proofs for invariants
// ============================================================================

#[cfg(kani)]
mod proofs {
    use super::*;
    use crate::state::SpawnOptions;

    /// Proof: assigning slots maintains invariants
    #[kani::proof]
    #[kani::unwind(5)]
    fn assign_slot_maintains_invariants() {
        let mut state = KernelState::new();
        let _ = state.assign_slot("a", SpawnOptions::default());
        let _ = state.assign_slot("b", SpawnOptions::default());

        kani::assert(
            check_all_invariants(&state).is_empty(),
            "Assigning slots should maintain invariants",
        );
    }

    /// Proof: unlinking any queued sender keeps the queue well formed
    #[kani::proof]
    #[kani::unwind(6)]
    fn unlink_caller_maintains_queue_shape() {
        let mut state = KernelState::new();
        let owner = state.assign_slot("owner", SpawnOptions::default()).unwrap();
        let mut senders = [SlotIndex(0); 3];
        for sender in senders.iter_mut() {
            let ep = state.assign_slot("sender", SpawnOptions::default()).unwrap();
            let proc = &mut state.procs[ep.slot().0];
            proc.block_flags = BlockFlags::SENDING;
            proc.send_target = owner;
            state.enqueue_caller(owner.slot(), ep.slot()).unwrap();
            *sender = ep.slot();
        }

        let pick: usize = kani::any();
        kani::assume(pick < senders.len());
        let victim = senders[pick];

        kani::assert(
            state.unlink_caller(owner.slot(), victim),
            "Queued sender should be found",
        );
        kani::assert(
            state.caller_queue(owner.slot()).count() == senders.len() - 1,
            "Exactly one sender should be removed",
        );
        kani::assert(
            !state.caller_queue(owner.slot()).any(|s| s == victim),
            "Unlinked sender should not remain queued",
        );
    }
}
