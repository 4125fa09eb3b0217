//! Process lifecycle kernel-call handlers
//!
//! - `execute_exit()` - retire the caller or, for the supervisor, a named process

use alloc::vec::Vec;

use crate::axiom::CommitType;
use crate::kernel::{ExitReply, KernelCore};
use nucleus_hal::HAL;
use nucleus_kernel_core::{Endpoint, SlotIndex};

/// Execute the exit kernel call.
///
/// arg0 is the endpoint to retire (`SELF` for the caller). Returns the
/// reply code, `None` when the caller must not be answered.
pub(in crate::system) fn execute_exit<H: HAL>(
    core: &mut KernelCore<H>,
    caller: SlotIndex,
    args: [u32; 4],
) -> (Option<i64>, Vec<CommitType>) {
    let (reply, commits) = core.request_exit(caller, Endpoint(args[0]));
    let commit_types = commits.into_iter().map(|c| c.commit_type).collect();

    match reply {
        ExitReply::NoReply => (None, commit_types),
        reply => (Some(reply.code()), commit_types),
    }
}
