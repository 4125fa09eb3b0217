//! Axiom Gateway
//!
//! Entry point for kernel calls. The gateway:
//! 1. Logs the request to SysLog
//! 2. Executes the kernel operation
//! 3. Appends any resulting commits to CommitLog
//! 4. Logs the response to SysLog, if the caller gets one

use alloc::vec::Vec;

use super::commitlog::{CommitLog, CommitType};
use super::syslog::SysLog;
use super::{CommitId, EventId};

/// Axiom gateway: owns the audit and mutation logs.
pub struct AxiomGateway {
    /// Kernel call audit log
    syslog: SysLog,
    /// State mutation log
    commitlog: CommitLog,
}

impl AxiomGateway {
    /// Create a new Axiom gateway.
    ///
    /// # Arguments
    /// - `timestamp`: Boot timestamp (nanos)
    pub fn new(timestamp: u64) -> Self {
        Self {
            syslog: SysLog::new(),
            commitlog: CommitLog::new(timestamp),
        }
    }

    /// Run a kernel call through Axiom.
    ///
    /// `kernel_fn` receives `(call_nr, args)` and returns the reply code
    /// (`None` when the caller must not be answered) plus the mutations it
    /// performed.
    ///
    /// # Returns
    /// Tuple of (reply, request_id, commit_ids)
    pub fn kernel_call<F>(
        &mut self,
        caller: usize,
        call_nr: u32,
        args: [u32; 4],
        timestamp: u64,
        kernel_fn: F,
    ) -> (Option<i64>, EventId, Vec<CommitId>)
    where
        F: FnOnce(u32, [u32; 4]) -> (Option<i64>, Vec<CommitType>),
    {
        // 1. Log request
        let request_id = self.syslog.log_request(caller, call_nr, args, timestamp);

        // 2. Execute kernel operation
        let (reply, commit_types) = kernel_fn(call_nr, args);

        // 3. Append commits to CommitLog
        let commit_ids = commit_types
            .into_iter()
            .map(|ct| self.commitlog.append(ct, Some(request_id), timestamp))
            .collect();

        // 4. Log response
        if let Some(result) = reply {
            self.syslog.log_response(caller, request_id, result, timestamp);
        }

        (reply, request_id, commit_ids)
    }

    /// Get the SysLog (for inspection/auditing).
    pub fn syslog(&self) -> &SysLog {
        &self.syslog
    }

    /// Get the CommitLog (for inspection).
    pub fn commitlog(&self) -> &CommitLog {
        &self.commitlog
    }

    /// Append a commit directly (bypassing SysLog).
    ///
    /// Use for kernel-initiated operations that don't originate from a
    /// kernel call (fault or signal driven exits, process creation).
    pub fn append_internal_commit(&mut self, commit_type: CommitType, timestamp: u64) -> CommitId {
        self.commitlog.append(commit_type, None, timestamp)
    }

    /// Verify integrity of the commit chain.
    pub fn verify_integrity(&self) -> bool {
        self.commitlog.verify_integrity()
    }

    /// Get current state for serialization.
    pub fn state_summary(&self) -> GatewayState {
        GatewayState {
            syslog_len: self.syslog.len(),
            syslog_next_id: self.syslog.next_id(),
            commitlog_len: self.commitlog.len(),
            commitlog_seq: self.commitlog.current_seq(),
            commitlog_head: self.commitlog.head(),
        }
    }
}

/// Summary of gateway state (for debugging/monitoring).
#[derive(Clone, Debug, serde::Serialize)]
pub struct GatewayState {
    /// Number of events in SysLog
    pub syslog_len: usize,
    /// Next event ID in SysLog
    pub syslog_next_id: u64,
    /// Number of commits in CommitLog
    pub commitlog_len: usize,
    /// Current sequence number in CommitLog
    pub commitlog_seq: u64,
    /// Head commit hash
    pub commitlog_head: CommitId,
}
