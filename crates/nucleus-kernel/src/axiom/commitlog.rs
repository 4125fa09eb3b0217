//! Commit Log
//!
//! Records table mutations as commits. Each commit links to the previous
//! one via a hash chain, so a truncated or edited log is detectable.

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

use super::{CommitId, EventId};

/// A state mutation record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Hash of this commit (computed from contents + prev_commit)
    pub id: CommitId,
    /// Hash of the previous commit (chain integrity)
    pub prev_commit: CommitId,
    /// Sequence number (monotonic)
    pub seq: u64,
    /// Timestamp (nanos since boot)
    pub timestamp: u64,
    /// The type of state mutation
    pub commit_type: CommitType,
    /// Optional: the kernel call that caused this commit
    pub caused_by: Option<EventId>,
}

impl Commit {
    /// A commit produced by the kernel that is not yet part of a log.
    ///
    /// `id`, `prev_commit`, `seq` and `timestamp` are filled in by
    /// [`CommitLog::append`], so every logged commit is stamped on one clock.
    pub fn unsealed(commit_type: CommitType) -> Self {
        Self {
            id: [0u8; 32],
            prev_commit: [0u8; 32],
            seq: 0,
            timestamp: 0,
            commit_type,
            caused_by: None,
        }
    }
}

/// Types of state mutations.
///
/// Endpoints are recorded by their raw value, slots by index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommitType {
    /// Genesis commit (system boot)
    Genesis,

    // === Process Lifecycle ===
    /// Slot assigned to a new process
    ProcessCreated { endpoint: u32, name: String },
    /// Slot retired
    ProcessExited { endpoint: u32, slot: u32 },

    // === Teardown side effects ===
    /// Armed alarm timer cancelled
    AlarmCancelled { endpoint: u32, timer: u32 },
    /// Interrupt hook freed
    IrqHookReleased { endpoint: u32, hook: u32, irq: u32 },
    /// Exiting sender spliced out of its target's caller queue
    SenderUnlinked { sender: u32, target: u32 },
    /// Peer blocked on the exiting process unblocked with a result code
    PeerWoken { peer: u32, result: i32 },
    /// Address space reset to the default mappings
    MappingsReset { slot: u32 },
}

impl CommitType {
    fn discriminant(&self) -> u8 {
        match self {
            CommitType::Genesis => 0,
            CommitType::ProcessCreated { .. } => 1,
            CommitType::ProcessExited { .. } => 2,
            CommitType::AlarmCancelled { .. } => 3,
            CommitType::IrqHookReleased { .. } => 4,
            CommitType::SenderUnlinked { .. } => 5,
            CommitType::PeerWoken { .. } => 6,
            CommitType::MappingsReset { .. } => 7,
        }
    }
}

/// Maximum number of commits to keep in memory
const MAX_COMMITLOG_ENTRIES: usize = 100000;

/// FNV-1a, no_std friendly
struct Fnv(u64);

impl Fnv {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;

    fn new() -> Self {
        Fnv(Self::OFFSET_BASIS)
    }

    fn write(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.0 ^= *byte as u64;
            self.0 = self.0.wrapping_mul(Self::PRIME);
        }
    }

    fn write_u32(&mut self, value: u32) {
        self.write(&value.to_le_bytes());
    }

    /// Expand to 32 bytes
    fn finish(self) -> CommitId {
        let mut result = [0u8; 32];
        let mut h = self.0;
        for chunk in result.chunks_mut(8) {
            chunk.copy_from_slice(&h.to_le_bytes());
            h = h.wrapping_mul(Self::PRIME);
        }
        result
    }
}

/// Commit log: every table mutation, in order.
pub struct CommitLog {
    /// Commit entries (append-only)
    commits: Vec<Commit>,
    /// Next sequence number
    next_seq: u64,
    /// Hash of the last commit
    last_hash: CommitId,
}

impl CommitLog {
    /// Create a new CommitLog with a genesis commit.
    pub fn new(timestamp: u64) -> Self {
        let genesis = Commit {
            timestamp,
            ..Commit::unsealed(CommitType::Genesis)
        };
        let id = Self::compute_hash(&genesis);
        let genesis = Commit { id, ..genesis };

        Self {
            commits: vec![genesis],
            next_seq: 1,
            last_hash: id,
        }
    }

    /// Append a new commit to the log.
    ///
    /// Returns the commit ID (hash).
    pub fn append(&mut self, commit_type: CommitType, caused_by: Option<EventId>, timestamp: u64) -> CommitId {
        let commit = Commit {
            prev_commit: self.last_hash,
            seq: self.next_seq,
            timestamp,
            caused_by,
            ..Commit::unsealed(commit_type)
        };
        let id = Self::compute_hash(&commit);
        let commit = Commit { id, ..commit };

        self.last_hash = id;
        self.next_seq += 1;
        self.commits.push(commit);

        if self.commits.len() > MAX_COMMITLOG_ENTRIES {
            let drain_count = self.commits.len() - MAX_COMMITLOG_ENTRIES;
            self.commits.drain(0..drain_count);
        }
        id
    }

    fn compute_hash(commit: &Commit) -> CommitId {
        let mut hasher = Fnv::new();
        hasher.write(&commit.prev_commit);
        hasher.write(&commit.seq.to_le_bytes());
        hasher.write(&commit.timestamp.to_le_bytes());
        hasher.write(&[commit.commit_type.discriminant()]);

        match &commit.commit_type {
            CommitType::Genesis => {}
            CommitType::ProcessCreated { endpoint, name } => {
                hasher.write_u32(*endpoint);
                hasher.write(name.as_bytes());
            }
            CommitType::ProcessExited { endpoint, slot } => {
                hasher.write_u32(*endpoint);
                hasher.write_u32(*slot);
            }
            CommitType::AlarmCancelled { endpoint, timer } => {
                hasher.write_u32(*endpoint);
                hasher.write_u32(*timer);
            }
            CommitType::IrqHookReleased { endpoint, hook, irq } => {
                hasher.write_u32(*endpoint);
                hasher.write_u32(*hook);
                hasher.write_u32(*irq);
            }
            CommitType::SenderUnlinked { sender, target } => {
                hasher.write_u32(*sender);
                hasher.write_u32(*target);
            }
            CommitType::PeerWoken { peer, result } => {
                hasher.write_u32(*peer);
                hasher.write(&result.to_le_bytes());
            }
            CommitType::MappingsReset { slot } => hasher.write_u32(*slot),
        }

        hasher.finish()
    }

    /// Get all commits.
    pub fn commits(&self) -> &[Commit] {
        &self.commits
    }

    /// Get the most recent N commits, newest first.
    pub fn get_recent(&self, count: usize) -> Vec<&Commit> {
        self.commits.iter().rev().take(count).collect()
    }

    /// Commits caused by the kernel call logged as `event`.
    pub fn caused_by(&self, event: EventId) -> Vec<&Commit> {
        self.commits
            .iter()
            .filter(|c| c.caused_by == Some(event))
            .collect()
    }

    /// Get the head commit ID (hash of the most recent commit).
    pub fn head(&self) -> CommitId {
        self.last_hash
    }

    /// Get the current sequence number (of the last commit).
    pub fn current_seq(&self) -> u64 {
        self.next_seq.saturating_sub(1)
    }

    pub fn len(&self) -> usize {
        self.commits.len()
    }

    /// Always false once constructed (genesis).
    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    /// Verify hash chain integrity of the retained commits.
    pub fn verify_integrity(&self) -> bool {
        let Some(first) = self.commits.first() else {
            return true;
        };

        let mut expected_prev = first.prev_commit;
        for commit in &self.commits {
            if commit.prev_commit != expected_prev || Self::compute_hash(commit) != commit.id {
                return false;
            }
            expected_prev = commit.id;
        }

        expected_prev == self.last_hash
    }
}

impl Default for CommitLog {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commitlog_creation() {
        let log = CommitLog::new(0);
        assert_eq!(log.len(), 1);
        assert_eq!(log.current_seq(), 0);
        assert_eq!(log.commits()[0].commit_type, CommitType::Genesis);
        assert!(log.verify_integrity());
    }

    #[test]
    fn test_commitlog_append() {
        let mut log = CommitLog::new(0);

        let id1 = log.append(
            CommitType::ProcessCreated {
                endpoint: 0x8acf,
                name: String::from("pm"),
            },
            None,
            1000,
        );
        let id2 = log.append(CommitType::ProcessExited { endpoint: 0x8acf, slot: 0 }, Some(4), 2000);

        assert_eq!(log.len(), 3);
        assert_eq!(log.current_seq(), 2);
        assert_ne!(id1, id2);
        assert_eq!(log.head(), id2);
        assert_eq!(log.caused_by(4).len(), 1);
    }

    #[test]
    fn test_commitlog_integrity() {
        let mut log = CommitLog::new(0);
        for i in 1..=10u32 {
            log.append(CommitType::PeerWoken { peer: i, result: -105 }, None, i as u64 * 1000);
        }
        assert!(log.verify_integrity());
    }

    #[test]
    fn test_commitlog_detects_tampering() {
        let mut log = CommitLog::new(0);
        log.append(CommitType::MappingsReset { slot: 3 }, None, 1000);
        log.append(CommitType::MappingsReset { slot: 4 }, None, 2000);

        log.commits[1].commit_type = CommitType::MappingsReset { slot: 9 };
        assert!(!log.verify_integrity());
    }

    #[test]
    fn test_same_type_different_payload_hashes_differ() {
        let mut a = CommitLog::new(0);
        let mut b = CommitLog::new(0);
        let id_a = a.append(CommitType::SenderUnlinked { sender: 1, target: 2 }, None, 10);
        let id_b = b.append(CommitType::SenderUnlinked { sender: 2, target: 1 }, None, 10);
        assert_ne!(id_a, id_b);
    }
}
