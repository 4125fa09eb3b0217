//! Axiom audit layer
//!
//! Two append-only logs sit next to the kernel:
//!
//! - [`SysLog`] records every kernel call request and, when the caller gets
//!   one, its response.
//! - [`CommitLog`] records every table mutation the kernel performed, hash
//!   chained from a genesis commit.
//!
//! [`AxiomGateway`] owns both and is driven by [`crate::System`].

mod commitlog;
mod gateway;
mod syslog;

pub use commitlog::{Commit, CommitLog, CommitType};
pub use gateway::{AxiomGateway, GatewayState};
pub use syslog::{SysEvent, SysEventType, SysLog};

/// Event identifier (monotonic, unique within SysLog)
pub type EventId = u64;

/// Commit identifier (32-byte hash)
pub type CommitId = [u8; 32];
