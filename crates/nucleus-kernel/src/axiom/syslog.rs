//! System Event Log (SysLog)
//!
//! Records kernel calls (request + response) for the audit trail. Calls that
//! end without a reply, such as a process exiting itself, only have a
//! request entry.

use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

use super::EventId;

/// A system event (kernel call request or response).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SysEvent {
    /// Unique event ID (monotonic)
    pub id: EventId,
    /// Slot of the process that made the call
    pub caller: usize,
    /// Timestamp (nanos since boot)
    pub timestamp: u64,
    /// Event type (request or response)
    pub event_type: SysEventType,
}

/// Type of system event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SysEventType {
    /// Kernel call request from a process
    Request {
        /// Kernel call number
        call_nr: u32,
        /// Call arguments
        args: [u32; 4],
    },
    /// Reply sent back to the caller
    Response {
        /// ID of the request this responds to
        request_id: EventId,
        /// Result code (negative = error)
        result: i64,
    },
}

/// Maximum number of events to keep in memory
const MAX_SYSLOG_EVENTS: usize = 10000;

/// System event log for auditing.
pub struct SysLog {
    /// Event entries (append-only)
    events: Vec<SysEvent>,
    /// Next event ID to assign
    next_id: EventId,
}

impl SysLog {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            next_id: 0,
        }
    }

    /// Log a kernel call request.
    ///
    /// Returns the event ID for correlating with the response.
    pub fn log_request(&mut self, caller: usize, call_nr: u32, args: [u32; 4], timestamp: u64) -> EventId {
        self.push(caller, timestamp, SysEventType::Request { call_nr, args })
    }

    /// Log the reply to an earlier request.
    pub fn log_response(&mut self, caller: usize, request_id: EventId, result: i64, timestamp: u64) {
        self.push(caller, timestamp, SysEventType::Response { request_id, result });
    }

    /// Get all events.
    pub fn events(&self) -> &[SysEvent] {
        &self.events
    }

    /// Get the most recent N events, newest first.
    pub fn get_recent(&self, count: usize) -> Vec<&SysEvent> {
        self.events.iter().rev().take(count).collect()
    }

    /// Find the response logged for `request_id`, if any.
    pub fn response_to(&self, request_id: EventId) -> Option<&SysEvent> {
        self.events.iter().find(|e| {
            matches!(e.event_type, SysEventType::Response { request_id: id, .. } if id == request_id)
        })
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Get the next event ID.
    pub fn next_id(&self) -> EventId {
        self.next_id
    }

    fn push(&mut self, caller: usize, timestamp: u64, event_type: SysEventType) -> EventId {
        let id = self.next_id;
        self.next_id += 1;

        self.events.push(SysEvent {
            id,
            caller,
            timestamp,
            event_type,
        });

        if self.events.len() > MAX_SYSLOG_EVENTS {
            let drain_count = self.events.len() - MAX_SYSLOG_EVENTS;
            self.events.drain(0..drain_count);
        }
        id
    }
}

impl Default for SysLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syslog_creation() {
        let log = SysLog::new();
        assert!(log.is_empty());
        assert_eq!(log.next_id(), 0);
    }

    #[test]
    fn test_syslog_request_response() {
        let mut log = SysLog::new();

        let req_id = log.log_request(0, 0x602, [7, 0, 0, 0], 1000);
        log.log_response(0, req_id, 0, 1100);

        assert_eq!(log.len(), 2);
        let events = log.events();
        assert_eq!(
            events[0].event_type,
            SysEventType::Request {
                call_nr: 0x602,
                args: [7, 0, 0, 0]
            }
        );
        assert_eq!(log.response_to(req_id).map(|e| e.id), Some(1));
    }

    #[test]
    fn test_syslog_request_without_response() {
        let mut log = SysLog::new();
        let req_id = log.log_request(3, 0x602, [0; 4], 1000);
        assert!(log.response_to(req_id).is_none());
    }

    #[test]
    fn test_syslog_trims_oldest() {
        let mut log = SysLog::new();
        for i in 0..(MAX_SYSLOG_EVENTS + 5) {
            log.log_request(1, 0, [0; 4], i as u64);
        }
        assert_eq!(log.len(), MAX_SYSLOG_EVENTS);
        assert_eq!(log.events()[0].id, 5);
        assert_eq!(log.get_recent(1)[0].id, (MAX_SYSLOG_EVENTS + 4) as u64);
    }
}
