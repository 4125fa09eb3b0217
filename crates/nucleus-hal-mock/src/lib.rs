//! Mock HAL implementation for testing Nucleus
//!
//! This provides a mock implementation of the HAL trait that can be used
//! for testing the kernel without real hardware. It keeps an in-memory
//! ready queue and records every collaborator call so tests can assert on
//! what teardown asked the platform to do.

#![no_std]
extern crate alloc;

use alloc::collections::{BTreeSet, VecDeque};
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::sync::atomic::{AtomicU64, Ordering};
use nucleus_hal::{HalError, HAL};

/// A collaborator call observed by the mock
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HalCall {
    Enqueue(usize),
    Dequeue(usize),
    CancelTimer(u32),
    DetachHook { hook: usize, irq: u32 },
    ResetMappings(usize),
}

/// Mock HAL for unit testing
///
/// Provides a simulated ready queue, time and debug console, plus switches
/// to make the interrupt controller or the VM fail.
pub struct MockHal {
    /// Simulated time in nanoseconds
    time: AtomicU64,
    /// Captured debug messages
    debug_log: RefCell<Vec<String>>,
    /// Simulated ready queue, in scheduling order
    ready: RefCell<VecDeque<usize>>,
    /// Every collaborator call, in order
    calls: RefCell<Vec<HalCall>>,
    /// Hooks currently attached at the controller (only when tracking)
    attached_hooks: RefCell<Option<BTreeSet<usize>>>,
    /// Fail every `detach_hook`
    fail_detach: Cell<bool>,
    /// Fail every `reset_mappings_to_default`
    fail_vm: Cell<bool>,
}

impl MockHal {
    /// Create a new mock HAL
    pub fn new() -> Self {
        Self::with_time(0)
    }

    /// Create a mock HAL with a specific starting time
    pub fn with_time(nanos: u64) -> Self {
        Self {
            time: AtomicU64::new(nanos),
            debug_log: RefCell::new(Vec::new()),
            ready: RefCell::new(VecDeque::new()),
            calls: RefCell::new(Vec::new()),
            attached_hooks: RefCell::new(None),
            fail_detach: Cell::new(false),
            fail_vm: Cell::new(false),
        }
    }

    /// Advance the simulated time by the given duration
    pub fn advance_time(&self, nanos: u64) {
        self.time.fetch_add(nanos, Ordering::SeqCst);
    }

    /// Set the simulated time to a specific value
    pub fn set_time(&self, nanos: u64) {
        self.time.store(nanos, Ordering::SeqCst);
    }

    /// Get all captured debug messages
    pub fn get_debug_log(&self) -> Vec<String> {
        self.debug_log.borrow().clone()
    }

    /// Clear the debug log
    pub fn clear_debug_log(&self) {
        self.debug_log.borrow_mut().clear();
    }

    /// Check if a specific message was logged
    pub fn has_log_containing(&self, substr: &str) -> bool {
        self.debug_log
            .borrow()
            .iter()
            .any(|msg| msg.contains(substr))
    }

    /// Snapshot of the ready queue, head first
    pub fn ready_slots(&self) -> Vec<usize> {
        self.ready.borrow().iter().copied().collect()
    }

    /// Check whether a slot is on the ready queue
    pub fn is_ready(&self, slot: usize) -> bool {
        self.ready.borrow().contains(&slot)
    }

    /// Every collaborator call since creation or the last `clear_calls`
    pub fn calls(&self) -> Vec<HalCall> {
        self.calls.borrow().clone()
    }

    /// Forget recorded calls
    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    /// Make `detach_hook` fail with `HookNotAttached`
    pub fn fail_detach(&self, fail: bool) {
        self.fail_detach.set(fail);
    }

    /// Make `reset_mappings_to_default` fail with `VmFailure`
    pub fn fail_vm(&self, fail: bool) {
        self.fail_vm.set(fail);
    }

    /// Record `hook` as attached at the controller.
    ///
    /// Once any hook has been recorded, `detach_hook` on an unknown hook
    /// fails with `HookNotAttached`.
    pub fn attach_hook(&self, hook: usize) {
        self.attached_hooks
            .borrow_mut()
            .get_or_insert_with(BTreeSet::new)
            .insert(hook);
    }

    /// Hooks still attached at the controller
    pub fn attached_hooks(&self) -> Vec<usize> {
        self.attached_hooks
            .borrow()
            .as_ref()
            .map(|hooks| hooks.iter().copied().collect())
            .unwrap_or_default()
    }

    fn record(&self, call: HalCall) {
        self.calls.borrow_mut().push(call);
    }
}

impl Default for MockHal {
    fn default() -> Self {
        Self::new()
    }
}

// MockHal is Send + Sync because it uses atomic operations and RefCell
// is only accessed in single-threaded test contexts
unsafe impl Send for MockHal {}
unsafe impl Sync for MockHal {}

impl HAL for MockHal {
    fn enqueue_ready(&self, slot: usize) {
        self.record(HalCall::Enqueue(slot));
        self.ready.borrow_mut().push_back(slot);
    }

    fn dequeue_ready(&self, slot: usize) {
        self.record(HalCall::Dequeue(slot));
        let mut ready = self.ready.borrow_mut();
        if let Some(pos) = ready.iter().position(|&s| s == slot) {
            ready.remove(pos);
        }
    }

    fn cancel_timer(&self, timer: u32) {
        self.record(HalCall::CancelTimer(timer));
    }

    fn detach_hook(&self, hook: usize, irq: u32) -> Result<(), HalError> {
        self.record(HalCall::DetachHook { hook, irq });
        if self.fail_detach.get() {
            return Err(HalError::HookNotAttached);
        }
        if let Some(hooks) = self.attached_hooks.borrow_mut().as_mut() {
            if !hooks.remove(&hook) {
                return Err(HalError::HookNotAttached);
            }
        }
        Ok(())
    }

    fn reset_mappings_to_default(&self, slot: usize) -> Result<(), HalError> {
        self.record(HalCall::ResetMappings(slot));
        if self.fail_vm.get() {
            Err(HalError::VmFailure)
        } else {
            Ok(())
        }
    }

    fn now_nanos(&self) -> u64 {
        self.time.load(Ordering::SeqCst)
    }

    fn debug_write(&self, msg: &str) {
        self.debug_log.borrow_mut().push(String::from(msg));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_mock_hal_time() {
        let hal = MockHal::new();
        assert_eq!(hal.now_nanos(), 0);

        hal.advance_time(1_000_000_000); // 1 second
        assert_eq!(hal.now_nanos(), 1_000_000_000);

        hal.set_time(5);
        assert_eq!(hal.now_nanos(), 5);
    }

    #[test]
    fn test_mock_hal_debug_log() {
        let hal = MockHal::new();

        hal.debug_write("Hello");
        hal.debug_write("World");

        let log = hal.get_debug_log();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0], "Hello");
        assert!(hal.has_log_containing("World"));
        assert!(!hal.has_log_containing("Foo"));

        hal.clear_debug_log();
        assert!(hal.get_debug_log().is_empty());
    }

    #[test]
    fn test_mock_hal_ready_queue() {
        let hal = MockHal::new();
        hal.enqueue_ready(1);
        hal.enqueue_ready(4);
        hal.enqueue_ready(2);
        assert_eq!(hal.ready_slots(), vec![1, 4, 2]);

        hal.dequeue_ready(4);
        assert_eq!(hal.ready_slots(), vec![1, 2]);
        assert!(!hal.is_ready(4));

        // Dequeue of an absent slot is a no-op
        hal.dequeue_ready(9);
        assert_eq!(hal.ready_slots(), vec![1, 2]);
    }

    #[test]
    fn test_mock_hal_records_calls() {
        let hal = MockHal::new();
        hal.cancel_timer(3);
        hal.detach_hook(0, 11).unwrap();
        hal.reset_mappings_to_default(2).unwrap();

        assert_eq!(
            hal.calls(),
            vec![
                HalCall::CancelTimer(3),
                HalCall::DetachHook { hook: 0, irq: 11 },
                HalCall::ResetMappings(2),
            ]
        );
        hal.clear_calls();
        assert!(hal.calls().is_empty());
    }

    #[test]
    fn test_mock_hal_failure_switches() {
        let hal = MockHal::new();
        hal.fail_detach(true);
        hal.fail_vm(true);
        assert_eq!(hal.detach_hook(0, 1), Err(HalError::HookNotAttached));
        assert_eq!(hal.reset_mappings_to_default(0), Err(HalError::VmFailure));

        hal.fail_detach(false);
        assert_eq!(hal.detach_hook(0, 1), Ok(()));
    }

    #[test]
    fn test_mock_hal_tracks_attached_hooks() {
        let hal = MockHal::new();
        hal.attach_hook(2);
        hal.attach_hook(5);

        assert_eq!(hal.detach_hook(2, 7), Ok(()));
        assert_eq!(hal.detach_hook(2, 7), Err(HalError::HookNotAttached));
        assert_eq!(hal.attached_hooks(), vec![5]);
    }
}
