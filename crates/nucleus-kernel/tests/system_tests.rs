//! System-level tests: kernel calls through the Axiom gateway

use nucleus_hal_mock::MockHal;
use nucleus_ipc::call::SYS_EXIT;
use nucleus_ipc::result::{EBADREQUEST, EINVAL};
use nucleus_kernel::{
    CommitType, Endpoint, SlotIndex, SpawnOptions, SysEventType, System, WakeResult,
};

fn system_with(count: usize) -> (System<MockHal>, Vec<Endpoint>) {
    let mut system = System::new(MockHal::with_time(1_000));
    let mut eps = vec![system.spawn("pm", SpawnOptions::default()).unwrap()];
    for i in 1..=count {
        eps.push(system.spawn(&format!("p{}", i), SpawnOptions::default()).unwrap());
    }
    (system, eps)
}

#[test]
fn test_supervisor_exit_call_is_answered() {
    let (mut system, eps) = system_with(2);
    let target = eps[2];

    let reply = system.process_kernel_call(SlotIndex(0), SYS_EXIT, [target.0, 0, 0, 0]);

    assert_eq!(reply, Some(0));
    assert!(!system.kernel.state().is_occupied(target.slot()));

    let events = system.syslog().events();
    assert_eq!(events.len(), 2);
    assert!(matches!(
        events[0].event_type,
        SysEventType::Request { call_nr: SYS_EXIT, .. }
    ));
    let response = system.syslog().response_to(events[0].id).unwrap();
    assert!(matches!(response.event_type, SysEventType::Response { result: 0, .. }));
}

#[test]
fn test_self_exit_call_gets_no_reply() {
    let (mut system, eps) = system_with(1);
    let caller = eps[1].slot();

    let reply = system.process_kernel_call(caller, SYS_EXIT, [Endpoint::SELF.0, 0, 0, 0]);

    assert_eq!(reply, None);
    assert!(!system.kernel.state().is_occupied(caller));
    let events = system.syslog().events();
    assert_eq!(events.len(), 1);
    assert!(system.syslog().response_to(events[0].id).is_none());
}

#[test]
fn test_supervisor_self_exit_call_gets_no_reply() {
    let (mut system, _) = system_with(1);

    let reply = system.process_kernel_call(SlotIndex(0), SYS_EXIT, [Endpoint::SELF.0, 0, 0, 0]);

    assert_eq!(reply, None);
    assert!(!system.kernel.state().is_occupied(SlotIndex(0)));
    assert_eq!(system.syslog().len(), 1);
}

#[test]
fn test_commits_stamped_with_uptime() {
    let (mut system, eps) = system_with(2);
    system.hal().advance_time(500);
    system.exit_process(eps[1].slot());

    system.hal().advance_time(250);
    system.process_kernel_call(eps[2].slot(), SYS_EXIT, [Endpoint::SELF.0, 0, 0, 0]);

    let exited: Vec<u64> = system
        .commitlog()
        .commits()
        .iter()
        .filter(|c| matches!(c.commit_type, CommitType::ProcessExited { .. }))
        .map(|c| c.timestamp)
        .collect();
    assert_eq!(exited, vec![500, 750]);
    assert_eq!(system.syslog().events()[0].timestamp, 750);
}

#[test]
fn test_exit_call_for_stale_endpoint() {
    let (mut system, eps) = system_with(1);
    let old = eps[1];
    system.exit_process(old.slot());
    system.spawn("reused", SpawnOptions::default()).unwrap();

    let reply = system.process_kernel_call(SlotIndex(0), SYS_EXIT, [old.0, 0, 0, 0]);

    assert_eq!(reply, Some(EINVAL as i64));
    assert!(system.kernel.state().is_occupied(old.slot()));
}

#[test]
fn test_unknown_kernel_call() {
    let (mut system, _) = system_with(0);
    let commits_before = system.commitlog().len();

    let reply = system.process_kernel_call(SlotIndex(0), 0x7ff, [0; 4]);

    assert_eq!(reply, Some(EBADREQUEST as i64));
    assert_eq!(system.commitlog().len(), commits_before);
}

#[test]
fn test_teardown_commits_caused_by_request() {
    let (mut system, eps) = system_with(2);
    let (receiver, dying) = (eps[1], eps[2]);
    system.kernel.block_receive(receiver.slot(), dying).unwrap();

    system.process_kernel_call(dying.slot(), SYS_EXIT, [Endpoint::SELF.0, 0, 0, 0]);

    let request_id = system.syslog().events()[0].id;
    let caused: Vec<&CommitType> = system
        .commitlog()
        .caused_by(request_id)
        .into_iter()
        .map(|c| &c.commit_type)
        .collect();
    assert!(caused.contains(&&CommitType::ProcessExited {
        endpoint: dying.0,
        slot: dying.slot().0 as u32,
    }));
    assert!(caused.contains(&&CommitType::PeerWoken {
        peer: receiver.0,
        result: WakeResult::SourceDied.code(),
    }));
    assert!(system.axiom.verify_integrity());
}

#[test]
fn test_internal_operations_are_recorded() {
    let mut system = System::new(MockHal::new());
    // genesis
    assert_eq!(system.commitlog().len(), 1);

    let ep = system.spawn("init", SpawnOptions::default()).unwrap();
    assert!(matches!(
        system.commitlog().commits().last().map(|c| &c.commit_type),
        Some(CommitType::ProcessCreated { .. })
    ));

    system.exit_process(ep.slot());
    assert!(matches!(
        system.commitlog().commits().last().map(|c| &c.commit_type),
        Some(CommitType::ProcessExited { .. })
    ));
    assert!(system.commitlog().commits().iter().all(|c| c.caused_by.is_none()));
    assert!(system.syslog().is_empty());
    assert!(system.axiom.verify_integrity());
}

#[test]
fn test_uptime_tracks_hal_time() {
    let system = System::new(MockHal::with_time(5_000));
    assert_eq!(system.boot_time(), 5_000);
    system.hal().advance_time(250);
    assert_eq!(system.uptime_nanos(), 250);
}

#[test]
fn test_logs_serialize_to_json() {
    let (mut system, eps) = system_with(1);
    system.process_kernel_call(SlotIndex(0), SYS_EXIT, [eps[1].0, 0, 0, 0]);

    let events = serde_json::to_string(system.syslog().events()).unwrap();
    assert!(events.contains("Request"));
    assert!(events.contains("Response"));

    let commits = serde_json::to_string(system.commitlog().commits()).unwrap();
    assert!(commits.contains("ProcessExited"));

    let summary = serde_json::to_string(&system.axiom.state_summary()).unwrap();
    assert!(summary.contains("commitlog_seq"));
}
