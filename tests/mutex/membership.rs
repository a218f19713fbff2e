//! The group shrinking while a request is out.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use lamport_mutex::bus::{Channel, InMemoryBus, StaticMembership, Topic, Transport};
use lamport_mutex::{
    DistributedMutex, LockError, Phase, ProcessId, QuorumRule, ACK_CHANNEL, REQUEST_CHANNEL,
};

use crate::support::{config, wait_until, Participant};

const WAIT: Duration = Duration::from_secs(5);

/// Participant 1 of a three-member group, with a group size set by hand.
fn with_static_size(bus: &InMemoryBus, rule: QuorumRule) -> (Participant, Arc<StaticMembership>) {
    let requests = Topic::new("shrink", "m", REQUEST_CHANNEL);
    let acks = Topic::new("shrink", "m", ACK_CHANNEL);
    let size = Arc::new(StaticMembership::new(3));
    bus.join("shrink", ProcessId(1)).unwrap();

    let participant = DistributedMutex::new(
        ProcessId(1),
        Channel::new(
            requests.clone(),
            bus.publisher(&requests).unwrap(),
            bus.subscriber(&requests).unwrap(),
        ),
        Channel::new(
            acks.clone(),
            bus.publisher(&acks).unwrap(),
            bus.subscriber(&acks).unwrap(),
        ),
        size.clone(),
        &config().with_quorum(rule),
    )
    .unwrap();
    (participant, size)
}

/// C holds, A requests and gets B's ACK, then the group shrinks to two
/// before C's release delivers the second ACK.
fn shrink_mid_round(
    rule: QuorumRule,
) -> (
    Arc<Participant>,
    thread::JoinHandle<Result<(), LockError>>,
    Participant,
) {
    let bus = InMemoryBus::new();
    let (a, size) = with_static_size(&bus, rule);
    let a = Arc::new(a);
    let _b = DistributedMutex::connect(&bus, "shrink", "m", ProcessId(2), &config()).unwrap();
    let c = DistributedMutex::connect(&bus, "shrink", "m", ProcessId(3), &config()).unwrap();

    c.acquire().unwrap();
    let waiter = thread::spawn({
        let a = Arc::clone(&a);
        move || a.acquire()
    });
    assert!(wait_until(WAIT, || a.ack_count().unwrap() == 1));
    assert!(wait_until(WAIT, || c.pending_len().unwrap() == 1));

    size.set(2);
    c.release().unwrap();
    thread::sleep(Duration::from_millis(100));
    (a, waiter, c)
}

#[test]
fn exact_quorum_stalls_on_overshoot() {
    let (a, waiter, _c) = shrink_mid_round(QuorumRule::Exact);

    assert_eq!(a.phase().unwrap(), Phase::Requesting);
    assert_eq!(a.ack_count().unwrap(), 2);
    assert!(!waiter.is_finished());
}

#[test]
fn at_least_quorum_enters_after_the_group_shrinks() {
    let (a, waiter, _c) = shrink_mid_round(QuorumRule::AtLeast);

    waiter.join().unwrap().unwrap();
    assert_eq!(a.phase().unwrap(), Phase::Holding);
    a.release().unwrap();
}
