//! The three-participant walk-through: grant, defer, release-as-ACK.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use lamport_mutex::bus::InMemoryBus;
use lamport_mutex::{Phase, Timestamp};

use crate::support::{acks_between, group, wait_until};

const WAIT: Duration = Duration::from_secs(5);

#[test]
fn release_is_the_deferred_ack() {
    let bus = InMemoryBus::new();
    let mut participants = group(&bus, "scenario", 3);
    let c = participants.pop().unwrap();
    let b = Arc::new(participants.pop().unwrap());
    let a = participants.pop().unwrap();

    // A requests; idle B and C grant at once
    a.acquire().unwrap();
    assert_eq!(a.phase().unwrap(), Phase::Holding);
    assert_eq!(acks_between(&bus, "scenario", 2, 1), 1);
    assert_eq!(acks_between(&bus, "scenario", 3, 1), 1);

    // B requests while A holds
    let waiter = thread::spawn({
        let b = Arc::clone(&b);
        move || b.acquire().unwrap()
    });

    // A defers B, C grants B, B waits on A alone
    assert!(wait_until(WAIT, || a.pending_len().unwrap() == 1));
    assert!(wait_until(WAIT, || b.ack_count().unwrap() == 1));
    assert_eq!(b.phase().unwrap(), Phase::Requesting);
    assert_eq!(acks_between(&bus, "scenario", 1, 2), 0);

    let b_request = b.own_request().unwrap();
    assert!(b_request > a.own_request().unwrap());
    assert!(c.own_request().unwrap().is_infinite());

    // A's release is exactly one ACK, to B
    let before = crate::support::acks(&bus, "scenario").len();
    a.release().unwrap();
    waiter.join().unwrap();

    assert_eq!(acks_between(&bus, "scenario", 1, 2), 1);
    assert_eq!(crate::support::acks(&bus, "scenario").len(), before + 1);
    assert_eq!(a.own_request().unwrap(), Timestamp::Infinite);
    assert_eq!(b.phase().unwrap(), Phase::Holding);
    assert_eq!(b.ack_count().unwrap(), 0);

    b.release().unwrap();
    assert_eq!(acks_between(&bus, "scenario", 2, 1), 1);
}

#[test]
fn idle_participant_never_defers() {
    let bus = InMemoryBus::new();
    let participants = group(&bus, "idle", 2);
    let (a, b) = (&participants[0], &participants[1]);

    for round in 1..=3 {
        a.acquire().unwrap();
        assert_eq!(b.pending_len().unwrap(), 0);
        assert_eq!(acks_between(&bus, "idle", 2, 1), round);
        a.release().unwrap();
    }
}

#[test]
fn clocks_only_move_forward() {
    let bus = InMemoryBus::new();
    let participants = group(&bus, "clocks", 3);

    let mut last = participants
        .iter()
        .map(|p| p.clock().unwrap())
        .collect::<Vec<_>>();
    for round in 0..6 {
        let p = &participants[round % 3];
        p.acquire().unwrap();
        p.release().unwrap();
        for (i, p) in participants.iter().enumerate() {
            let now = p.clock().unwrap();
            assert!(now >= last[i]);
            last[i] = now;
        }
    }

    // every ACK a participant received is below its own clock
    let acks = crate::support::acks(&bus, "clocks");
    for p in &participants {
        assert!(wait_until(WAIT, || {
            acks.iter()
                .filter(|a| a.target == p.id())
                .all(|a| a.timestamp.counter() < p.clock().unwrap().counter())
        }));
    }
}
