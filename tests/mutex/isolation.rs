//! Independent groups and independent mutexes never block each other.

use lamport_mutex::bus::InMemoryBus;
use lamport_mutex::{DistributedMutex, MutexRegistry, Phase, ProcessId};

use crate::support::{acks, config, group};

#[test]
fn groups_hold_concurrently() {
    let bus = InMemoryBus::new();
    let left = group(&bus, "left", 2);
    let right = group(&bus, "right", 2);

    left[0].acquire().unwrap();
    right[0].acquire().unwrap();
    assert_eq!(left[0].phase().unwrap(), Phase::Holding);
    assert_eq!(right[0].phase().unwrap(), Phase::Holding);

    assert!(acks(&bus, "left").iter().all(|a| a.target == ProcessId(1)));
    assert_eq!(acks(&bus, "left").len(), 1);
    assert_eq!(acks(&bus, "right").len(), 1);

    left[0].release().unwrap();
    right[0].release().unwrap();
}

#[test]
fn mutexes_in_one_group_are_independent() {
    let bus = InMemoryBus::new();
    let r1 = MutexRegistry::new(bus.clone(), ProcessId(1), config());
    let r2 = MutexRegistry::new(bus.clone(), ProcessId(2), config());

    let jobs_1 = r1.get("shared", "jobs").unwrap();
    let jobs_2 = r2.get("shared", "jobs").unwrap();
    let files_1 = r1.get("shared", "files").unwrap();
    let files_2 = r2.get("shared", "files").unwrap();

    jobs_1.acquire().unwrap();
    files_2.acquire().unwrap();
    assert_eq!(jobs_1.phase().unwrap(), Phase::Holding);
    assert_eq!(files_2.phase().unwrap(), Phase::Holding);

    jobs_1.release().unwrap();
    files_2.release().unwrap();
    jobs_2.acquire().unwrap();
    files_1.acquire().unwrap();
    jobs_2.release().unwrap();
    files_1.release().unwrap();
}

#[test]
fn late_joiner_catches_up_from_history() {
    let bus = InMemoryBus::new();
    let a = DistributedMutex::connect(&bus, "late", "m", ProcessId(1), &config()).unwrap();
    a.acquire().unwrap();
    a.release().unwrap();

    let b = DistributedMutex::connect(&bus, "late", "m", ProcessId(2), &config()).unwrap();
    assert_eq!(a.group_size().unwrap(), 2);

    // b has replayed a's old request and moved past it before connect returned
    assert!(b.clock().unwrap().counter() > 1);

    b.acquire().unwrap();
    b.release().unwrap();
    a.acquire().unwrap();
    a.release().unwrap();
}
