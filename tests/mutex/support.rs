//! Test group: N participants for one mutex on a shared in-memory bus.

use std::thread;
use std::time::{Duration, Instant};

use lamport_mutex::bus::{InMemoryBus, InMemoryQueue, Topic};
use lamport_mutex::{Ack, DistributedMutex, MutexConfig, ProcessId, ACK_CHANNEL};

pub type Participant = DistributedMutex<InMemoryQueue, InMemoryQueue>;

pub fn config() -> MutexConfig {
    MutexConfig::default().with_poll_interval(Duration::from_millis(2))
}

/// Participants with ids `1..=n` in `group`, all joined before anyone acquires.
pub fn group(bus: &InMemoryBus, group: &str, n: u64) -> Vec<Participant> {
    (1..=n)
        .map(|id| DistributedMutex::connect(bus, group, "m", ProcessId(id), &config()).unwrap())
        .collect()
}

/// Poll `cond` until it holds or `timeout` passes.
pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    cond()
}

/// Every ACK published in `group` so far.
pub fn acks(bus: &InMemoryBus, group: &str) -> Vec<Ack> {
    bus.queue(&Topic::new(group, "m", ACK_CHANNEL))
        .unwrap()
        .messages()
        .unwrap()
        .iter()
        .map(|m| m.decode::<Ack>().unwrap())
        .collect()
}

/// ACKs sent from `from` to `to`.
pub fn acks_between(bus: &InMemoryBus, group: &str, from: u64, to: u64) -> usize {
    acks(bus, group)
        .iter()
        .filter(|a| a.sender() == ProcessId(from) && a.target == ProcessId(to))
        .count()
}
