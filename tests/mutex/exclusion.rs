//! Safety and liveness under contention.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use lamport_mutex::bus::InMemoryBus;
use lamport_mutex::{DistributedMutex, LogicalClock, Phase, ProcessId};
use rand::Rng;

use crate::support::{config, group, wait_until};

const ROUNDS: usize = 20;

/// Shared "resource" updated with a non-atomic read-then-write.
#[derive(Default)]
struct Resource {
    value: AtomicUsize,
    inside: AtomicUsize,
    max_inside: AtomicUsize,
}

impl Resource {
    fn enter(&self) {
        let now = self.inside.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_inside.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.inside.fetch_sub(1, Ordering::SeqCst);
    }

    fn slow_increment(&self) {
        let v = self.value.load(Ordering::Relaxed);
        let pause = rand::thread_rng().gen_range(0..=500);
        thread::sleep(Duration::from_micros(pause));
        self.value.store(v + 1, Ordering::Relaxed);
    }
}

#[test]
fn at_most_one_holder() {
    let bus = InMemoryBus::new();
    let participants = group(&bus, "exclusion", 4);
    let resource = Arc::new(Resource::default());

    let workers = participants
        .into_iter()
        .map(|p| {
            let resource = Arc::clone(&resource);
            thread::spawn(move || {
                for _ in 0..ROUNDS {
                    p.acquire().unwrap();
                    resource.enter();
                    resource.slow_increment();
                    resource.leave();
                    p.release().unwrap();
                }
                p
            })
        })
        .collect::<Vec<_>>();

    let participants = workers
        .into_iter()
        .map(|w| w.join().unwrap())
        .collect::<Vec<_>>();

    assert_eq!(resource.value.load(Ordering::SeqCst), 4 * ROUNDS);
    assert_eq!(resource.max_inside.load(Ordering::SeqCst), 1);
    for p in participants {
        assert_eq!(p.phase().unwrap(), Phase::Idle);
        assert_eq!(p.pending_len().unwrap(), 0);
        assert_eq!(p.shutdown().failures, 0);
    }
}

#[test]
fn late_joiner_never_overlaps_an_established_member() {
    for run in 0..50 {
        let bus = InMemoryBus::new();
        let a = DistributedMutex::connect(&bus, "late", "m", ProcessId(1), &config()).unwrap();
        a.acquire().unwrap();
        a.release().unwrap();

        let b = DistributedMutex::connect(&bus, "late", "m", ProcessId(2), &config()).unwrap();
        let resource = Arc::new(Resource::default());

        let workers = [a, b]
            .into_iter()
            .map(|p| {
                let resource = Arc::clone(&resource);
                thread::spawn(move || {
                    p.acquire().unwrap();
                    resource.enter();
                    thread::sleep(Duration::from_millis(5));
                    resource.leave();
                    p.release().unwrap();
                    p
                })
            })
            .collect::<Vec<_>>();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(
            resource.max_inside.load(Ordering::SeqCst),
            1,
            "both held the mutex in run {run}"
        );
    }
}

#[test]
fn waiters_enter_in_request_order() {
    let bus = InMemoryBus::new();
    let mut participants = group(&bus, "order", 4);
    let holder = participants.remove(0);
    holder.acquire().unwrap();

    let entries: Arc<Mutex<Vec<LogicalClock>>> = Arc::default();
    let waiters = participants
        .into_iter()
        .map(|p| {
            let entries = Arc::clone(&entries);
            thread::spawn(move || {
                p.acquire().unwrap();
                let own = p.own_request().unwrap().clock().unwrap();
                entries.lock().unwrap().push(own);
                thread::sleep(Duration::from_millis(5));
                p.release().unwrap();
            })
        })
        .collect::<Vec<_>>();

    // everyone is queued behind the holder
    assert!(wait_until(Duration::from_secs(5), || {
        holder.pending_len().unwrap() == 3
    }));
    assert!(waiters.iter().all(|w| !w.is_finished()));

    holder.release().unwrap();
    waiters.into_iter().for_each(|w| w.join().unwrap());

    let entries = entries.lock().unwrap();
    assert_eq!(entries.len(), 3);
    assert!(entries.windows(2).all(|w| w[0] < w[1]), "{:?}", *entries);
}

#[test]
fn every_acquire_eventually_returns() {
    let bus = InMemoryBus::new();
    let participants = group(&bus, "liveness", 3);

    let workers = participants
        .into_iter()
        .map(|p| {
            thread::spawn(move || {
                for _ in 0..ROUNDS {
                    let guard = p.lock().unwrap();
                    drop(guard);
                }
                p.clock().unwrap().counter()
            })
        })
        .collect::<Vec<_>>();

    for worker in workers {
        assert!(worker.join().unwrap() >= ROUNDS as u64);
    }
}
