//! Distributed mutex - Lamport mutual exclusion with release folded into ACKs.
//!
//! Each participant runs three activities against one shared state:
//!
//! ```text
//!   caller thread            request reactor           ack reactor
//!   acquire() / release()    (REQUEST channel)         (ACK channel)
//!         │                        │                        │
//!         ▼                        ▼                        ▼
//!   ┌───────────────────────────────────────┐   ┌──────────────────────┐
//!   │ ParticipantState (one Mutex)          │   │ AckTracker           │
//!   │ clock, own request, phase, pending    │   │ acked peers, grant   │
//!   └───────────────────────────────────────┘   └──────────────────────┘
//! ```
//!
//! `acquire` stamps a request, broadcasts it and blocks until every other
//! member has acknowledged it. Peers acknowledge at once unless their own
//! request is older, in which case they defer and pay the ACK on release.
//! There is no separate release message.
//!
//! The state lock is never held while publishing or while taking the
//! tracker lock. ACKs the bus refuses are kept in the state and re-sent by
//! the request reactor on every poll until they go through.

mod ack_tracker;
mod pending_queue;
mod reactor;
mod state;
mod thread;

use std::sync::{Arc, Mutex, MutexGuard as StdGuard};

use tracing::{debug, warn};

pub use ack_tracker::AckTracker;
pub use pending_queue::PendingQueue;
pub use state::{ParticipantState, Phase};
pub use thread::{ReactorStats, ReactorThread};

use self::reactor::{AckReactor, RequestReactor};
use crate::bus::{Channel, Membership, Publisher, Subscriber, Topic, Transport};
use crate::clock::{LogicalClock, ProcessId, Timestamp};
use crate::config::MutexConfig;
use crate::lock::{Lock, LockError};
use crate::protocol::{Ack, Request, ACK_CHANNEL, REQUEST_CHANNEL};

/// State shared by the caller and both reactors.
pub(crate) struct Core<P: Publisher, S: Subscriber> {
    id: ProcessId,
    state: Mutex<ParticipantState>,
    tracker: AckTracker,
    membership: Arc<dyn Membership>,
    requests: Channel<Request, P, S>,
    acks: Channel<Ack, P, S>,
}

impl<P: Publisher, S: Subscriber> Core<P, S> {
    fn lock_state(&self) -> Result<StdGuard<'_, ParticipantState>, LockError> {
        self.state
            .lock()
            .map_err(|e| LockError::Poisoned(e.to_string()))
    }

    /// ACKs needed for quorum: every other current member.
    fn quorum_size(&self) -> Result<usize, LockError> {
        Ok(self.membership.group_size()?.saturating_sub(1))
    }

    /// Publish `acks`. If the bus refuses them they are kept for
    /// [`retry_unsent`](Self::retry_unsent) and the error is returned.
    fn send_acks(&self, acks: Vec<Ack>) -> Result<(), LockError> {
        if acks.is_empty() {
            return Ok(());
        }
        if let Err(e) = self.acks.publish_batch(&acks) {
            warn!(participant = %self.id, count = acks.len(), error = %e, "failed to send acks, keeping them");
            self.lock_state()?.keep_unsent(acks);
            return Err(e.into());
        }
        Ok(())
    }

    fn retry_unsent(&self) -> Result<(), LockError> {
        let unsent = self.lock_state()?.take_unsent();
        self.send_acks(unsent)
    }

    /// Grant or defer `batch`, then publish the grants.
    fn answer_requests(&self, batch: &[Request]) -> Result<usize, LockError> {
        let grants = self.lock_state()?.react_to_requests(batch);
        let granted = grants.len();
        self.send_acks(grants)?;
        Ok(granted)
    }

    /// Answer every request already on the bus before the participant can
    /// stamp one of its own.
    ///
    /// A joiner that requested first would stamp a low clock, grant older
    /// requests from the history afterwards and let a peer count that grant
    /// toward a later round. Replaying first puts our clock above every
    /// request in the history.
    fn catch_up(&self) -> Result<usize, LockError> {
        let mut replayed = 0;
        loop {
            let batch = self.requests.drain(0)?;
            if batch.is_empty() {
                return Ok(replayed);
            }
            replayed += batch.len();
            match self.answer_requests(&batch) {
                // refused grants stay queued for the request reactor
                Ok(_) | Err(LockError::Transport(_)) => {}
                Err(e) => return Err(e),
            }
        }
    }
}

/// One participant's handle on a distributed mutex.
///
/// Not reentrant: `acquire` is only valid when idle and `release` only
/// while holding. Violations return [`LockError::InvalidPhase`] and leave
/// the state untouched. Concurrent `acquire` calls on the same handle are
/// rejected the same way.
///
/// ## Example
///
/// ```
/// use lamport_mutex::bus::InMemoryBus;
/// use lamport_mutex::{DistributedMutex, MutexConfig, ProcessId};
///
/// let bus = InMemoryBus::new();
/// let config = MutexConfig::default();
/// let a = DistributedMutex::connect(&bus, "g", "printer", ProcessId(1), &config).unwrap();
/// let b = DistributedMutex::connect(&bus, "g", "printer", ProcessId(2), &config).unwrap();
///
/// a.acquire().unwrap();
/// // ... critical section ...
/// a.release().unwrap();
///
/// let guard = b.lock().unwrap();
/// drop(guard); // releases
/// ```
pub struct DistributedMutex<P: Publisher + 'static, S: Subscriber + 'static> {
    core: Arc<Core<P, S>>,
    reactors: Vec<ReactorThread>,
}

impl<P, S> DistributedMutex<P, S>
where
    P: Publisher + 'static,
    S: Subscriber + 'static,
{
    /// Start a participant on the given channels and spawn its two reactors.
    ///
    /// Requests already on the request channel are answered before this
    /// returns.
    pub fn new(
        id: ProcessId,
        requests: Channel<Request, P, S>,
        acks: Channel<Ack, P, S>,
        membership: Arc<dyn Membership>,
        config: &MutexConfig,
    ) -> Result<Self, LockError> {
        let core = Arc::new(Core {
            id,
            state: Mutex::new(ParticipantState::new(id)),
            tracker: AckTracker::new(config.quorum),
            membership,
            requests,
            acks,
        });

        let replayed = core.catch_up()?;

        let prefix = format!("{}-{}", config.thread_name_prefix, id);
        let reactors = vec![
            ReactorThread::spawn(
                format!("{}-{}", prefix, REQUEST_CHANNEL),
                RequestReactor::new(Arc::clone(&core)),
                config.poll_interval(),
            )?,
            ReactorThread::spawn(
                format!("{}-{}", prefix, ACK_CHANNEL),
                AckReactor::new(Arc::clone(&core)),
                config.poll_interval(),
            )?,
        ];

        debug!(participant = %id, request_topic = %core.requests.topic(), replayed, "participant started");
        Ok(Self { core, reactors })
    }

    /// Join `group` on `transport` and start a participant for `mutex`.
    pub fn connect<T>(
        transport: &T,
        group: &str,
        mutex: &str,
        id: ProcessId,
        config: &MutexConfig,
    ) -> Result<Self, LockError>
    where
        T: Transport<Publisher = P, Subscriber = S>,
    {
        let request_topic = Topic::new(group, mutex, REQUEST_CHANNEL);
        let ack_topic = Topic::new(group, mutex, ACK_CHANNEL);

        // Channels first: peers start counting on our ACKs as soon as we join.
        let requests = Channel::new(
            request_topic.clone(),
            transport.publisher(&request_topic)?,
            transport.subscriber(&request_topic)?,
        );
        let acks = Channel::new(
            ack_topic.clone(),
            transport.publisher(&ack_topic)?,
            transport.subscriber(&ack_topic)?,
        );
        let membership = transport.join(group, id)?;

        Self::new(id, requests, acks, membership, config)
    }

    /// Block until this participant holds the mutex.
    ///
    /// There is no timeout: if a member never answers, this never returns.
    pub fn acquire(&self) -> Result<(), LockError> {
        let core = &self.core;
        let needed = core.quorum_size()?;
        let request = core.lock_state()?.begin_request()?;
        core.tracker.arm(request.clock(), needed)?;

        debug!(participant = %core.id, request = %request.clock(), needed, "requesting");
        if let Err(e) = core.requests.publish(&request) {
            warn!(participant = %core.id, request = %request.clock(), error = %e, "request not published, withdrawing");
            core.tracker.disarm()?;
            let owed = core.lock_state()?.withdraw();
            // refused ACKs are kept and retried; report the request failure
            let _ = core.send_acks(owed);
            return Err(e.into());
        }

        core.tracker.wait()?;
        core.lock_state()?.enter()?;
        debug!(participant = %core.id, request = %request.clock(), "holding");
        Ok(())
    }

    /// Leave the critical section, sending the ACKs deferred while holding.
    ///
    /// Returns once those ACKs are handed to the bus. If the bus refuses
    /// them the participant is still released: the error is returned and
    /// the ACKs are re-sent in the background until the bus takes them.
    pub fn release(&self) -> Result<(), LockError> {
        let owed = self.core.lock_state()?.release()?;
        debug!(participant = %self.core.id, deferred = owed.len(), "released");
        self.core.send_acks(owed)
    }

    /// [`acquire`](Self::acquire), returning a guard that releases on drop.
    pub fn lock(&self) -> Result<MutexGuard<'_, P, S>, LockError> {
        self.acquire()?;
        Ok(MutexGuard {
            mutex: self,
            released: false,
        })
    }

    pub fn id(&self) -> ProcessId {
        self.core.id
    }

    pub fn phase(&self) -> Result<Phase, LockError> {
        Ok(self.core.lock_state()?.phase())
    }

    pub fn clock(&self) -> Result<LogicalClock, LockError> {
        Ok(self.core.lock_state()?.clock())
    }

    pub fn own_request(&self) -> Result<Timestamp, LockError> {
        Ok(self.core.lock_state()?.own_request())
    }

    /// Requests deferred until our next release.
    pub fn pending_len(&self) -> Result<usize, LockError> {
        Ok(self.core.lock_state()?.pending().len())
    }

    /// ACKs the bus refused and that are waiting to be re-sent.
    pub fn unsent_len(&self) -> Result<usize, LockError> {
        Ok(self.core.lock_state()?.unsent().len())
    }

    /// Distinct peers that have acknowledged the in-flight request.
    pub fn ack_count(&self) -> Result<usize, LockError> {
        self.core.tracker.ack_count()
    }

    pub fn group_size(&self) -> Result<usize, LockError> {
        Ok(self.core.membership.group_size()?)
    }

    /// Stop both reactors and wait for them. Returns their combined statistics.
    pub fn shutdown(self) -> ReactorStats {
        self.reactors
            .into_iter()
            .map(ReactorThread::stop)
            .fold(ReactorStats::default(), |total, stats| total + stats)
    }
}

impl<P, S> Lock for DistributedMutex<P, S>
where
    P: Publisher + 'static,
    S: Subscriber + 'static,
{
    fn lock(&self) -> Result<(), LockError> {
        self.acquire()
    }

    fn unlock(&self) -> Result<(), LockError> {
        self.release()
    }
}

/// Proof of holding a [`DistributedMutex`]. Releases on drop.
pub struct MutexGuard<'a, P: Publisher + 'static, S: Subscriber + 'static> {
    mutex: &'a DistributedMutex<P, S>,
    released: bool,
}

impl<P, S> MutexGuard<'_, P, S>
where
    P: Publisher + 'static,
    S: Subscriber + 'static,
{
    /// Release now, surfacing any error that `Drop` would only log.
    pub fn unlock(mut self) -> Result<(), LockError> {
        self.released = true;
        self.mutex.release()
    }
}

impl<P, S> Drop for MutexGuard<'_, P, S>
where
    P: Publisher + 'static,
    S: Subscriber + 'static,
{
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = self.mutex.release() {
            warn!(participant = %self.mutex.id(), error = %e, "release on drop failed");
        }
    }
}
