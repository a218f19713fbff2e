//! Per-participant protocol state.
//!
//! Everything here is plain data mutated under the participant's state lock.
//! The methods compute which ACKs must go out but never publish them, so the
//! lock is never held across bus I/O.

use std::fmt;

use tracing::trace;

use super::pending_queue::PendingQueue;
use crate::clock::{LogicalClock, ProcessId, Timestamp};
use crate::lock::LockError;
use crate::protocol::{Ack, Request};

/// Where a participant is in its acquire/release cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Idle,
    Requesting,
    Holding,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Idle => "idle",
            Phase::Requesting => "requesting",
            Phase::Holding => "holding",
        })
    }
}

/// Clock, own request and deferred requests of one participant.
///
/// `clock` and `pending` live across cycles; `own_request` is set by
/// [`begin_request`](Self::begin_request) and cleared by
/// [`release`](Self::release) exactly once per cycle. `unsent` holds ACKs
/// the bus refused; they are already stamped and go out unchanged on retry.
#[derive(Debug)]
pub struct ParticipantState {
    id: ProcessId,
    clock: LogicalClock,
    own_request: Timestamp,
    phase: Phase,
    pending: PendingQueue,
    unsent: Vec<Ack>,
}

impl ParticipantState {
    pub fn new(id: ProcessId) -> Self {
        Self {
            id,
            clock: LogicalClock::new(id),
            own_request: Timestamp::Infinite,
            phase: Phase::Idle,
            pending: PendingQueue::new(),
            unsent: Vec::new(),
        }
    }

    pub fn clock(&self) -> LogicalClock {
        self.clock
    }

    pub fn own_request(&self) -> Timestamp {
        self.own_request
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn pending(&self) -> &PendingQueue {
        &self.pending
    }

    pub fn unsent(&self) -> &[Ack] {
        &self.unsent
    }

    /// Keep ACKs that could not be published, for a later retry.
    pub fn keep_unsent(&mut self, acks: Vec<Ack>) {
        self.unsent.extend(acks);
    }

    /// Take every ACK still waiting to be published.
    pub fn take_unsent(&mut self) -> Vec<Ack> {
        std::mem::take(&mut self.unsent)
    }

    fn expect_phase(&self, expected: Phase, operation: &'static str) -> Result<(), LockError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(LockError::InvalidPhase {
                operation,
                phase: self.phase,
            })
        }
    }

    /// IDLE -> REQUESTING: stamp a new request and make it our own.
    pub fn begin_request(&mut self) -> Result<Request, LockError> {
        self.expect_phase(Phase::Idle, "acquire")?;
        self.clock = self.clock.increment();
        self.own_request = Timestamp::At(self.clock);
        self.phase = Phase::Requesting;
        Ok(Request(self.clock))
    }

    /// REQUESTING -> HOLDING, once quorum has been granted.
    pub fn enter(&mut self) -> Result<(), LockError> {
        self.expect_phase(Phase::Requesting, "enter")?;
        self.phase = Phase::Holding;
        Ok(())
    }

    /// HOLDING -> IDLE. Returns the ACKs owed to everyone we made wait.
    pub fn release(&mut self) -> Result<Vec<Ack>, LockError> {
        self.expect_phase(Phase::Holding, "release")?;
        Ok(self.withdraw())
    }

    /// Back to IDLE from any phase, paying every deferred requester.
    ///
    /// The drain happens under the same lock the request reactor enqueues
    /// under, so a request is either paid here or sees `Infinite` and is
    /// granted immediately.
    pub fn withdraw(&mut self) -> Vec<Ack> {
        self.own_request = Timestamp::Infinite;
        self.phase = Phase::Idle;
        self.pending
            .drain()
            .into_iter()
            .map(|request| {
                self.clock = self.clock.increment();
                Ack::new(request.requester(), self.clock)
            })
            .collect()
    }

    /// Request reactor: merge the batch into the clock, then grant or defer
    /// each request against our own.
    ///
    /// Echoes of our own requests are dropped. The clock advances once for
    /// the batch (using its largest counter) and once more per immediate grant.
    pub fn react_to_requests(&mut self, batch: &[Request]) -> Vec<Ack> {
        let peers: Vec<Request> = batch
            .iter()
            .copied()
            .filter(|r| r.requester() != self.id)
            .collect();
        let Some(peer_max) = peers.iter().map(|r| r.clock().counter()).max() else {
            return Vec::new();
        };
        self.clock = self.clock.merge(peer_max);

        let mut grants = Vec::new();
        for request in peers {
            if Timestamp::At(request.clock()) < self.own_request {
                self.clock = self.clock.increment();
                grants.push(Ack::new(request.requester(), self.clock));
            } else if self.pending.insert(request) {
                trace!(participant = %self.id, request = %request.clock(), own = %self.own_request, "deferred");
            }
        }
        grants
    }

    /// Ack reactor, clock half: keep the ACKs addressed to us and merge them
    /// into the clock. Counting is left to the tracker.
    pub fn observe_acks(&mut self, batch: &[Ack]) -> Vec<Ack> {
        let mine: Vec<Ack> = batch.iter().copied().filter(|a| a.is_for(self.id)).collect();
        if let Some(peer_max) = mine.iter().map(|a| a.timestamp.counter()).max() {
            self.clock = self.clock.merge(peer_max);
        }
        mine
    }
}
