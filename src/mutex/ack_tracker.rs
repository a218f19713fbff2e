//! Counts ACKs for the in-flight request and hands the grant to the waiting caller.

use std::collections::BTreeSet;
use std::sync::{Condvar, Mutex, MutexGuard};

use crate::clock::{LogicalClock, ProcessId};
use crate::config::QuorumRule;
use crate::lock::LockError;
use crate::protocol::Ack;

#[derive(Debug, Default)]
struct Round {
    /// Request being acknowledged. `None` between rounds.
    request: Option<LogicalClock>,
    acked: BTreeSet<ProcessId>,
    /// Quorum reached and not yet consumed by `wait`.
    granted: bool,
}

/// One round per acquire: `arm`, any number of `record`s, one `wait`.
///
/// Only distinct senders count, and only ACKs stamped after the armed
/// request. Every real grant for request `r` carries a counter above
/// `r.counter` because the granter merged `r` first, so duplicates and
/// leftovers from an earlier round cannot leak into this one. The
/// check-reset-signal step runs under a single lock, so two racing batches
/// cannot both complete a round.
#[derive(Debug)]
pub struct AckTracker {
    round: Mutex<Round>,
    quorum_reached: Condvar,
    rule: QuorumRule,
}

impl AckTracker {
    pub fn new(rule: QuorumRule) -> Self {
        Self {
            round: Mutex::new(Round::default()),
            quorum_reached: Condvar::new(),
            rule,
        }
    }

    fn lock_round(&self) -> Result<MutexGuard<'_, Round>, LockError> {
        self.round
            .lock()
            .map_err(|e| LockError::Poisoned(e.to_string()))
    }

    /// Start counting for `request`. With nobody to hear from, grants at once.
    pub fn arm(&self, request: LogicalClock, needed: usize) -> Result<(), LockError> {
        let mut round = self.lock_round()?;
        round.acked.clear();
        if needed == 0 {
            round.request = None;
            round.granted = true;
            self.quorum_reached.notify_all();
        } else {
            round.request = Some(request);
            round.granted = false;
        }
        Ok(())
    }

    /// Abandon the current round without granting.
    pub fn disarm(&self) -> Result<(), LockError> {
        *self.lock_round()? = Round::default();
        Ok(())
    }

    /// Count `acks` (already filtered to this participant) against the armed
    /// request. Returns true if this batch completed the round.
    pub fn record(&self, acks: &[Ack], needed: usize) -> Result<bool, LockError> {
        let mut round = self.lock_round()?;
        let Some(request) = round.request else {
            return Ok(false);
        };

        for ack in acks {
            if ack.timestamp.counter() > request.counter() {
                round.acked.insert(ack.sender());
            }
        }

        if !self.rule.is_met(round.acked.len(), needed) {
            return Ok(false);
        }

        round.request = None;
        round.acked.clear();
        round.granted = true;
        self.quorum_reached.notify_all();
        Ok(true)
    }

    /// Block until the armed round is granted, then consume the grant.
    pub fn wait(&self) -> Result<(), LockError> {
        let mut round = self.lock_round()?;
        while !round.granted {
            round = self
                .quorum_reached
                .wait(round)
                .map_err(|e| LockError::Poisoned(e.to_string()))?;
        }
        round.granted = false;
        Ok(())
    }

    /// Distinct peers that have acknowledged the armed request so far.
    pub fn ack_count(&self) -> Result<usize, LockError> {
        Ok(self.lock_round()?.acked.len())
    }

    pub fn is_armed(&self) -> Result<bool, LockError> {
        Ok(self.lock_round()?.request.is_some())
    }
}
