//! The two inbound-message reactors.

use std::sync::Arc;

use tracing::{debug, trace};

use super::thread::Reactor;
use super::Core;
use crate::bus::{PublishError, Publisher, Subscriber};
use crate::lock::LockError;
use crate::protocol::{Ack, Request};

/// Grants or defers inbound REQUESTs.
pub(crate) struct RequestReactor<P: Publisher, S: Subscriber> {
    core: Arc<Core<P, S>>,
}

impl<P: Publisher, S: Subscriber> RequestReactor<P, S> {
    pub(crate) fn new(core: Arc<Core<P, S>>) -> Self {
        Self { core }
    }
}

impl<P, S> Reactor for RequestReactor<P, S>
where
    P: Publisher + 'static,
    S: Subscriber + 'static,
{
    type Payload = Request;

    fn drain(&self, timeout_ms: u64) -> Result<Vec<Request>, PublishError> {
        self.core.requests.drain(timeout_ms)
    }

    fn react(&self, batch: Vec<Request>) -> Result<(), LockError> {
        let granted = self.core.answer_requests(&batch)?;
        trace!(
            participant = %self.core.id,
            received = batch.len(),
            granted,
            "request batch"
        );
        Ok(())
    }

    /// Re-send ACKs the bus refused earlier.
    fn tick(&self) -> Result<(), LockError> {
        self.core.retry_unsent()
    }
}

/// Counts inbound ACKs and wakes the caller blocked in `acquire` at quorum.
pub(crate) struct AckReactor<P: Publisher, S: Subscriber> {
    core: Arc<Core<P, S>>,
}

impl<P: Publisher, S: Subscriber> AckReactor<P, S> {
    pub(crate) fn new(core: Arc<Core<P, S>>) -> Self {
        Self { core }
    }
}

impl<P, S> Reactor for AckReactor<P, S>
where
    P: Publisher + 'static,
    S: Subscriber + 'static,
{
    type Payload = Ack;

    fn drain(&self, timeout_ms: u64) -> Result<Vec<Ack>, PublishError> {
        self.core.acks.drain(timeout_ms)
    }

    fn react(&self, batch: Vec<Ack>) -> Result<(), LockError> {
        let mine = self.core.lock_state()?.observe_acks(&batch);
        if mine.is_empty() {
            return Ok(());
        }

        let needed = self.core.quorum_size()?;
        if self.core.tracker.record(&mine, needed)? {
            debug!(participant = %self.core.id, needed, "quorum reached");
        } else {
            let acked = self.core.tracker.ack_count()?;
            trace!(participant = %self.core.id, acked, needed, "ack batch");
        }
        Ok(())
    }
}
