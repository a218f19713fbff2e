//! Payloads carried on the two per-mutex channels.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::clock::{LogicalClock, ProcessId};

/// Channel carrying [`Request`] payloads.
pub const REQUEST_CHANNEL: &str = "request";
/// Channel carrying [`Ack`] payloads.
pub const ACK_CHANNEL: &str = "ack";

/// A participant's bid for the critical section. The clock's owner is the requester.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Request(pub LogicalClock);

impl Request {
    pub fn clock(&self) -> LogicalClock {
        self.0
    }

    pub fn requester(&self) -> ProcessId {
        self.0.owner()
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request({})", self.0)
    }
}

/// A point-to-point grant. Broadcast like everything else, but only `target` consumes it.
///
/// `timestamp` is the sender's clock at the moment of granting, so its owner
/// identifies who granted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ack {
    pub target: ProcessId,
    pub timestamp: LogicalClock,
}

impl Ack {
    pub fn new(target: ProcessId, timestamp: LogicalClock) -> Self {
        Self { target, timestamp }
    }

    pub fn sender(&self) -> ProcessId {
        self.timestamp.owner()
    }

    pub fn is_for(&self, id: ProcessId) -> bool {
        self.target == id
    }
}

impl fmt::Display for Ack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ack({}->{})", self.timestamp, self.target)
    }
}
