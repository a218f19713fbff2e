//! Lamport logical clocks tagged with the owning participant.
//!
//! A [`LogicalClock`] is totally ordered by `(counter, owner)`: the counter
//! decides first and the owner id breaks ties. That order alone decides which
//! of two competing requests enters the critical section first.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of one participant in a mutex group. Unique within the group.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ProcessId(pub u64);

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Scalar Lamport timestamp owned by one participant.
///
/// Field order matters: the derived `Ord` compares `counter` first and
/// `owner` second, which is the protocol's total order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LogicalClock {
    counter: u64,
    owner: ProcessId,
}

impl LogicalClock {
    /// A fresh clock at counter zero.
    pub const fn new(owner: ProcessId) -> Self {
        Self { counter: 0, owner }
    }

    pub const fn at(counter: u64, owner: ProcessId) -> Self {
        Self { counter, owner }
    }

    pub const fn counter(&self) -> u64 {
        self.counter
    }

    pub const fn owner(&self) -> ProcessId {
        self.owner
    }

    /// Local event: same owner, counter + 1.
    #[must_use]
    pub fn increment(&self) -> Self {
        Self {
            counter: self.counter + 1,
            owner: self.owner,
        }
    }

    /// Observation of peer timestamps: `max(counter, peer_max) + 1`.
    ///
    /// After a merge the clock is strictly greater than every counter it has
    /// observed, which is what keeps ACKs causally after the requests they grant.
    #[must_use]
    pub fn merge(&self, peer_max: u64) -> Self {
        Self {
            counter: self.counter.max(peer_max) + 1,
            owner: self.owner,
        }
    }
}

impl fmt::Display for LogicalClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.counter, self.owner)
    }
}

/// A request slot: either a real clock or `Infinite` ("no active request").
///
/// `Infinite` is declared last so the derived order places it above every
/// real clock. A participant with no request therefore yields to everyone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Timestamp {
    At(LogicalClock),
    #[default]
    Infinite,
}

impl Timestamp {
    pub fn is_infinite(&self) -> bool {
        matches!(self, Timestamp::Infinite)
    }

    pub fn clock(&self) -> Option<LogicalClock> {
        match self {
            Timestamp::At(clock) => Some(*clock),
            Timestamp::Infinite => None,
        }
    }
}

impl From<LogicalClock> for Timestamp {
    fn from(clock: LogicalClock) -> Self {
        Timestamp::At(clock)
    }
}

impl From<Option<LogicalClock>> for Timestamp {
    fn from(clock: Option<LogicalClock>) -> Self {
        clock.map_or(Timestamp::Infinite, Timestamp::At)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::At(clock) => clock.fmt(f),
            Timestamp::Infinite => f.write_str("inf"),
        }
    }
}
