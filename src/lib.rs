//! Distributed mutual exclusion for a group of processes with no lock server.
//!
//! Participants exchange REQUEST and ACK messages over a reliable group
//! [`bus`] and order competing requests by Lamport clock. Releasing the lock
//! sends nothing but the ACKs that were deferred while holding it.

pub mod bus;
mod clock;
mod config;
pub mod lock;
pub mod mutex;
mod protocol;

pub use clock::{LogicalClock, ProcessId, Timestamp};
pub use config::{MutexConfig, QuorumRule};
pub use lock::{Lock, LockError, LockManager, MutexRegistry};
pub use mutex::{DistributedMutex, MutexGuard, Phase, ReactorStats};
pub use protocol::{Ack, Request, ACK_CHANNEL, REQUEST_CHANNEL};
