//! Group membership as seen by a participant.

use std::sync::atomic::{AtomicUsize, Ordering};

use super::PublishError;

/// Live view of how many participants a group has.
///
/// Read on every quorum check, so an implementation should be cheap.
pub trait Membership: Send + Sync {
    fn group_size(&self) -> Result<usize, PublishError>;
}

/// A membership whose size is set by hand. Useful when the group is known up front.
#[derive(Debug)]
pub struct StaticMembership(AtomicUsize);

impl StaticMembership {
    pub fn new(size: usize) -> Self {
        Self(AtomicUsize::new(size))
    }

    pub fn set(&self, size: usize) {
        self.0.store(size, Ordering::SeqCst);
    }
}

impl Membership for StaticMembership {
    fn group_size(&self) -> Result<usize, PublishError> {
        Ok(self.0.load(Ordering::SeqCst))
    }
}
