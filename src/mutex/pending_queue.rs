//! Requests this participant has deferred until its own release.

use std::collections::{BTreeSet, HashSet};

use crate::clock::ProcessId;
use crate::protocol::Request;

/// Deferred requests in clock order, at most one per requester.
#[derive(Debug, Default)]
pub struct PendingQueue {
    requests: BTreeSet<Request>,
    requesters: HashSet<ProcessId>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `request` unless its requester already has an entry.
    ///
    /// Returns whether it was queued. A retransmitted request is absorbed here.
    pub fn insert(&mut self, request: Request) -> bool {
        if !self.requesters.insert(request.requester()) {
            return false;
        }
        self.requests.insert(request);
        true
    }

    pub fn contains(&self, requester: ProcessId) -> bool {
        self.requesters.contains(&requester)
    }

    /// Empty the queue, returning its contents oldest first.
    pub fn drain(&mut self) -> Vec<Request> {
        self.requesters.clear();
        std::mem::take(&mut self.requests).into_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}
