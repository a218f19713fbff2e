//! Core subscriber traits for the bus.

use super::publisher::{Message, PublishError};

/// Pull-based reading from a topic.
///
/// Every subscriber sees every message published on its topic, in publish order.
pub trait Subscriber: Send + Sync {
    /// Poll for the next message, blocking until one is available or timeout.
    fn poll(&self, timeout_ms: u64) -> Result<Option<Message>, PublishError>;

    /// Block until at least one message is available (or the timeout elapses),
    /// then take everything currently available.
    ///
    /// Returns an empty batch on timeout. The default implementation waits on
    /// `poll` once and then drains with zero-timeout polls.
    fn drain(&self, timeout_ms: u64) -> Result<Vec<Message>, PublishError> {
        let mut batch = Vec::new();
        if let Some(first) = self.poll(timeout_ms)? {
            batch.push(first);
            while let Some(next) = self.poll(0)? {
                batch.push(next);
            }
        }
        Ok(batch)
    }
}

/// Trait for subscribers that can create independent subscriber instances.
pub trait Subscribable: Subscriber + Sized {
    /// Create a new independent subscriber sharing the same message source.
    ///
    /// The new subscriber has its own read position, starting at the beginning
    /// of the retained history.
    fn new_subscriber(&self) -> Self;
}
