//! The full collaborator a mutex participant needs from its environment.

use std::sync::Arc;

use super::{Membership, PublishError, Publisher, Subscriber, Topic};
use crate::clock::ProcessId;

/// Source of publishers, subscribers and membership for mutex groups.
///
/// A subscriber obtained here must observe every message published on its
/// topic from then on, plus the retained history before it.
pub trait Transport: Send + Sync {
    type Publisher: Publisher + 'static;
    type Subscriber: Subscriber + 'static;

    fn publisher(&self, topic: &Topic) -> Result<Self::Publisher, PublishError>;

    fn subscriber(&self, topic: &Topic) -> Result<Self::Subscriber, PublishError>;

    /// Register `member` in `group` and return a live view of the group's size.
    ///
    /// Joining twice with the same id is a no-op.
    fn join(&self, group: &str, member: ProcessId) -> Result<Arc<dyn Membership>, PublishError>;
}
