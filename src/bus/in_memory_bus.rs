//! In-process bus: one `InMemoryQueue` per topic plus member sets per group.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use super::{InMemoryQueue, Membership, PublishError, Subscribable, Topic, Transport};
use crate::clock::ProcessId;

/// Members of one group, shared by every participant's membership view.
#[derive(Clone, Default)]
pub struct GroupMembers(Arc<Mutex<BTreeSet<ProcessId>>>);

impl GroupMembers {
    pub fn members(&self) -> Result<Vec<ProcessId>, PublishError> {
        Ok(self
            .0
            .lock()
            .map_err(|e| PublishError::Poisoned(e.to_string()))?
            .iter()
            .copied()
            .collect())
    }

    fn insert(&self, id: ProcessId) -> Result<bool, PublishError> {
        Ok(self
            .0
            .lock()
            .map_err(|e| PublishError::Poisoned(e.to_string()))?
            .insert(id))
    }

    fn remove(&self, id: ProcessId) -> Result<bool, PublishError> {
        Ok(self
            .0
            .lock()
            .map_err(|e| PublishError::Poisoned(e.to_string()))?
            .remove(&id))
    }
}

impl Membership for GroupMembers {
    fn group_size(&self) -> Result<usize, PublishError> {
        Ok(self
            .0
            .lock()
            .map_err(|e| PublishError::Poisoned(e.to_string()))?
            .len())
    }
}

#[derive(Default)]
struct Registry {
    topics: HashMap<Topic, InMemoryQueue>,
    groups: HashMap<String, GroupMembers>,
}

/// In-process implementation of [`Transport`].
///
/// Cloning gives another handle to the same topics and groups, so every
/// participant in a test can hold its own handle. Topics and groups are
/// created lazily on first use and live as long as any handle does.
///
/// ## Example
///
/// ```
/// use lamport_mutex::bus::{InMemoryBus, Membership, Transport};
/// use lamport_mutex::ProcessId;
///
/// let bus = InMemoryBus::new();
/// bus.join("g", ProcessId(1)).unwrap();
/// let view = bus.join("g", ProcessId(2)).unwrap();
/// assert_eq!(view.group_size().unwrap(), 2);
/// ```
#[derive(Clone, Default)]
pub struct InMemoryBus {
    registry: Arc<Mutex<Registry>>,
}

impl InMemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// The queue backing `topic`, created if needed.
    pub fn queue(&self, topic: &Topic) -> Result<InMemoryQueue, PublishError> {
        let mut registry = self
            .registry
            .lock()
            .map_err(|_| PublishError::Poisoned("bus registry poisoned".into()))?;
        Ok(registry
            .topics
            .entry(topic.clone())
            .or_insert_with(InMemoryQueue::new)
            .clone())
    }

    pub fn group(&self, group: &str) -> Result<GroupMembers, PublishError> {
        let mut registry = self
            .registry
            .lock()
            .map_err(|_| PublishError::Poisoned("bus registry poisoned".into()))?;
        Ok(registry
            .groups
            .entry(group.to_string())
            .or_default()
            .clone())
    }

    /// Remove `member` from `group`. Returns whether it was a member.
    pub fn leave(&self, group: &str, member: ProcessId) -> Result<bool, PublishError> {
        self.group(group)?.remove(member)
    }
}

impl Transport for InMemoryBus {
    type Publisher = InMemoryQueue;
    type Subscriber = InMemoryQueue;

    fn publisher(&self, topic: &Topic) -> Result<InMemoryQueue, PublishError> {
        self.queue(topic)
    }

    fn subscriber(&self, topic: &Topic) -> Result<InMemoryQueue, PublishError> {
        Ok(self.queue(topic)?.new_subscriber())
    }

    fn join(&self, group: &str, member: ProcessId) -> Result<Arc<dyn Membership>, PublishError> {
        let members = self.group(group)?;
        members.insert(member)?;
        Ok(Arc::new(members))
    }
}
