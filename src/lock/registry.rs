use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::debug;

use super::{Lock, LockError};
use crate::bus::Transport;
use crate::clock::ProcessId;
use crate::config::MutexConfig;
use crate::mutex::DistributedMutex;

/// Factory trait for obtaining named locks within a group.
///
/// Repeated calls with the same `(group, id)` must return the same logical
/// lock (i.e. the same `Arc`).
pub trait LockManager: Send + Sync {
    /// The concrete lock type returned by this manager.
    type Lock: Lock;

    /// Get (or create) the lock named `id` in `group`.
    fn get_lock(&self, group: &str, id: &str) -> Result<Arc<Self::Lock>, LockError>;
}

type Participant<T> =
    DistributedMutex<<T as Transport>::Publisher, <T as Transport>::Subscriber>;

/// One participant's set of distributed mutexes.
///
/// Owns the transport handle and lazily starts one [`DistributedMutex`]
/// per `(group, mutex)` pair, joining the group on first use. Whoever
/// builds mutexes holds the registry; there is no process-wide table.
///
/// ## Example
///
/// ```
/// use lamport_mutex::bus::InMemoryBus;
/// use lamport_mutex::{MutexConfig, MutexRegistry, ProcessId};
/// use std::sync::Arc;
///
/// let registry = MutexRegistry::new(InMemoryBus::new(), ProcessId(1), MutexConfig::default());
/// let a = registry.get("g", "jobs").unwrap();
/// let b = registry.get("g", "jobs").unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
/// ```
pub struct MutexRegistry<T: Transport> {
    transport: T,
    id: ProcessId,
    config: MutexConfig,
    mutexes: Mutex<HashMap<(String, String), Arc<Participant<T>>>>,
}

impl<T: Transport> MutexRegistry<T> {
    pub fn new(transport: T, id: ProcessId, config: MutexConfig) -> Self {
        MutexRegistry {
            transport,
            id,
            config,
            mutexes: Mutex::new(HashMap::new()),
        }
    }

    pub fn id(&self) -> ProcessId {
        self.id
    }

    /// The participant for `mutex` in `group`, started on first request.
    pub fn get(&self, group: &str, mutex: &str) -> Result<Arc<Participant<T>>, LockError> {
        let mut mutexes = self
            .mutexes
            .lock()
            .map_err(|_| LockError::Poisoned("mutex registry map poisoned".into()))?;

        let key = (group.to_string(), mutex.to_string());
        if let Some(existing) = mutexes.get(&key) {
            return Ok(Arc::clone(existing));
        }

        let participant = Arc::new(DistributedMutex::connect(
            &self.transport,
            group,
            mutex,
            self.id,
            &self.config,
        )?);
        debug!(participant = %self.id, group, mutex, "registered mutex");
        mutexes.insert(key, Arc::clone(&participant));
        Ok(participant)
    }

    /// Number of mutexes started so far.
    pub fn len(&self) -> usize {
        self.mutexes.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Transport> LockManager for MutexRegistry<T> {
    type Lock = Participant<T>;

    fn get_lock(&self, group: &str, id: &str) -> Result<Arc<Self::Lock>, LockError> {
        self.get(group, id)
    }
}
