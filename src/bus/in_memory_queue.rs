//! In-memory queue for testing and single-process scenarios.
//!
//! This module provides a thread-safe in-memory queue that implements
//! both `Publisher` and `Subscriber` traits, useful for:
//! - Unit and integration testing without external dependencies
//! - Running several mutex participants inside one process

use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use super::{Message, PublishError, Publisher, Subscribable, Subscriber};

struct Log {
    messages: Mutex<Vec<Message>>,
    appended: Condvar,
}

/// In-memory queue for one topic.
///
/// Features:
/// - Thread-safe (can be shared across threads via `Clone`)
/// - Supports multiple subscribers via `new_subscriber()`
/// - Messages are stored in an append-only log and never dropped, so a late
///   subscriber still reads the full history
/// - Each subscriber tracks its own read position
/// - Readers block on a condition variable and wake as soon as something is appended
///
/// ## Example
///
/// ```
/// use lamport_mutex::bus::{InMemoryQueue, Message, Publisher, Subscribable, Subscriber};
///
/// let queue = InMemoryQueue::new();
/// queue.publish(Message::new("m-1", "g/lock/request", vec![1])).unwrap();
///
/// // Each subscriber has its own position
/// let sub1 = queue.new_subscriber();
/// let sub2 = queue.new_subscriber();
/// assert_eq!(sub1.poll(10).unwrap().unwrap().id, "m-1");
/// assert_eq!(sub2.drain(10).unwrap().len(), 1);
/// ```
#[derive(Clone)]
pub struct InMemoryQueue {
    log: Arc<Log>,
    /// Per-subscriber read position
    position: Arc<Mutex<usize>>,
}

impl Default for InMemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self {
            log: Arc::new(Log {
                messages: Mutex::new(Vec::new()),
                appended: Condvar::new(),
            }),
            position: Arc::new(Mutex::new(0)),
        }
    }

    /// Get all messages in the log.
    pub fn messages(&self) -> Result<Vec<Message>, PublishError> {
        Ok(self.lock_log()?.clone())
    }

    /// Get the total number of messages in the log.
    pub fn len(&self) -> usize {
        self.lock_log().map(|log| log.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the current subscriber position.
    pub fn current_position(&self) -> usize {
        self.position.lock().map(|pos| *pos).unwrap_or(0)
    }

    fn lock_log(&self) -> Result<std::sync::MutexGuard<'_, Vec<Message>>, PublishError> {
        self.log
            .messages
            .lock()
            .map_err(|e| PublishError::Poisoned(e.to_string()))
    }

    /// Wait until the log holds something past our position, then take up to
    /// `max` messages from it.
    fn take(&self, timeout_ms: u64, max: usize) -> Result<Vec<Message>, PublishError> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        let mut log = self.lock_log()?;
        let mut pos = self
            .position
            .lock()
            .map_err(|e| PublishError::Poisoned(e.to_string()))?;

        while *pos >= log.len() {
            let now = Instant::now();
            if now >= deadline {
                return Ok(Vec::new());
            }
            log = self
                .log
                .appended
                .wait_timeout(log, deadline - now)
                .map_err(|e| PublishError::Poisoned(e.to_string()))?
                .0;
        }

        let end = log.len().min(pos.saturating_add(max));
        let batch = log[*pos..end].to_vec();
        *pos = end;
        Ok(batch)
    }
}

impl Publisher for InMemoryQueue {
    fn publish(&self, message: Message) -> Result<(), PublishError> {
        self.lock_log()?.push(message);
        self.log.appended.notify_all();
        Ok(())
    }

    fn publish_batch(&self, messages: Vec<Message>) -> Result<(), PublishError> {
        if messages.is_empty() {
            return Ok(());
        }
        self.lock_log()?.extend(messages);
        self.log.appended.notify_all();
        Ok(())
    }
}

impl Subscriber for InMemoryQueue {
    fn poll(&self, timeout_ms: u64) -> Result<Option<Message>, PublishError> {
        Ok(self.take(timeout_ms, 1)?.pop())
    }

    fn drain(&self, timeout_ms: u64) -> Result<Vec<Message>, PublishError> {
        self.take(timeout_ms, usize::MAX)
    }
}

impl Subscribable for InMemoryQueue {
    fn new_subscriber(&self) -> Self {
        Self {
            log: Arc::clone(&self.log),
            position: Arc::new(Mutex::new(0)),
        }
    }
}
