//! Background thread that drains one channel and feeds a reactor.

use std::sync::mpsc::{channel, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{trace, warn};

use crate::bus::PublishError;
use crate::lock::LockError;

/// Statistics from a reactor thread.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReactorStats {
    /// Non-empty batches handed to the reactor.
    pub batches: usize,
    /// Payloads across those batches.
    pub messages: usize,
    /// Drain, reaction or tick failures.
    pub failures: usize,
    /// Number of poll cycles completed.
    pub polls: usize,
}

impl std::ops::Add for ReactorStats {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            batches: self.batches + other.batches,
            messages: self.messages + other.messages,
            failures: self.failures + other.failures,
            polls: self.polls + other.polls,
        }
    }
}

/// Reaction to one channel's traffic.
pub(crate) trait Reactor: Send + 'static {
    type Payload;

    /// Wait up to `timeout_ms` for a batch. Empty on timeout.
    fn drain(&self, timeout_ms: u64) -> Result<Vec<Self::Payload>, PublishError>;

    fn react(&self, batch: Vec<Self::Payload>) -> Result<(), LockError>;

    /// Runs once per poll cycle, after any batch has been handled.
    fn tick(&self) -> Result<(), LockError> {
        Ok(())
    }
}

/// A background thread that waits for batches on one channel and hands
/// each to its reactor.
///
/// Dropping the handle signals the thread; `stop` also joins it.
pub struct ReactorThread {
    stop_tx: Sender<()>,
    handle: Option<JoinHandle<ReactorStats>>,
}

impl ReactorThread {
    pub(crate) fn spawn<R: Reactor>(
        name: String,
        reactor: R,
        poll_interval: Duration,
    ) -> Result<Self, LockError> {
        let (stop_tx, stop_rx) = channel();
        let poll_interval = poll_interval.max(Duration::from_millis(1));
        let timeout_ms = poll_interval.as_millis() as u64;

        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                let mut stats = ReactorStats::default();

                loop {
                    match stop_rx.try_recv() {
                        Ok(()) | Err(TryRecvError::Disconnected) => break,
                        Err(TryRecvError::Empty) => {}
                    }

                    stats.polls += 1;

                    match reactor.drain(timeout_ms) {
                        Ok(batch) if batch.is_empty() => {}
                        Ok(batch) => {
                            stats.batches += 1;
                            stats.messages += batch.len();
                            if let Err(e) = reactor.react(batch) {
                                stats.failures += 1;
                                warn!(reactor = %name, error = %e, "reaction failed");
                            }
                        }
                        Err(e) => {
                            stats.failures += 1;
                            warn!(reactor = %name, error = %e, "drain failed");
                            thread::sleep(poll_interval);
                        }
                    }

                    if let Err(e) = reactor.tick() {
                        stats.failures += 1;
                        warn!(reactor = %name, error = %e, "tick failed");
                    }
                }

                trace!(reactor = %name, ?stats, "reactor stopped");
                stats
            })
            .map_err(|e| LockError::Spawn(e.to_string()))?;

        Ok(Self {
            stop_tx,
            handle: Some(handle),
        })
    }

    /// Signal the thread to stop and wait for it to finish.
    /// Returns the reactor statistics.
    pub fn stop(mut self) -> ReactorStats {
        let _ = self.stop_tx.send(());
        if let Some(handle) = self.handle.take() {
            handle.join().unwrap_or_default()
        } else {
            ReactorStats::default()
        }
    }
}

impl Drop for ReactorThread {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(());
        // Don't join on drop - the thread exits within one poll interval
    }
}
