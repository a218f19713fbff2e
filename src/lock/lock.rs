use super::LockError;

/// Trait for a single lock instance.
///
/// Implemented by [`DistributedMutex`](crate::DistributedMutex); code that only
/// needs "lock, do work, unlock" can stay generic over it.
pub trait Lock: Send + Sync {
    /// Acquire the lock, blocking until it becomes available.
    fn lock(&self) -> Result<(), LockError>;

    /// Release the lock.
    fn unlock(&self) -> Result<(), LockError>;
}
