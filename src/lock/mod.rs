//! Lock abstractions and the per-participant mutex registry.
//!
//! - `Lock` - blocking lock / unlock, implemented by `DistributedMutex`
//! - `LockManager` - named locks within a group, implemented by `MutexRegistry`
//! - `LockError` - everything those can fail with

mod error;
mod lock;
mod registry;

pub use error::LockError;
pub use lock::Lock;
pub use registry::{LockManager, MutexRegistry};
