use std::fmt;

use crate::bus::PublishError;
use crate::mutex::Phase;

/// Error type for lock operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockError {
    /// The underlying lock primitive was poisoned (e.g. a thread panicked while holding it).
    Poisoned(String),
    /// `acquire` outside IDLE, `release` outside HOLDING, and the like.
    InvalidPhase {
        operation: &'static str,
        phase: Phase,
    },
    /// The bus refused a request or ack.
    Transport(String),
    /// A reactor thread could not be started.
    Spawn(String),
    /// Any other lock error.
    Other(String),
}

impl fmt::Display for LockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockError::Poisoned(msg) => write!(f, "lock poisoned: {}", msg),
            LockError::InvalidPhase { operation, phase } => {
                write!(f, "cannot {} while {}", operation, phase)
            }
            LockError::Transport(msg) => write!(f, "lock transport failed: {}", msg),
            LockError::Spawn(msg) => write!(f, "lock reactor failed to start: {}", msg),
            LockError::Other(msg) => write!(f, "lock error: {}", msg),
        }
    }
}

impl std::error::Error for LockError {}

impl From<PublishError> for LockError {
    fn from(e: PublishError) -> Self {
        LockError::Transport(e.to_string())
    }
}
