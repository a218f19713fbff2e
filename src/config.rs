//! Participant configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How the ACK count is compared against `group_size - 1`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuorumRule {
    /// Grant when the number of distinct acknowledging peers equals `group_size - 1`.
    #[default]
    Exact,
    /// Grant once it reaches `group_size - 1`. Tolerates the group shrinking mid-round.
    AtLeast,
}

impl QuorumRule {
    pub fn is_met(self, acked: usize, needed: usize) -> bool {
        match self {
            QuorumRule::Exact => acked == needed,
            QuorumRule::AtLeast => acked >= needed,
        }
    }
}

/// Settings for one [`DistributedMutex`](crate::DistributedMutex).
///
/// ## Example
///
/// ```
/// use lamport_mutex::{MutexConfig, QuorumRule};
///
/// let config = MutexConfig::from_json(r#"{"poll_interval_ms": 5, "quorum": "at_least"}"#).unwrap();
/// assert_eq!(config.poll_interval_ms, 5);
/// assert_eq!(config.quorum, QuorumRule::AtLeast);
/// assert_eq!(config.thread_name_prefix, "lamport-mutex");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MutexConfig {
    /// Upper bound on how long a reactor waits for new messages before
    /// re-checking its stop signal. Values below 1 ms are raised to 1 ms.
    pub poll_interval_ms: u64,
    pub quorum: QuorumRule,
    /// Reactor threads are named `{prefix}-{participant}-{channel}`.
    pub thread_name_prefix: String,
}

impl Default for MutexConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 10,
            quorum: QuorumRule::Exact,
            thread_name_prefix: "lamport-mutex".to_string(),
        }
    }
}

impl MutexConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis().max(1) as u64;
        self
    }

    pub fn with_quorum(mut self, quorum: QuorumRule) -> Self {
        self.quorum = quorum;
        self
    }

    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}
