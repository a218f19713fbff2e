//! Partition keys for bus traffic.

use std::fmt;

/// Where a message travels: one channel of one mutex within one group.
///
/// Distinct topics never share a log, so independent mutex groups (and
/// independent mutexes within a group) never see each other's traffic.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Topic {
    pub group: String,
    pub mutex: String,
    pub channel: String,
}

impl Topic {
    pub fn new(
        group: impl Into<String>,
        mutex: impl Into<String>,
        channel: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            mutex: mutex.into(),
            channel: channel.into(),
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.group, self.mutex, self.channel)
    }
}
