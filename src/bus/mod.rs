//! Message bus - the group transport a mutex participant talks through.
//!
//! The mutex core never talks to a broker directly. It needs, per mutex,
//! two topics (requests and acks) that deliver every message to every group
//! member, and a live group size.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │          Channel<T> (per topic, per participant)            │
//! │  - typed publish() / publish_batch() / drain()              │
//! └─────────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │      Publisher + Subscriber + Membership traits             │
//! │  Publisher: publish(msg) / publish_batch(msgs)              │
//! │  Subscriber: poll(timeout) / drain(timeout)                 │
//! │  Membership: group_size()                                   │
//! └─────────────────────────────────────────────────────────────┘
//!          │                                      │
//!          ▼                                      ▼
//! ┌──────────────────────────┐       ┌──────────────────────────┐
//! │ InMemoryBus / Queue      │       │ DDS, NATS, Kafka, ...    │
//! │ (included)               │       │ (external Transport)     │
//! └──────────────────────────┘       └──────────────────────────┘
//! ```
//!
//! A transport must be reliable and retain history: a subscriber sees every
//! message on its topic, including those published before it subscribed.

mod channel;
mod in_memory_bus;
mod in_memory_queue;
mod membership;
mod publisher;
mod subscriber;
mod topic;
mod transport;

pub use channel::Channel;
pub use in_memory_bus::{GroupMembers, InMemoryBus};
pub use in_memory_queue::InMemoryQueue;
pub use membership::{Membership, StaticMembership};
pub use publisher::{Message, PublishError, Publisher};
pub use subscriber::{Subscribable, Subscriber};
pub use topic::Topic;
pub use transport::Transport;
