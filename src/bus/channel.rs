//! Typed channel - wraps a publisher and subscriber for one topic.

use std::fmt::Display;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use super::{Message, PublishError, Publisher, Subscriber, Topic};

/// Typed channel over one topic.
///
/// Payloads are bitcode-encoded into [`Message`]s on publish and decoded on
/// drain. The message id is the payload's `Display` form, so a retransmitted
/// payload keeps its id.
///
/// ## Example
///
/// ```ignore
/// let requests: Channel<Request, _, _> = Channel::new(topic, publisher, subscriber);
/// requests.publish(&Request(clock))?;
/// for request in requests.drain(10)? {
///     // react
/// }
/// ```
pub struct Channel<T, P: Publisher, S: Subscriber> {
    topic: Topic,
    publisher: P,
    subscriber: S,
    _payload: PhantomData<fn() -> T>,
}

impl<T, P, S> Channel<T, P, S>
where
    T: Serialize + DeserializeOwned + Display,
    P: Publisher,
    S: Subscriber,
{
    pub fn new(topic: Topic, publisher: P, subscriber: S) -> Self {
        Self {
            topic,
            publisher,
            subscriber,
            _payload: PhantomData,
        }
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    fn envelope(&self, payload: &T) -> Result<Message, PublishError> {
        Message::encode(payload.to_string(), self.topic.to_string(), payload)
    }

    pub fn publish(&self, payload: &T) -> Result<(), PublishError> {
        self.publisher.publish(self.envelope(payload)?)
    }

    pub fn publish_batch(&self, payloads: &[T]) -> Result<(), PublishError> {
        let messages = payloads
            .iter()
            .map(|p| self.envelope(p))
            .collect::<Result<Vec<_>, _>>()?;
        self.publisher.publish_batch(messages)
    }

    /// Wait up to `timeout_ms` for traffic, then decode everything available.
    ///
    /// Messages that fail to decode are logged and skipped.
    pub fn drain(&self, timeout_ms: u64) -> Result<Vec<T>, PublishError> {
        let batch = self.subscriber.drain(timeout_ms)?;
        Ok(batch
            .into_iter()
            .filter_map(|message| match message.decode::<T>() {
                Ok(payload) => Some(payload),
                Err(e) => {
                    warn!(topic = %self.topic, error = %e, "dropping undecodable message");
                    None
                }
            })
            .collect())
    }
}
