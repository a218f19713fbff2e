//! Message envelope and the publishing half of the bus.

use std::error::Error;
use std::fmt;

/// A message on the bus.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    /// Identifier derived from the payload; retransmissions share it.
    pub id: String,
    /// Topic the message was published on (see [`Topic`](super::Topic)).
    pub topic: String,
    /// bitcode-serialized payload
    pub payload: Vec<u8>,
}

impl Message {
    pub fn new(id: impl Into<String>, topic: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            topic: topic.into(),
            payload,
        }
    }

    /// Create a message with a bitcode-serialized payload.
    pub fn encode<T: serde::Serialize>(
        id: impl Into<String>,
        topic: impl Into<String>,
        payload: &T,
    ) -> Result<Self, PublishError> {
        let bytes = bitcode::serialize(payload)
            .map_err(|e| PublishError::SerializationFailed(e.to_string()))?;
        Ok(Self::new(id, topic, bytes))
    }

    /// Decode the payload from bitcode binary format.
    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> Result<T, PublishError> {
        bitcode::deserialize(&self.payload)
            .map_err(|e| PublishError::DeserializationFailed(format!("{}: {}", self.id, e)))
    }
}

/// Error type for bus operations.
#[derive(Debug)]
pub enum PublishError {
    /// Connection to the bus failed
    ConnectionFailed(String),
    /// Encoding a payload failed
    SerializationFailed(String),
    /// Decoding a payload failed
    DeserializationFailed(String),
    /// The bus rejected the message
    Rejected(String),
    /// A lock inside the bus implementation was poisoned
    Poisoned(String),
    /// Other error
    Other(Box<dyn Error + Send + Sync>),
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishError::ConnectionFailed(msg) => write!(f, "Connection failed: {}", msg),
            PublishError::SerializationFailed(msg) => write!(f, "Serialization failed: {}", msg),
            PublishError::DeserializationFailed(msg) => {
                write!(f, "Deserialization failed: {}", msg)
            }
            PublishError::Rejected(msg) => write!(f, "Message rejected: {}", msg),
            PublishError::Poisoned(msg) => write!(f, "Bus lock poisoned: {}", msg),
            PublishError::Other(e) => write!(f, "Bus error: {}", e),
        }
    }
}

impl Error for PublishError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PublishError::Other(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

/// Fire-and-forget publishing to every member of a topic.
///
/// `Ok` means the bus accepted the message, not that anyone has read it.
pub trait Publisher: Send + Sync {
    /// Publish a single message.
    fn publish(&self, message: Message) -> Result<(), PublishError>;

    /// Publish multiple messages.
    ///
    /// Default implementation publishes messages sequentially.
    /// Implementations may override for batch optimization.
    fn publish_batch(&self, messages: Vec<Message>) -> Result<(), PublishError> {
        for message in messages {
            self.publish(message)?;
        }
        Ok(())
    }
}
