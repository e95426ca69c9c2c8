/**
 * Relay Envelope
 *
 * The wire form of a message placed on the relay queue: the JSON-serialized
 * message itself, marked durable by the queue store. Envelopes are
 * acknowledged individually and are safe to redeliver.
 */
use serde::{Deserialize, Serialize};

use crate::relay::error::RelayError;
use crate::shared::Message;

/// Queue wire form of a [`Message`]
///
/// Serializes transparently as the message JSON, which is exactly what the
/// fan-out consumers rebroadcast.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct RelayEnvelope(pub Message);

impl RelayEnvelope {
    /// Wrap a message for publication
    pub fn new(message: Message) -> Self {
        Self(message)
    }

    /// The enclosed message
    pub fn message(&self) -> &Message {
        &self.0
    }

    /// Unwrap into the enclosed message
    pub fn into_message(self) -> Message {
        self.0
    }

    /// Serialize for the queue
    pub fn to_payload(&self) -> Result<String, RelayError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize a queued payload
    pub fn from_payload(payload: &str) -> Result<Self, RelayError> {
        Ok(serde_json::from_str(payload)?)
    }
}

impl From<Message> for RelayEnvelope {
    fn from(message: Message) -> Self {
        Self(message)
    }
}
