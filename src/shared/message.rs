/**
 * Message Data Structure
 *
 * This module defines the Message struct used for chat messages and their
 * serialization for WebSocket broadcasts, the history endpoint and the
 * relay queue.
 *
 * The Message struct is shared between all three services: the gateway
 * creates and persists it, the worker relays it, and the notification
 * service broadcasts it to every open connection.
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::SharedError;

/// Represents a single chat message
///
/// A message is created by the gateway on a validated send intent and is
/// immutable after creation. It is persisted exactly once per accepted
/// send, then broadcast to the room and published onto the relay queue.
///
/// # Fields
/// * `sender` - Username of the sending identity
/// * `content` - The message text, trimmed and non-empty
/// * `room` - The room this message belongs to
/// * `timestamp` - Creation time (UTC)
///
/// # Example
/// ```rust
/// use relaychat::shared::Message;
///
/// let message = Message::new("alice", "Hello, world!", "general").unwrap();
/// assert_eq!(message.content, "Hello, world!");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// Username of the sender
    pub sender: String,
    /// The message text content (trimmed, never empty)
    pub content: String,
    /// Room the message was sent to
    pub room: String,
    /// Creation time (UTC)
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a new message with the current timestamp
    ///
    /// Content is trimmed before storage; empty or whitespace-only content
    /// is rejected.
    ///
    /// # Arguments
    /// * `sender` - Username of the sending identity
    /// * `content` - The message text
    /// * `room` - The target room
    ///
    /// # Returns
    /// A new Message, or a validation error when content is empty
    pub fn new(
        sender: impl Into<String>,
        content: &str,
        room: impl Into<String>,
    ) -> Result<Self, SharedError> {
        let content = validate_content(content)?;
        Ok(Self {
            sender: sender.into(),
            content,
            room: room.into(),
            timestamp: Utc::now(),
        })
    }
}

/// Validate and normalize message content
///
/// # Arguments
/// * `content` - The raw content as received from the client
///
/// # Returns
/// The trimmed content, or a validation error when nothing remains
pub fn validate_content(content: &str) -> Result<String, SharedError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(SharedError::validation(
            "content",
            "Message content cannot be empty.",
        ));
    }
    Ok(trimmed.to_string())
}
