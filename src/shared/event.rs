/**
 * Socket Protocol Events
 *
 * This module defines the wire protocol spoken over the gateway's chat
 * socket and the notification service's fan-out socket.
 *
 * # Gateway Socket Protocol
 *
 * Every frame is a single JSON object of the shape
 * `{"event": <name>, "data": <payload>}`:
 *
 * - client to server: `joinRoom`, `sendMessage`, `typing`, `stopTyping`
 * - server to client: `joinedRoom`, `receiveMessage`, `messageError`,
 *   `userTyping`, `userStoppedTyping`
 *
 * # Notification Protocol
 *
 * Server to client only, one frame shape:
 * `{"type": "NEW_MESSAGE", "data": <message>}`, pushed to all open
 * notification connections regardless of room. Filtering out messages for
 * other rooms (or the client's own messages) is a client-side concern.
 */
use serde::{Deserialize, Serialize};

use crate::shared::error::SharedError;
use crate::shared::message::Message;

/// Intent sent by a chat client over the gateway socket
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Join a room, leaving the current one
    JoinRoom(String),
    /// Send a message to a room the client is a member of
    SendMessage {
        /// Target room
        room: String,
        /// Raw message content
        content: String,
    },
    /// The client started typing in a room
    Typing(String),
    /// The client stopped typing in a room
    StopTyping(String),
}

/// Event emitted by the gateway to a chat client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// The caller joined a room (sent to the caller only)
    JoinedRoom(String),
    /// A message was accepted and broadcast to the room
    ReceiveMessage(Message),
    /// A send intent was rejected; sent to the offending caller only
    MessageError(String),
    /// Another member of the room started typing
    UserTyping(String),
    /// A member of the room stopped typing
    UserStoppedTyping(String),
}

impl ClientEvent {
    /// Decode a client intent from a WebSocket text frame
    pub fn from_frame(frame: &str) -> Result<Self, SharedError> {
        serde_json::from_str(frame)
            .map_err(|e| SharedError::serialization(format!("Invalid client event: {}", e)))
    }
}

impl ServerEvent {
    /// Encode this event as a WebSocket text frame
    pub fn to_frame(&self) -> Result<String, SharedError> {
        serde_json::to_string(self)
            .map_err(|e| SharedError::serialization(format!("Failed to encode event: {}", e)))
    }
}

/// Frame pushed to every open notification connection
///
/// The only frame shape the notification service ever sends. The worker
/// relay produces the same shape when forwarding onto the ingest socket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "data")]
pub enum NotificationFrame {
    /// A chat message passed through the relay queue
    #[serde(rename = "NEW_MESSAGE")]
    NewMessage(Message),
}

impl NotificationFrame {
    /// Encode this frame for a notification connection
    pub fn to_frame(&self) -> Result<String, SharedError> {
        serde_json::to_string(self)
            .map_err(|e| SharedError::serialization(format!("Failed to encode frame: {}", e)))
    }
}
