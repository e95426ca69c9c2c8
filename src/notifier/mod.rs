//! Notification Fanout
//!
//! Maintains the set of currently-open notification connections - one per
//! client, independent of which chat room the client is viewing - and
//! broadcasts every message that passes through the relay queue to all of
//! them, tagged `NEW_MESSAGE`. No room filtering happens here; deciding
//! "is this relevant to me" is a client-side concern.
//!
//! Messages arrive over two paths: the service's own consumer group on
//! the relay queue, and the worker relay's ingest socket. Both may
//! deliver the same logical message, so clients must tolerate duplicates.

/// Environment-driven configuration
pub mod config;

/// The queue consumer feeding the fan-out
pub mod consume;

/// Open-connection set and broadcast
pub mod fanout;

/// HTTP/WebSocket routes
pub mod routes;

pub use fanout::NotificationFanout;

/// Consumer group this service binds as
pub const CONSUMER_GROUP: &str = "notification-service";
