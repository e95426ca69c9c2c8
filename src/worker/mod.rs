//! Worker Relay
//!
//! Consumes the relay queue one envelope at a time: forwards each payload
//! to the notification fan-out's ingest socket (best-effort), simulates
//! bounded processing work, then acknowledges. Any processing error
//! causes a negative acknowledgement with requeue, so delivery is
//! at-least-once and downstream consumers may see duplicates.

/// Environment-driven configuration
pub mod config;

/// Reconnecting WebSocket client to the fan-out ingest socket
pub mod forwarder;

/// The consume/forward/ack loop
pub mod processor;

pub use forwarder::NotifyForwarder;
pub use processor::ProcessingError;

/// Consumer group this worker binds as
pub const CONSUMER_GROUP: &str = "message-worker";
