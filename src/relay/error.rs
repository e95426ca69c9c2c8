//! Relay Error Types
//!
//! Errors raised by the relay queue. None of these ever reach an end user:
//! publish failures are logged and the payload is dropped (the room
//! broadcast path is unaffected), and consumer failures surface as
//! redelivery.
use thiserror::Error;

/// Errors raised by the relay queue and its clients
#[derive(Debug, Error)]
pub enum RelayError {
    /// The broker handle is currently disconnected
    #[error("Relay channel not available")]
    NotConnected,

    /// The underlying queue storage failed
    #[error("Relay storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// An envelope could not be encoded or decoded
    #[error("Relay serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
