//! Relay Queue
//!
//! A durable, ordered, at-least-once delivery channel that decouples the
//! gateway's ingestion path from the notification fan-out consumers.
//!
//! # Architecture
//!
//! - **`store`** - the durable named queue itself: an SQLite-backed
//!   payload log with per-consumer-group delivery state. Every bound
//!   consumer group receives every payload; within a group delivery is
//!   strictly one at a time, in publish order.
//! - **`connection`** - the swappable broker handle every client holds.
//!   It owns an `Option<QueueStore>` behind a lock: publish calls issued
//!   while the handle is disconnected fail soft (logged warning, payload
//!   dropped), and any storage error drops the handle and schedules a
//!   full reconnect on a fixed delay, repeating indefinitely.
//! - **`consumer`** - the pull loop yielding one `Delivery` at a time,
//!   each of which must be acknowledged or negatively acknowledged with
//!   requeue.
//! - **`envelope`** - the wire form of a message placed on the queue.
//!
//! # Delivery Guarantees
//!
//! A payload is never dropped by the queue without an acknowledgement
//! from every bound consumer group. Negative acknowledgement with requeue
//! and consumer crash-recovery both cause redelivery, so consumers must
//! tolerate duplicates; no dedup key is defined.

/// Swappable broker handle with reconnect
pub mod connection;

/// Pull consumer and deliveries
pub mod consumer;

/// Queue wire form of a message
pub mod envelope;

/// Relay error types
pub mod error;

/// Durable queue storage
pub mod store;

pub use connection::{RelayConnection, RECONNECT_DELAY};
pub use consumer::{Consumer, Delivery};
pub use envelope::RelayEnvelope;
pub use error::RelayError;
pub use store::QueueStore;

/// Name of the single queue carrying accepted chat messages
pub const CHAT_QUEUE: &str = "chat_messages";
