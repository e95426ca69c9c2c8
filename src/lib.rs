//! RelayChat - Main Library
//!
//! RelayChat is the real-time distribution pipeline of a room-based chat
//! system: a WebSocket gateway that manages room membership and typing
//! state, a durable relay queue that decouples message ingestion from
//! notification fan-out, and a fan-out service that rebroadcasts every
//! message to all open notification connections.
//!
//! # Overview
//!
//! The library backs three service binaries:
//!
//! - **`chat-gateway`** - accepts authenticated WebSocket connections,
//!   handles `joinRoom` / `sendMessage` / `typing` / `stopTyping` intents,
//!   persists messages, broadcasts room-scoped events, and publishes
//!   accepted messages onto the relay queue. Also serves the
//!   `GET /messages` history endpoint.
//! - **`message-worker`** - consumes the relay queue one envelope at a
//!   time, forwards each payload to the notification service's ingest
//!   socket, simulates bounded processing work, then acknowledges.
//! - **`notification-service`** - independently consumes the same queue
//!   and broadcasts every message, tagged `NEW_MESSAGE`, to all currently
//!   open notification connections regardless of room.
//!
//! # Module Structure
//!
//! - **`shared`** - types common to all services
//!   - Message model, socket protocol events, notification frames
//!   - Validation error types
//!
//! - **`gateway`** - the realtime gateway
//!   - Connection authentication (JWT against a shared secret)
//!   - Room membership and typing registries
//!   - WebSocket connection handling and the history endpoint
//!
//! - **`relay`** - the relay queue
//!   - Durable named queue with per-consumer-group at-least-once delivery
//!   - Reconnecting publisher/consumer handle with soft-fail publishing
//!
//! - **`worker`** - the worker relay consumer
//!
//! - **`notifier`** - the notification fan-out
//!
//! # Delivery Semantics
//!
//! An accepted message reaches clients over two independent paths: the
//! gateway's direct room broadcast (synchronous, authoritative - it always
//! happens on successful persistence) and the queue-driven notification
//! path (best-effort, at-least-once, may lag or duplicate). Consumers of
//! notifications must tolerate duplicates; no dedup key is defined.
//!
//! # Thread Safety
//!
//! All mutable service state (room membership, typing sets, the
//! notification connection set, the swappable relay handle) lives behind
//! `Arc<RwLock<>>` / `Arc<Mutex<>>` and is mutated only through those
//! locks, so concurrent client operations are serialized the same way a
//! single-threaded event loop would serialize them.

/// Shared types and data structures
pub mod shared;

/// Realtime gateway (WebSocket chat + message history)
pub mod gateway;

/// Durable relay queue
pub mod relay;

/// Worker relay consumer
pub mod worker;

/// Notification fan-out
pub mod notifier;
