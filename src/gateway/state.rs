/**
 * Gateway Application State
 *
 * The central state container shared by the gateway's WebSocket and HTTP
 * handlers: the message store pool, the room/typing registry, the relay
 * queue handle, and the credential secret.
 *
 * # Thread Safety
 *
 * `AppState` is cheap to clone. The registry is the only directly mutable
 * piece and sits behind a `tokio::sync::RwLock`; every membership, typing
 * or broadcast mutation takes the write lock, which serializes them.
 */
use std::sync::Arc;

use sqlx::SqlitePool;
use tokio::sync::RwLock;

use crate::gateway::rooms::RoomRegistry;
use crate::relay::RelayConnection;

/// Shared state for the chat gateway
#[derive(Clone)]
pub struct AppState {
    /// Message store connection pool
    pub db_pool: SqlitePool,
    /// Room membership, mailboxes and typing state
    pub rooms: Arc<RwLock<RoomRegistry>>,
    /// Handle onto the relay queue (publish side)
    pub relay: RelayConnection,
    /// Shared secret credentials are verified against
    pub jwt_secret: Arc<String>,
}

impl AppState {
    /// Assemble the gateway state
    pub fn new(db_pool: SqlitePool, relay: RelayConnection, jwt_secret: String) -> Self {
        Self {
            db_pool,
            rooms: Arc::new(RwLock::new(RoomRegistry::new())),
            relay,
            jwt_secret: Arc::new(jwt_secret),
        }
    }
}
