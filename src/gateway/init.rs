/**
 * Gateway Initialization
 *
 * Wires the gateway together: message store, relay queue handle, room
 * registry and router.
 *
 * # Initialization Steps
 *
 * 1. Open the message store and assert its schema (required - the send
 *    path persists before it broadcasts).
 * 2. Connect the relay queue handle. This never blocks startup: if the
 *    queue store is unreachable the handle starts disconnected and keeps
 *    reconnecting in the background while publishes fail soft.
 * 3. Create the room registry and assemble the router.
 */
use axum::Router;

use crate::gateway::config::GatewayConfig;
use crate::gateway::db;
use crate::gateway::router::create_router;
use crate::gateway::state::AppState;
use crate::relay::{RelayConnection, CHAT_QUEUE};

/// Create the gateway application
///
/// # Errors
/// Fails only when the message store cannot be opened; every other
/// collaborator degrades soft.
pub async fn create_app(config: &GatewayConfig) -> Result<(Router<()>, AppState), sqlx::Error> {
    tracing::info!("[Chat Gateway] Initializing");

    let db_pool = db::connect(&config.database_url).await?;
    tracing::info!("[Chat Gateway] Connected to message store");

    let relay = RelayConnection::connect(config.relay_url.clone(), CHAT_QUEUE).await;

    let state = AppState::new(db_pool, relay, config.jwt_secret.clone());
    let router = create_router(state.clone());

    Ok((router, state))
}
