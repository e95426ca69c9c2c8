/**
 * Router Configuration
 *
 * Assembles the gateway's routes:
 *
 * - `GET /chat` - WebSocket chat socket (credential as `token` query
 *   parameter)
 * - `GET /messages` - authenticated message history
 *
 * The original deployment sits behind a permissive CORS policy, so the
 * router carries one too. Unknown routes fall through to a logged 404.
 */
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::gateway::history::get_messages;
use crate::gateway::socket::chat_socket;
use crate::gateway::state::AppState;

/// Create the gateway router with all routes configured
pub fn create_router(state: AppState) -> Router<()> {
    Router::new()
        .route("/chat", get(chat_socket))
        .route("/messages", get(get_messages))
        .layer(CorsLayer::permissive())
        .fallback(|| async {
            tracing::warn!("[Chat Gateway] 404 Not Found");
            (StatusCode::NOT_FOUND, "Chat Gateway: Endpoint not found")
        })
        .with_state(state)
}
