/**
 * Message History Endpoint
 *
 * Implements `GET /messages?room=<name>`. Every request is authenticated
 * against the bearer credential before the store is touched: a missing
 * credential is a 401, an invalid or expired one a 403. A missing room
 * parameter is a 400. On success the response carries at most the 100
 * most recent messages of the room, ordered oldest first.
 */
use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::gateway::auth;
use crate::gateway::db;
use crate::gateway::state::AppState;

/// Handle a history fetch (GET /messages)
pub async fn get_messages(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let identity = match auth::bearer_identity(&state.jwt_secret, &headers) {
        Ok(identity) => identity,
        Err(e) => {
            tracing::warn!("[Chat Gateway] Credential rejected for message fetch: {:?}", e);
            return (e.status_code(), Json(json!({ "message": e.to_string() }))).into_response();
        }
    };

    let Some(room) = params.get("room").filter(|room| !room.is_empty()) else {
        tracing::warn!("[Chat Gateway] Room parameter missing for message fetch.");
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Room parameter is required." })),
        )
            .into_response();
    };

    tracing::info!(
        "[Chat Gateway] Fetching messages for user: {} in room: {}",
        identity.username,
        room
    );

    match db::recent_messages(&state.db_pool, room, db::HISTORY_LIMIT).await {
        Ok(messages) => (StatusCode::OK, Json(messages)).into_response(),
        Err(e) => {
            tracing::error!("[Chat Gateway] Error fetching messages: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "Error fetching messages." })),
            )
                .into_response()
        }
    }
}
