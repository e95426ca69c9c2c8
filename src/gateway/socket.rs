/**
 * WebSocket Connection Handling
 *
 * The gateway's chat socket endpoint. Every frame is a JSON object of the
 * shape `{"event": ..., "data": ...}`; see `shared::event` for the
 * protocol.
 *
 * # Handshake
 *
 * The credential is presented as a `token` query parameter and verified
 * before the upgrade; a connection that fails authentication is rejected
 * without ever touching room state.
 *
 * # Per-Connection Ordering
 *
 * Each connection's intents are handled sequentially by its own socket
 * task, and outbound events flow through an ordered per-connection
 * mailbox, so `receiveMessage` always reaches room members before the
 * sender's `userStoppedTyping` that follows it.
 */
use std::collections::HashMap;

use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::gateway::auth::{self, AuthError, Identity};
use crate::gateway::db;
use crate::gateway::rooms::ConnectionId;
use crate::gateway::state::AppState;
use crate::gateway::DEFAULT_ROOM;
use crate::relay::RelayEnvelope;
use crate::shared::{ClientEvent, Message, ServerEvent};

/// Handle a chat socket handshake (GET /chat)
///
/// Authenticates the `token` query parameter, then upgrades. Rejections:
/// 401 when no token is presented, 403 when it is invalid or expired.
pub async fn chat_socket(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    ws: WebSocketUpgrade,
) -> Response {
    let Some(token) = params.get("token") else {
        tracing::warn!(
            "[Chat Gateway] Authentication error - Token not provided for socket connection."
        );
        let error = AuthError::MissingCredential;
        return (error.status_code(), error.to_string()).into_response();
    };

    let identity = match auth::verify_token(&state.jwt_secret, token) {
        Ok(identity) => identity,
        Err(e) => {
            tracing::warn!(
                "[Chat Gateway] Authentication error - Invalid token for socket connection."
            );
            return (e.status_code(), e.to_string()).into_response();
        }
    };

    ws.on_upgrade(move |socket| handle_connection(socket, identity, state))
}

async fn handle_connection(socket: WebSocket, identity: Identity, state: AppState) {
    let connection_id = Uuid::new_v4();
    tracing::info!(
        "[Chat Gateway] User connected via WebSocket: {} (Connection ID: {})",
        identity.username,
        connection_id
    );

    let (mut ws_tx, mut ws_rx) = socket.split();
    let (mailbox, mut outbound) = mpsc::unbounded_channel::<ServerEvent>();

    {
        let mut rooms = state.rooms.write().await;
        rooms.register(connection_id, identity.username.clone(), mailbox);
        rooms.join(connection_id, DEFAULT_ROOM);
        rooms.send_to(
            connection_id,
            &ServerEvent::JoinedRoom(DEFAULT_ROOM.to_string()),
        );
    }
    tracing::info!(
        "[Chat Gateway] {} joined room: {}",
        identity.username,
        DEFAULT_ROOM
    );

    let writer = tokio::spawn(async move {
        while let Some(event) = outbound.recv().await {
            let frame = match event.to_frame() {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::error!("[Chat Gateway] Failed to encode outbound event: {}", e);
                    continue;
                }
            };
            if ws_tx.send(WsMessage::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(frame)) = ws_rx.next().await {
        match frame {
            WsMessage::Text(text) => match ClientEvent::from_frame(text.as_str()) {
                Ok(event) => dispatch_event(&state, connection_id, &identity, event).await,
                Err(e) => {
                    tracing::warn!(
                        "[Chat Gateway] Ignoring malformed frame from {}: {}",
                        identity.username,
                        e
                    );
                }
            },
            WsMessage::Close(_) => break,
            _ => {}
        }
    }

    disconnect(&state, connection_id, &identity).await;
    tracing::info!(
        "[Chat Gateway] User disconnected via WebSocket: {} (Connection ID: {})",
        identity.username,
        connection_id
    );
    writer.abort();
}

async fn dispatch_event(
    state: &AppState,
    connection_id: ConnectionId,
    identity: &Identity,
    event: ClientEvent,
) {
    match event {
        ClientEvent::JoinRoom(room) => handle_join(state, connection_id, identity, &room).await,
        ClientEvent::SendMessage { room, content } => {
            handle_send(state, connection_id, identity, &room, &content).await
        }
        ClientEvent::Typing(room) => {
            handle_typing(state, connection_id, identity, &room, true).await
        }
        ClientEvent::StopTyping(room) => {
            handle_typing(state, connection_id, identity, &room, false).await
        }
    }
}

/// Move the connection into another room
///
/// Leaving the previous room emits a stop-typing side effect into it; the
/// `joinedRoom` confirmation goes to the caller only.
async fn handle_join(
    state: &AppState,
    connection_id: ConnectionId,
    identity: &Identity,
    room: &str,
) {
    let mut rooms = state.rooms.write().await;
    for previous in rooms.leave_all(connection_id) {
        rooms.broadcast(
            &previous,
            &ServerEvent::UserStoppedTyping(identity.username.clone()),
        );
        tracing::info!("[Chat Gateway] {} left room: {}", identity.username, previous);
    }
    rooms.join(connection_id, room);
    rooms.send_to(connection_id, &ServerEvent::JoinedRoom(room.to_string()));
    tracing::info!("[Chat Gateway] {} joined room: {}", identity.username, room);
}

/// Validate, persist, broadcast and relay one send intent
async fn handle_send(
    state: &AppState,
    connection_id: ConnectionId,
    identity: &Identity,
    room: &str,
    content: &str,
) {
    // bind the check so the read guard is released before replying
    let is_member = state.rooms.read().await.is_member(connection_id, room);
    if !is_member {
        tracing::warn!(
            "[Chat Gateway] User {} attempted to send message to room {} without being in it.",
            identity.username,
            room
        );
        reply(
            state,
            connection_id,
            ServerEvent::MessageError("You are not in this room.".to_string()),
        )
        .await;
        return;
    }

    tracing::info!(
        "[Chat Gateway] Message received from {} for room {}: {}",
        identity.username,
        room,
        content
    );

    let message = match Message::new(identity.username.clone(), content, room) {
        Ok(message) => message,
        Err(_) => {
            tracing::warn!("[Chat Gateway] Invalid message content received - empty.");
            reply(
                state,
                connection_id,
                ServerEvent::MessageError("Message content cannot be empty.".to_string()),
            )
            .await;
            return;
        }
    };

    if let Err(e) = db::insert_message(&state.db_pool, &message).await {
        tracing::error!("[Chat Gateway] Error saving message: {}", e);
        reply(
            state,
            connection_id,
            ServerEvent::MessageError("Failed to send message.".to_string()),
        )
        .await;
        return;
    }

    // the direct room broadcast is authoritative and happens first
    state
        .rooms
        .read()
        .await
        .broadcast(room, &ServerEvent::ReceiveMessage(message.clone()));
    tracing::info!(
        "[Chat Gateway] Message broadcasted to room {}: {}",
        room,
        message.content
    );

    // best-effort: a broker outage must not fail the send path
    state.relay.publish(&RelayEnvelope::new(message)).await;

    let mut rooms = state.rooms.write().await;
    rooms.clear_typing(room, &identity.username);
    rooms.broadcast(
        room,
        &ServerEvent::UserStoppedTyping(identity.username.clone()),
    );
}

/// Relay a typing or stop-typing indicator to the other room members
async fn handle_typing(
    state: &AppState,
    connection_id: ConnectionId,
    identity: &Identity,
    room: &str,
    typing: bool,
) {
    let mut rooms = state.rooms.write().await;
    if !rooms.is_member(connection_id, room) {
        tracing::warn!(
            "[Chat Gateway] User {} attempted to send {} status to room {} without being in it.",
            identity.username,
            if typing { "typing" } else { "stopTyping" },
            room
        );
        return;
    }

    if typing {
        rooms.mark_typing(room, &identity.username);
        rooms.broadcast_except(
            room,
            connection_id,
            &ServerEvent::UserTyping(identity.username.clone()),
        );
    } else {
        rooms.clear_typing(room, &identity.username);
        rooms.broadcast_except(
            room,
            connection_id,
            &ServerEvent::UserStoppedTyping(identity.username.clone()),
        );
    }
}

/// Tear down a closed connection
async fn disconnect(state: &AppState, connection_id: ConnectionId, identity: &Identity) {
    let mut rooms = state.rooms.write().await;
    for room in rooms.unregister(connection_id) {
        rooms.broadcast(
            &room,
            &ServerEvent::UserStoppedTyping(identity.username.clone()),
        );
    }
}

async fn reply(state: &AppState, connection_id: ConnectionId, event: ServerEvent) {
    state.rooms.read().await.send_to(connection_id, &event);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::CHAT_QUEUE;
    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc::UnboundedReceiver;

    async fn test_state() -> AppState {
        let pool = db::connect("sqlite::memory:").await.unwrap();
        let relay = crate::relay::RelayConnection::connect("sqlite::memory:", CHAT_QUEUE).await;
        AppState::new(pool, relay, "test-secret".to_string())
    }

    async fn register_member(
        state: &AppState,
        username: &str,
        room: &str,
    ) -> (ConnectionId, Identity, UnboundedReceiver<ServerEvent>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        let mut rooms = state.rooms.write().await;
        rooms.register(id, username, tx);
        rooms.join(id, room);
        let identity = Identity {
            id: format!("id-{}", username),
            username: username.to_string(),
        };
        (id, identity, rx)
    }

    fn drain(rx: &mut UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_send_rejected_when_not_in_room() {
        let state = test_state().await;
        let (id, identity, mut rx) = register_member(&state, "bob", "general").await;

        handle_send(&state, id, &identity, "x", "hi").await;

        assert_eq!(
            drain(&mut rx),
            vec![ServerEvent::MessageError(
                "You are not in this room.".to_string()
            )]
        );
        // nothing persisted
        let history = db::recent_messages(&state.db_pool, "x", db::HISTORY_LIMIT)
            .await
            .unwrap();
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn test_send_rejected_when_content_empty() {
        let state = test_state().await;
        let (id, identity, mut rx) = register_member(&state, "alice", "general").await;

        handle_send(&state, id, &identity, "general", "   ").await;

        assert_eq!(
            drain(&mut rx),
            vec![ServerEvent::MessageError(
                "Message content cannot be empty.".to_string()
            )]
        );
        let history = db::recent_messages(&state.db_pool, "general", db::HISTORY_LIMIT)
            .await
            .unwrap();
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn test_accepted_send_broadcasts_then_stops_typing() {
        let state = test_state().await;
        let (alice, identity, mut alice_rx) = register_member(&state, "alice", "general").await;
        let (_bob, _, mut bob_rx) = register_member(&state, "bob", "general").await;

        state.rooms.write().await.mark_typing("general", "alice");
        handle_send(&state, alice, &identity, "general", "hi").await;

        // every member, sender included, sees the message before the
        // sender's stop-typing
        for rx in [&mut alice_rx, &mut bob_rx] {
            let events = drain(rx);
            assert_eq!(events.len(), 2);
            match &events[0] {
                ServerEvent::ReceiveMessage(message) => {
                    assert_eq!(message.sender, "alice");
                    assert_eq!(message.content, "hi");
                    assert_eq!(message.room, "general");
                }
                other => panic!("expected receiveMessage, got {:?}", other),
            }
            assert_eq!(
                events[1],
                ServerEvent::UserStoppedTyping("alice".to_string())
            );
        }

        // persisted once, typing entry cleared
        let history = db::recent_messages(&state.db_pool, "general", db::HISTORY_LIMIT)
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert!(state.rooms.read().await.typing_in("general").is_empty());
    }

    #[tokio::test]
    async fn test_accepted_send_reaches_relay_queue() {
        let state = test_state().await;
        let (alice, identity, _rx) = register_member(&state, "alice", "general").await;

        handle_send(&state, alice, &identity, "general", "hi").await;

        let mut consumer = state.relay.consumer("message-worker");
        let delivery = consumer.next().await;
        let envelope = RelayEnvelope::from_payload(&delivery.payload).unwrap();
        assert_eq!(envelope.message().content, "hi");
        delivery.ack().await;
    }

    #[tokio::test]
    async fn test_send_survives_broker_outage() {
        let pool = db::connect("sqlite::memory:").await.unwrap();
        // a relay handle that can never connect
        let relay =
            crate::relay::RelayConnection::connect("sqlite:///nonexistent/relay.db", CHAT_QUEUE)
                .await;
        let state = AppState::new(pool, relay, "test-secret".to_string());
        let (alice, identity, mut rx) = register_member(&state, "alice", "general").await;

        handle_send(&state, alice, &identity, "general", "hi").await;

        let events = drain(&mut rx);
        assert!(matches!(events[0], ServerEvent::ReceiveMessage(_)));
        let history = db::recent_messages(&state.db_pool, "general", db::HISTORY_LIMIT)
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn test_join_moves_rooms_and_stops_typing_in_old() {
        let state = test_state().await;
        let (alice, identity, mut alice_rx) = register_member(&state, "alice", "general").await;
        let (_bob, _, mut bob_rx) = register_member(&state, "bob", "general").await;

        state.rooms.write().await.mark_typing("general", "alice");
        handle_join(&state, alice, &identity, "random").await;

        {
            let rooms = state.rooms.read().await;
            assert!(rooms.is_member(alice, "random"));
            assert!(!rooms.is_member(alice, "general"));
            assert!(rooms.typing_in("general").is_empty());
        }

        // the member left behind sees the stop-typing side effect
        assert_eq!(
            drain(&mut bob_rx),
            vec![ServerEvent::UserStoppedTyping("alice".to_string())]
        );
        // the caller gets the join confirmation only
        assert_eq!(
            drain(&mut alice_rx),
            vec![ServerEvent::JoinedRoom("random".to_string())]
        );
    }

    #[tokio::test]
    async fn test_typing_notifies_only_others() {
        let state = test_state().await;
        let (alice, identity, mut alice_rx) = register_member(&state, "alice", "general").await;
        let (_bob, _, mut bob_rx) = register_member(&state, "bob", "general").await;

        handle_typing(&state, alice, &identity, "general", true).await;

        assert!(drain(&mut alice_rx).is_empty());
        assert_eq!(
            drain(&mut bob_rx),
            vec![ServerEvent::UserTyping("alice".to_string())]
        );
        assert!(state
            .rooms
            .read()
            .await
            .typing_in("general")
            .contains("alice"));
    }

    #[tokio::test]
    async fn test_typing_outside_room_is_noop() {
        let state = test_state().await;
        let (alice, identity, mut alice_rx) = register_member(&state, "alice", "general").await;

        handle_typing(&state, alice, &identity, "random", true).await;

        assert!(drain(&mut alice_rx).is_empty());
        assert!(state.rooms.read().await.typing_in("random").is_empty());
    }

    #[tokio::test]
    async fn test_disconnect_clears_typing_everywhere() {
        let state = test_state().await;
        let (alice, identity, _alice_rx) = register_member(&state, "alice", "general").await;
        let (_bob, _, mut bob_rx) = register_member(&state, "bob", "general").await;

        state.rooms.write().await.mark_typing("general", "alice");
        disconnect(&state, alice, &identity).await;

        {
            let rooms = state.rooms.read().await;
            assert!(rooms.typing_in("general").is_empty());
            assert_eq!(rooms.username(alice), None);
            assert_eq!(rooms.member_count("general"), 1);
        }
        assert_eq!(
            drain(&mut bob_rx),
            vec![ServerEvent::UserStoppedTyping("alice".to_string())]
        );
    }
}
