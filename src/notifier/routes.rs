/**
 * Notification Service Routes
 *
 * - `GET /` - health check
 * - `GET /notifications` - client notification socket (server->client
 *   only; inbound frames are drained and ignored)
 * - `GET /ingest` - the worker relay's inbound side channel; every text
 *   frame received here is rebroadcast as-is to all open client
 *   connections
 */
use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};

use crate::notifier::fanout::NotificationFanout;

/// Create the notification service router
pub fn create_router(fanout: NotificationFanout) -> Router<()> {
    Router::new()
        .route("/", get(health))
        .route("/notifications", get(notifications_socket))
        .route("/ingest", get(ingest_socket))
        .with_state(fanout)
}

async fn health() -> &'static str {
    "Notification Service is running and consuming messages."
}

/// Handle a client notification connection (GET /notifications)
async fn notifications_socket(
    State(fanout): State<NotificationFanout>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| handle_client(socket, fanout))
}

async fn handle_client(socket: WebSocket, fanout: NotificationFanout) {
    let (id, mut mailbox) = fanout.register();
    tracing::info!("[Notify] Client connected");

    let (mut ws_tx, mut ws_rx) = socket.split();
    let writer = tokio::spawn(async move {
        while let Some(frame) = mailbox.recv().await {
            if ws_tx.send(WsMessage::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    // drain inbound frames until the client goes away
    while let Some(Ok(frame)) = ws_rx.next().await {
        if let WsMessage::Close(_) = frame {
            break;
        }
    }

    fanout.unregister(id);
    tracing::info!("[Notify] Client disconnected");
    writer.abort();
}

/// Handle the worker's ingest connection (GET /ingest)
async fn ingest_socket(
    State(fanout): State<NotificationFanout>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| handle_ingest(socket, fanout))
}

async fn handle_ingest(mut socket: WebSocket, fanout: NotificationFanout) {
    tracing::info!("[Notify] Worker ingest connected");
    while let Some(Ok(frame)) = socket.next().await {
        match frame {
            WsMessage::Text(text) => {
                let delivered = fanout.broadcast(text.as_str());
                tracing::debug!(
                    "[Notify] Rebroadcast ingest frame to {} connections",
                    delivered
                );
            }
            WsMessage::Close(_) => break,
            _ => {}
        }
    }
    tracing::info!("[Notify] Worker ingest disconnected");
}
