/**
 * Notification Forwarder
 *
 * WebSocket client onto the notification service's ingest endpoint. The
 * connection is maintained by a background task that reconnects on a
 * fixed delay, forever; `forward` is strictly best-effort - when the side
 * channel is down the frame is dropped with a warning and the caller's
 * acknowledgement path is never blocked.
 */
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;

/// Fixed delay between reconnect attempts to the ingest socket
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Handle to the reconnecting ingest connection
#[derive(Clone)]
pub struct NotifyForwarder {
    outbound: mpsc::UnboundedSender<String>,
    connected: Arc<AtomicBool>,
}

impl NotifyForwarder {
    /// Spawn the connection task and return the handle
    pub fn connect(url: impl Into<String>) -> Self {
        let (outbound, rx) = mpsc::unbounded_channel();
        let connected = Arc::new(AtomicBool::new(false));
        tokio::spawn(run_connection(url.into(), rx, Arc::clone(&connected)));
        Self { outbound, connected }
    }

    /// Whether the ingest socket is currently open
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Forward a frame, best-effort
    ///
    /// # Returns
    /// Whether the frame was handed to the live connection
    pub fn forward(&self, frame: String) -> bool {
        if !self.is_connected() {
            tracing::warn!("[Worker] WebSocket not connected, cannot send notification");
            return false;
        }
        if self.outbound.send(frame).is_err() {
            tracing::warn!("[Worker] WebSocket not connected, cannot send notification");
            return false;
        }
        true
    }
}

async fn run_connection(
    url: String,
    mut rx: mpsc::UnboundedReceiver<String>,
    connected: Arc<AtomicBool>,
) {
    loop {
        match connect_async(url.as_str()).await {
            Ok((stream, _)) => {
                tracing::info!("[Worker] Connected to Notification WebSocket Server");
                connected.store(true, Ordering::SeqCst);
                let (mut sink, mut read) = stream.split();

                loop {
                    tokio::select! {
                        frame = rx.recv() => {
                            let Some(frame) = frame else {
                                // every handle dropped; shut the task down
                                return;
                            };
                            if sink.send(WsMessage::Text(frame.into())).await.is_err() {
                                break;
                            }
                        }
                        incoming = read.next() => {
                            // the ingest socket never sends us anything
                            // meaningful; any error or close tears down
                            match incoming {
                                Some(Ok(_)) => {}
                                _ => break,
                            }
                        }
                    }
                }

                connected.store(false, Ordering::SeqCst);
                tracing::warn!(
                    "[Worker] WebSocket connection closed. Reconnecting in {:?}...",
                    RECONNECT_DELAY
                );
            }
            Err(e) => {
                tracing::error!("[Worker] WebSocket error: {}", e);
            }
        }
        tokio::time::sleep(RECONNECT_DELAY).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_forward_while_disconnected_drops_frame() {
        // nothing listens here; the forwarder stays disconnected
        let forwarder = NotifyForwarder::connect("ws://127.0.0.1:1/ingest");
        assert!(!forwarder.is_connected());
        assert!(!forwarder.forward("{}".to_string()));
    }
}
