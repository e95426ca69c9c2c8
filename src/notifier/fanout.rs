/**
 * Notification Connection Set
 *
 * The set of currently-open notification connections, each represented by
 * its outbound mailbox. New connections are simply added to the broadcast
 * set; closed ones are removed (either explicitly on socket teardown or
 * lazily when their mailbox is found dead during a broadcast). No
 * backlog or catch-up is provided to newly connected clients.
 */
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use uuid::Uuid;

/// Cloneable handle to the open-connection set
#[derive(Clone, Default)]
pub struct NotificationFanout {
    connections: Arc<Mutex<HashMap<Uuid, mpsc::UnboundedSender<String>>>>,
}

impl NotificationFanout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection to the broadcast set
    ///
    /// # Returns
    /// The connection's id and the receiving end of its mailbox
    pub fn register(&self) -> (Uuid, mpsc::UnboundedReceiver<String>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        self.connections.lock().unwrap().insert(id, tx);
        (id, rx)
    }

    /// Remove a closed connection from the broadcast set
    pub fn unregister(&self, id: Uuid) {
        self.connections.lock().unwrap().remove(&id);
    }

    /// Number of currently-open connections
    pub fn connection_count(&self) -> usize {
        self.connections.lock().unwrap().len()
    }

    /// Push a frame to every open connection
    ///
    /// Connections whose mailbox is dead are dropped from the set.
    ///
    /// # Returns
    /// The number of connections the frame was delivered to
    pub fn broadcast(&self, frame: &str) -> usize {
        let mut connections = self.connections.lock().unwrap();
        connections.retain(|_, tx| tx.send(frame.to_string()).is_ok());
        connections.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_broadcast_reaches_every_connection() {
        let fanout = NotificationFanout::new();
        let (_a, mut rx_a) = fanout.register();
        let (_b, mut rx_b) = fanout.register();

        let delivered = fanout.broadcast(r#"{"type":"NEW_MESSAGE"}"#);
        assert_eq!(delivered, 2);
        assert_eq!(rx_a.try_recv().unwrap(), r#"{"type":"NEW_MESSAGE"}"#);
        assert_eq!(rx_b.try_recv().unwrap(), r#"{"type":"NEW_MESSAGE"}"#);
    }

    #[test]
    fn test_unregister_removes_connection() {
        let fanout = NotificationFanout::new();
        let (id, _rx) = fanout.register();
        assert_eq!(fanout.connection_count(), 1);
        fanout.unregister(id);
        assert_eq!(fanout.connection_count(), 0);
    }

    #[test]
    fn test_dead_mailboxes_dropped_on_broadcast() {
        let fanout = NotificationFanout::new();
        let (_a, rx_a) = fanout.register();
        let (_b, mut rx_b) = fanout.register();
        drop(rx_a);

        let delivered = fanout.broadcast("frame");
        assert_eq!(delivered, 1);
        assert_eq!(fanout.connection_count(), 1);
        assert_eq!(rx_b.try_recv().unwrap(), "frame");
    }

    #[test]
    fn test_broadcast_with_no_connections() {
        let fanout = NotificationFanout::new();
        assert_eq!(fanout.broadcast("frame"), 0);
    }
}
