/**
 * Room Membership and Typing Registries
 *
 * Explicit bookkeeping for the gateway's per-connection state: a forward
 * mapping `connection -> current room`, the inverse `room -> member set`,
 * each connection's outbound mailbox, and the per-room set of identities
 * currently typing.
 *
 * # Invariants
 *
 * - A connection is a member of at most one room at any instant; joining
 *   while in a room is a move (leave first, then join).
 * - The forward and inverse maps are mutated together, only behind the
 *   registry's lock, so they can never disagree.
 * - A username never remains in a room's typing set after that connection
 *   leaves the room or disconnects.
 *
 * # Typing Expiry
 *
 * There is no server-side timeout on typing entries; expiry is driven by
 * client stop-typing events (or by send/leave/disconnect side effects).
 */
use std::collections::{HashMap, HashSet};

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::shared::ServerEvent;

/// Ephemeral identifier of one gateway connection
pub type ConnectionId = Uuid;

struct ConnectionEntry {
    username: String,
    mailbox: mpsc::UnboundedSender<ServerEvent>,
}

/// Membership, mailbox and typing state for every live connection
///
/// All mutation happens behind a single `RwLock` in the gateway state, so
/// concurrent client operations are serialized exactly like they would be
/// on a single-threaded event loop.
#[derive(Default)]
pub struct RoomRegistry {
    connections: HashMap<ConnectionId, ConnectionEntry>,
    current_room: HashMap<ConnectionId, String>,
    members: HashMap<String, HashSet<ConnectionId>>,
    typing: HashMap<String, HashSet<String>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly authenticated connection
    pub fn register(
        &mut self,
        id: ConnectionId,
        username: impl Into<String>,
        mailbox: mpsc::UnboundedSender<ServerEvent>,
    ) {
        self.connections.insert(
            id,
            ConnectionEntry {
                username: username.into(),
                mailbox,
            },
        );
    }

    /// Username of a registered connection
    pub fn username(&self, id: ConnectionId) -> Option<&str> {
        self.connections.get(&id).map(|c| c.username.as_str())
    }

    /// The room a connection currently belongs to
    pub fn current_room(&self, id: ConnectionId) -> Option<&str> {
        self.current_room.get(&id).map(String::as_str)
    }

    /// Whether a connection is a member of a room
    pub fn is_member(&self, id: ConnectionId, room: &str) -> bool {
        self.current_room.get(&id).map(String::as_str) == Some(room)
    }

    /// Number of live members in a room
    pub fn member_count(&self, room: &str) -> usize {
        self.members.get(room).map_or(0, HashSet::len)
    }

    /// Usernames currently typing in a room
    pub fn typing_in(&self, room: &str) -> HashSet<String> {
        self.typing.get(room).cloned().unwrap_or_default()
    }

    /// Join a room
    ///
    /// Callers leave the previous room first (`leave_all`); if they did
    /// not, the stale membership is dropped here so the one-room invariant
    /// holds regardless.
    pub fn join(&mut self, id: ConnectionId, room: &str) {
        if let Some(previous) = self.current_room.insert(id, room.to_string()) {
            self.drop_membership(id, &previous);
        }
        self.members.entry(room.to_string()).or_default().insert(id);
    }

    /// Leave every room the connection is a member of
    ///
    /// Also removes the connection's username from the typing set of each
    /// left room. Returns the rooms that were left.
    pub fn leave_all(&mut self, id: ConnectionId) -> Vec<String> {
        let Some(room) = self.current_room.remove(&id) else {
            return Vec::new();
        };
        self.drop_membership(id, &room);
        vec![room]
    }

    /// Remove a connection entirely (disconnect)
    ///
    /// Returns the rooms the connection belonged to, so the caller can
    /// broadcast the stop-typing side effect into each.
    pub fn unregister(&mut self, id: ConnectionId) -> Vec<String> {
        let left = self.leave_all(id);
        self.connections.remove(&id);
        left
    }

    /// Record that a username is typing in a room
    pub fn mark_typing(&mut self, room: &str, username: &str) {
        self.typing
            .entry(room.to_string())
            .or_default()
            .insert(username.to_string());
    }

    /// Remove a username from a room's typing set
    pub fn clear_typing(&mut self, room: &str, username: &str) {
        if let Some(set) = self.typing.get_mut(room) {
            set.remove(username);
            if set.is_empty() {
                self.typing.remove(room);
            }
        }
    }

    /// Deliver an event to a single connection
    pub fn send_to(&self, id: ConnectionId, event: &ServerEvent) {
        if let Some(entry) = self.connections.get(&id) {
            // a closed mailbox means the connection is tearing down
            let _ = entry.mailbox.send(event.clone());
        }
    }

    /// Deliver an event to every member of a room
    pub fn broadcast(&self, room: &str, event: &ServerEvent) {
        self.broadcast_filtered(room, None, event);
    }

    /// Deliver an event to every member of a room except one connection
    pub fn broadcast_except(&self, room: &str, except: ConnectionId, event: &ServerEvent) {
        self.broadcast_filtered(room, Some(except), event);
    }

    fn broadcast_filtered(&self, room: &str, except: Option<ConnectionId>, event: &ServerEvent) {
        let Some(members) = self.members.get(room) else {
            return;
        };
        for id in members {
            if Some(*id) == except {
                continue;
            }
            if let Some(entry) = self.connections.get(id) {
                let _ = entry.mailbox.send(event.clone());
            }
        }
    }

    fn drop_membership(&mut self, id: ConnectionId, room: &str) {
        if let Some(set) = self.members.get_mut(room) {
            set.remove(&id);
            if set.is_empty() {
                self.members.remove(room);
            }
        }
        let username = self.connections.get(&id).map(|e| e.username.clone());
        if let Some(username) = username {
            self.clear_typing(room, &username);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn registry_with(
        id: ConnectionId,
        username: &str,
    ) -> (RoomRegistry, mpsc::UnboundedReceiver<ServerEvent>) {
        let mut registry = RoomRegistry::new();
        let (tx, rx) = mpsc::unbounded_channel();
        registry.register(id, username, tx);
        (registry, rx)
    }

    #[test]
    fn test_membership_is_at_most_one_room() {
        let id = Uuid::new_v4();
        let (mut registry, _rx) = registry_with(id, "alice");

        registry.join(id, "general");
        assert!(registry.is_member(id, "general"));
        assert_eq!(registry.member_count("general"), 1);

        // joining another room without an explicit leave still moves
        registry.join(id, "random");
        assert!(registry.is_member(id, "random"));
        assert!(!registry.is_member(id, "general"));
        assert_eq!(registry.member_count("general"), 0);
        assert_eq!(registry.member_count("random"), 1);
    }

    #[test]
    fn test_leave_all_clears_typing() {
        let id = Uuid::new_v4();
        let (mut registry, _rx) = registry_with(id, "alice");
        registry.join(id, "general");
        registry.mark_typing("general", "alice");

        let left = registry.leave_all(id);
        assert_eq!(left, vec!["general".to_string()]);
        assert!(registry.typing_in("general").is_empty());
        assert_eq!(registry.current_room(id), None);
    }

    #[test]
    fn test_unregister_clears_typing() {
        let id = Uuid::new_v4();
        let (mut registry, _rx) = registry_with(id, "alice");
        registry.join(id, "general");
        registry.mark_typing("general", "alice");

        let left = registry.unregister(id);
        assert_eq!(left, vec!["general".to_string()]);
        assert!(registry.typing_in("general").is_empty());
        assert_eq!(registry.username(id), None);
    }

    #[test]
    fn test_broadcast_reaches_all_members() {
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let mut registry = RoomRegistry::new();
        let (alice_tx, mut alice_rx) = mpsc::unbounded_channel();
        let (bob_tx, mut bob_rx) = mpsc::unbounded_channel();
        registry.register(alice, "alice", alice_tx);
        registry.register(bob, "bob", bob_tx);
        registry.join(alice, "general");
        registry.join(bob, "general");

        registry.broadcast("general", &ServerEvent::JoinedRoom("general".to_string()));
        assert!(alice_rx.try_recv().is_ok());
        assert!(bob_rx.try_recv().is_ok());
    }

    #[test]
    fn test_broadcast_except_skips_sender() {
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let mut registry = RoomRegistry::new();
        let (alice_tx, mut alice_rx) = mpsc::unbounded_channel();
        let (bob_tx, mut bob_rx) = mpsc::unbounded_channel();
        registry.register(alice, "alice", alice_tx);
        registry.register(bob, "bob", bob_tx);
        registry.join(alice, "general");
        registry.join(bob, "general");

        registry.broadcast_except(
            "general",
            alice,
            &ServerEvent::UserTyping("alice".to_string()),
        );
        assert!(alice_rx.try_recv().is_err());
        assert_eq!(
            bob_rx.try_recv().unwrap(),
            ServerEvent::UserTyping("alice".to_string())
        );
    }

    #[test]
    fn test_broadcast_to_unknown_room_is_noop() {
        let registry = RoomRegistry::new();
        registry.broadcast("nowhere", &ServerEvent::JoinedRoom("nowhere".to_string()));
    }
}
