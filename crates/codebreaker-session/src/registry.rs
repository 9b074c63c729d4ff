//! The connection registry: who is behind each live connection.
//!
//! # Concurrency note
//!
//! `ConnectionRegistry` is a plain `HashMap`. The server owns exactly one
//! and wraps it in a `tokio::sync::Mutex`; no operation here awaits, so
//! the lock is only ever held for a map lookup.

use std::collections::HashMap;

use codebreaker_protocol::{PlayerId, RoomId};
use codebreaker_transport::ConnectionId;

/// The player a connection currently speaks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerBinding {
    pub player_id: PlayerId,
    pub room_id: RoomId,
    pub player_name: String,
}

/// Maps each live connection to the player it is bound to.
///
/// ```text
/// create_room / join_room / reconnect ──→ register()
///                                              │
///         leave_room / kicked / socket closed ─┴──→ unregister()
/// ```
///
/// A connection has at most one binding. Registering again replaces the
/// previous one; the caller is responsible for leaving the old room first.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    bindings: HashMap<ConnectionId, PlayerBinding>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a connection to a player, returning the binding it replaced.
    pub fn register(
        &mut self,
        conn: ConnectionId,
        binding: PlayerBinding,
    ) -> Option<PlayerBinding> {
        tracing::debug!(
            conn_id = %conn,
            player_id = %binding.player_id,
            room_id = %binding.room_id,
            "connection bound"
        );
        self.bindings.insert(conn, binding)
    }

    /// Returns the player bound to a connection, if any.
    pub fn lookup(&self, conn: ConnectionId) -> Option<&PlayerBinding> {
        self.bindings.get(&conn)
    }

    /// Removes and returns a connection's binding.
    pub fn unregister(&mut self, conn: ConnectionId) -> Option<PlayerBinding> {
        let removed = self.bindings.remove(&conn);
        if let Some(binding) = &removed {
            tracing::debug!(
                conn_id = %conn,
                player_id = %binding.player_id,
                "connection unbound"
            );
        }
        removed
    }

    /// Returns the number of bound connections.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns `true` if no connection is bound.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binding(player: &str, room: &str) -> PlayerBinding {
        PlayerBinding {
            player_id: PlayerId::new(player),
            room_id: RoomId::parse(room),
            player_name: format!("name-{player}"),
        }
    }

    fn conn(id: u64) -> ConnectionId {
        ConnectionId::new(id)
    }

    #[test]
    fn test_register_then_lookup() {
        let mut registry = ConnectionRegistry::new();
        assert!(registry.register(conn(1), binding("p1", "ABCDEF")).is_none());

        let found = registry.lookup(conn(1)).expect("bound");
        assert_eq!(found.player_id.as_str(), "p1");
        assert_eq!(found.room_id.as_str(), "ABCDEF");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_lookup_unknown_connection_is_none() {
        let registry = ConnectionRegistry::new();
        assert!(registry.lookup(conn(42)).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_register_replaces_previous_binding() {
        let mut registry = ConnectionRegistry::new();
        registry.register(conn(1), binding("p1", "AAAAAA"));

        let old = registry.register(conn(1), binding("p2", "BBBBBB"));

        assert_eq!(old, Some(binding("p1", "AAAAAA")));
        assert_eq!(registry.lookup(conn(1)), Some(&binding("p2", "BBBBBB")));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unregister_removes_binding() {
        let mut registry = ConnectionRegistry::new();
        registry.register(conn(1), binding("p1", "ABCDEF"));
        registry.register(conn(2), binding("p2", "ABCDEF"));

        assert_eq!(registry.unregister(conn(1)), Some(binding("p1", "ABCDEF")));
        assert!(registry.lookup(conn(1)).is_none());
        assert!(registry.lookup(conn(2)).is_some());
        assert!(registry.unregister(conn(1)).is_none());
    }
}
