//! Presence set: connection id → anonymous identity, plus the derived count.
//!
//! The count is always `connections.len()`; there is no separate counter to
//! drift out of sync.

use std::collections::{HashMap, HashSet};

use super::{
    entity::Connection,
    value_object::{AnonymousIdentity, ConnectionId},
};

/// Point-in-time view of who is connected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceSnapshot {
    pub count: usize,
    /// Ordered by connect time, then by name.
    pub identities: Vec<AnonymousIdentity>,
}

#[derive(Debug, Default)]
pub struct PresenceSet {
    connections: HashMap<ConnectionId, Connection>,
}

impl PresenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection and return the new count.
    ///
    /// Re-inserting an already registered connection id replaces its entry
    /// without changing the count.
    pub fn insert(&mut self, connection: Connection) -> usize {
        self.connections.insert(connection.id, connection);
        self.connections.len()
    }

    pub fn remove(&mut self, connection_id: &ConnectionId) -> Option<Connection> {
        self.connections.remove(connection_id)
    }

    pub fn get(&self, connection_id: &ConnectionId) -> Option<&Connection> {
        self.connections.get(connection_id)
    }

    pub fn contains(&self, connection_id: &ConnectionId) -> bool {
        self.connections.contains_key(connection_id)
    }

    pub fn count(&self) -> usize {
        self.connections.len()
    }

    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        self.connections.keys().copied().collect()
    }

    pub fn active_identities(&self) -> HashSet<AnonymousIdentity> {
        self.connections
            .values()
            .map(|c| c.identity.clone())
            .collect()
    }

    pub fn snapshot(&self) -> PresenceSnapshot {
        let mut connections: Vec<&Connection> = self.connections.values().collect();
        connections.sort_by(|a, b| {
            a.connected_at
                .cmp(&b.connected_at)
                .then_with(|| a.identity.cmp(&b.identity))
        });

        PresenceSnapshot {
            count: connections.len(),
            identities: connections.into_iter().map(|c| c.identity.clone()).collect(),
        }
    }
}
