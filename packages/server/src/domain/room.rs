//! The chat room aggregate.
//!
//! Owns every piece of mutable broker state: the presence set, typing
//! entries, per-connection rate budgets and the message id sequence. The
//! usecase layer holds it behind a single async mutex, which makes it the
//! single writer for presence and message ordering.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use super::{
    entity::{ChatMessage, Connection},
    presence::{PresenceSet, PresenceSnapshot},
    rate_limit::{RateLimitPolicy, RateLimiter},
    typing::{TypingState, TypingUpdate},
    value_object::{AnonymousIdentity, ConnectionId, MessageId, Timestamp},
};

/// Everything `leave` produced for one departed connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub connection: Connection,
    pub message: ChatMessage,
    pub active_count: usize,
    /// Set when the connection still had a typing entry.
    pub stopped_typing: Option<AnonymousIdentity>,
}

#[derive(Debug)]
pub struct Room {
    presence: PresenceSet,
    typing: TypingState,
    rate_limiter: RateLimiter,
    last_message_id: u64,
}

impl Room {
    pub fn new(typing_window: Duration, rate_limit: RateLimitPolicy) -> Self {
        Self {
            presence: PresenceSet::new(),
            typing: TypingState::new(typing_window),
            rate_limiter: RateLimiter::new(rate_limit),
            last_message_id: 0,
        }
    }

    /// Allocate the next message id. Ids are strictly increasing for the
    /// lifetime of the process.
    pub fn next_message_id(&mut self) -> MessageId {
        self.last_message_id += 1;
        MessageId::new(self.last_message_id)
    }

    /// Register a connection; returns the join message and the new count.
    pub fn join(&mut self, connection: Connection, at: Timestamp) -> (ChatMessage, usize) {
        let identity = connection.identity.clone();
        let count = self.presence.insert(connection);
        let message = ChatMessage::joined(self.next_message_id(), identity, at);
        (message, count)
    }

    /// Deregister a connection. Unknown ids are a no-op.
    pub fn leave(&mut self, connection_id: &ConnectionId, at: Timestamp) -> Option<Departure> {
        let connection = self.presence.remove(connection_id)?;
        let stopped_typing = self.typing.stop(connection_id);
        self.rate_limiter.forget(connection_id);
        let message = ChatMessage::left(self.next_message_id(), connection.identity.clone(), at);

        Some(Departure {
            connection,
            message,
            active_count: self.presence.count(),
            stopped_typing,
        })
    }

    pub fn connection(&self, connection_id: &ConnectionId) -> Option<&Connection> {
        self.presence.get(connection_id)
    }

    pub fn identity_of(&self, connection_id: &ConnectionId) -> Option<&AnonymousIdentity> {
        self.presence.get(connection_id).map(|c| &c.identity)
    }

    pub fn is_connected(&self, connection_id: &ConnectionId) -> bool {
        self.presence.contains(connection_id)
    }

    pub fn active_count(&self) -> usize {
        self.presence.count()
    }

    pub fn active_identities(&self) -> HashSet<AnonymousIdentity> {
        self.presence.active_identities()
    }

    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        self.presence.connection_ids()
    }

    /// Every connection except `excluded`.
    pub fn connection_ids_except(&self, excluded: &ConnectionId) -> Vec<ConnectionId> {
        self.presence
            .connection_ids()
            .into_iter()
            .filter(|id| id != excluded)
            .collect()
    }

    pub fn snapshot(&self) -> PresenceSnapshot {
        self.presence.snapshot()
    }

    /// `None` when the connection is not registered.
    pub fn start_typing(
        &mut self,
        connection_id: &ConnectionId,
        now: Instant,
    ) -> Option<TypingUpdate> {
        let identity = self.presence.get(connection_id)?.identity.clone();
        Some(self.typing.start(*connection_id, identity, now))
    }

    pub fn stop_typing(&mut self, connection_id: &ConnectionId) -> Option<AnonymousIdentity> {
        self.typing.stop(connection_id)
    }

    pub fn sweep_typing(&mut self, now: Instant) -> Vec<(ConnectionId, AnonymousIdentity)> {
        self.typing.sweep(now)
    }

    pub fn is_typing(&self, connection_id: &ConnectionId) -> bool {
        self.typing.is_typing(connection_id)
    }

    pub fn try_acquire_send_budget(&mut self, connection_id: &ConnectionId, now: Instant) -> bool {
        self.rate_limiter.try_acquire(*connection_id, now)
    }
}
