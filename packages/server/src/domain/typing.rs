//! Typing state with expiry deadlines.
//!
//! Deadlines use a monotonic `Instant` supplied by the caller, so every
//! transition is deterministic under test.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::value_object::{AnonymousIdentity, ConnectionId};

#[derive(Debug, Clone)]
struct TypingEntry {
    identity: AnonymousIdentity,
    expires_at: Instant,
}

/// Result of a `start` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypingUpdate {
    /// A new typing session began; a `user_typing` delta is due.
    Started(AnonymousIdentity),
    /// An existing session had its deadline pushed back; nothing to emit.
    Refreshed,
}

#[derive(Debug)]
pub struct TypingState {
    window: Duration,
    entries: HashMap<ConnectionId, TypingEntry>,
}

impl TypingState {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            entries: HashMap::new(),
        }
    }

    /// Create or refresh the entry, setting its deadline to `now + window`.
    pub fn start(
        &mut self,
        connection_id: ConnectionId,
        identity: AnonymousIdentity,
        now: Instant,
    ) -> TypingUpdate {
        let expires_at = now + self.window;
        match self.entries.get_mut(&connection_id) {
            Some(entry) => {
                entry.expires_at = expires_at;
                TypingUpdate::Refreshed
            }
            None => {
                self.entries.insert(
                    connection_id,
                    TypingEntry {
                        identity: identity.clone(),
                        expires_at,
                    },
                );
                TypingUpdate::Started(identity)
            }
        }
    }

    /// Remove the entry. Returns the identity only if an entry existed, so a
    /// stop for an absent identity emits nothing.
    pub fn stop(&mut self, connection_id: &ConnectionId) -> Option<AnonymousIdentity> {
        self.entries.remove(connection_id).map(|e| e.identity)
    }

    /// Evict every entry whose deadline is at or before `now`.
    pub fn sweep(&mut self, now: Instant) -> Vec<(ConnectionId, AnonymousIdentity)> {
        let expired: Vec<ConnectionId> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.expires_at <= now)
            .map(|(id, _)| *id)
            .collect();

        expired
            .into_iter()
            .filter_map(|id| self.entries.remove(&id).map(|e| (id, e.identity)))
            .collect()
    }

    pub fn is_typing(&self, connection_id: &ConnectionId) -> bool {
        self.entries.contains_key(connection_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(3);

    fn identity(name: &str) -> AnonymousIdentity {
        AnonymousIdentity::new(name.to_string()).unwrap()
    }

    #[test]
    fn test_start_then_refresh() {
        // テスト項目: 初回は Started、期限内の再送は Refreshed になる
        // given (前提条件):
        let mut typing = TypingState::new(WINDOW);
        let id = ConnectionId::generate();
        let now = Instant::now();

        // when (操作):
        let first = typing.start(id, identity("Anonymous Fox 1"), now);
        let second = typing.start(id, identity("Anonymous Fox 1"), now + Duration::from_secs(1));

        // then (期待する結果):
        assert_eq!(first, TypingUpdate::Started(identity("Anonymous Fox 1")));
        assert_eq!(second, TypingUpdate::Refreshed);
        assert_eq!(typing.len(), 1);
    }

    #[test]
    fn test_refresh_extends_deadline() {
        // テスト項目: 再送で期限が延長され、元の期限では期限切れにならない
        // given (前提条件):
        let mut typing = TypingState::new(WINDOW);
        let id = ConnectionId::generate();
        let t0 = Instant::now();
        typing.start(id, identity("Anonymous Fox 1"), t0);
        typing.start(id, identity("Anonymous Fox 1"), t0 + Duration::from_secs(2));

        // when (操作):
        let expired = typing.sweep(t0 + Duration::from_secs(4));

        // then (期待する結果):
        assert!(expired.is_empty());
        assert!(typing.is_typing(&id));
    }

    #[test]
    fn test_sweep_evicts_once() {
        // テスト項目: 期限切れエントリは 1 度だけ返される
        // given (前提条件):
        let mut typing = TypingState::new(WINDOW);
        let id = ConnectionId::generate();
        let t0 = Instant::now();
        typing.start(id, identity("Anonymous Fox 1"), t0);

        // when (操作):
        let first = typing.sweep(t0 + WINDOW);
        let second = typing.sweep(t0 + WINDOW * 2);

        // then (期待する結果):
        assert_eq!(first, vec![(id, identity("Anonymous Fox 1"))]);
        assert!(second.is_empty());
    }

    #[test]
    fn test_stop_is_idempotent() {
        // テスト項目: 存在しないエントリの stop は何も返さない
        // given (前提条件):
        let mut typing = TypingState::new(WINDOW);
        let id = ConnectionId::generate();
        typing.start(id, identity("Anonymous Fox 1"), Instant::now());

        // when (操作):
        let first = typing.stop(&id);
        let second = typing.stop(&id);

        // then (期待する結果):
        assert_eq!(first, Some(identity("Anonymous Fox 1")));
        assert_eq!(second, None);
        assert!(typing.is_empty());
    }

    #[test]
    fn test_stopped_entry_is_not_swept() {
        // テスト項目: 明示的に止めたエントリは期限切れで再通知されない
        // given (前提条件):
        let mut typing = TypingState::new(WINDOW);
        let id = ConnectionId::generate();
        let t0 = Instant::now();
        typing.start(id, identity("Anonymous Fox 1"), t0);
        typing.stop(&id);

        // when (操作):
        let expired = typing.sweep(t0 + WINDOW * 2);

        // then (期待する結果):
        assert!(expired.is_empty());
    }
}
