//! Domain logic for client-side operations.
//!
//! Pure state: the session state machine, the typing debouncer and the
//! reconnect decisions. Nothing here touches the network or the terminal.

use std::{
    fmt,
    time::{Duration, Instant},
};

use crate::error::ClientError;

/// Local inactivity after which a burst of typing ends.
pub const TYPING_IDLE: Duration = Duration::from_secs(1);

/// Connecting → Synced → Active ↔ Reconnecting → Closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Socket open, `join_chat` sent, history not yet received
    Connecting,
    /// History received
    Synced,
    /// Presence confirmed; sends allowed
    Active,
    /// Transport lost; sends fail fast
    Reconnecting,
    /// Explicit leave, or retries exhausted
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Connecting => "connecting",
            SessionState::Synced => "synced",
            SessionState::Active => "active",
            SessionState::Reconnecting => "reconnecting",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct SessionStateMachine {
    state: SessionState,
}

impl Default for SessionStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStateMachine {
    pub fn new() -> Self {
        Self {
            state: SessionState::Connecting,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn invalid(&self, event: &'static str) -> ClientError {
        ClientError::InvalidTransition {
            from: self.state,
            event,
        }
    }

    /// `chat_history` arrived. A re-join on a live connection resends it, so
    /// Synced/Active stay where they are.
    pub fn on_history_received(&mut self) -> Result<SessionState, ClientError> {
        self.state = match self.state {
            SessionState::Connecting | SessionState::Reconnecting => SessionState::Synced,
            SessionState::Synced | SessionState::Active => self.state,
            SessionState::Closed => return Err(self.invalid("chat_history")),
        };
        Ok(self.state)
    }

    /// First presence snapshot after the history.
    pub fn on_presence_confirmed(&mut self) -> Result<SessionState, ClientError> {
        self.state = match self.state {
            SessionState::Synced | SessionState::Active => SessionState::Active,
            _ => return Err(self.invalid("active_users_update")),
        };
        Ok(self.state)
    }

    /// Socket dropped or failed.
    pub fn on_transport_lost(&mut self) -> Result<SessionState, ClientError> {
        self.state = match self.state {
            SessionState::Connecting
            | SessionState::Synced
            | SessionState::Active
            | SessionState::Reconnecting => SessionState::Reconnecting,
            SessionState::Closed => return Err(self.invalid("transport_lost")),
        };
        Ok(self.state)
    }

    /// Explicit leave, fatal refusal, or retries exhausted.
    pub fn close(&mut self) {
        self.state = SessionState::Closed;
    }

    /// Sends are rejected (not queued) outside Synced/Active.
    pub fn ensure_can_send(&self) -> Result<(), ClientError> {
        match self.state {
            SessionState::Synced | SessionState::Active => Ok(()),
            _ => Err(ClientError::NotConnected),
        }
    }
}

/// What the debouncer wants sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypingSignal {
    Start,
    Stop,
}

/// One `typing` per burst, one `stop_typing` after `idle` of no keystrokes
/// or when the line is submitted.
#[derive(Debug, Clone)]
pub struct TypingDebouncer {
    idle: Duration,
    last_keystroke: Option<Instant>,
}

impl Default for TypingDebouncer {
    fn default() -> Self {
        Self::new(TYPING_IDLE)
    }
}

impl TypingDebouncer {
    pub fn new(idle: Duration) -> Self {
        Self {
            idle,
            last_keystroke: None,
        }
    }

    pub fn is_typing(&self) -> bool {
        self.last_keystroke.is_some()
    }

    pub fn on_keystroke(&mut self, now: Instant) -> Option<TypingSignal> {
        let started = self.last_keystroke.is_none();
        self.last_keystroke = Some(now);
        started.then_some(TypingSignal::Start)
    }

    pub fn on_submit(&mut self) -> Option<TypingSignal> {
        self.last_keystroke.take().map(|_| TypingSignal::Stop)
    }

    /// `Stop` once the idle window has passed since the last keystroke.
    pub fn poll(&mut self, now: Instant) -> Option<TypingSignal> {
        match self.last_keystroke {
            Some(last) if now.duration_since(last) >= self.idle => {
                self.last_keystroke = None;
                Some(TypingSignal::Stop)
            }
            _ => None,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.last_keystroke.map(|last| last + self.idle)
    }

    /// Forget the burst without signalling (the connection it belonged to is gone).
    pub fn reset(&mut self) {
        self.last_keystroke = None;
    }
}

/// Check if the client should exit immediately based on the error type.
pub fn should_exit_immediately(error: &ClientError) -> bool {
    matches!(error, ClientError::InvalidUser(_))
}

/// Check if the client should attempt to reconnect.
///
/// `current_attempt` is the number of failed attempts so far.
pub fn should_attempt_reconnect(
    error: &ClientError,
    current_attempt: u32,
    max_attempts: u32,
) -> bool {
    if should_exit_immediately(error) {
        return false;
    }

    current_attempt < max_attempts
}
