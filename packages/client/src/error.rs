//! Error types for the chat client.

use thiserror::Error;

use crate::domain::SessionState;

/// Client-specific errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The server refused the join (missing or empty user id)
    #[error("Server refused user: {0}")]
    InvalidUser(String),

    /// Connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// A send was attempted while not connected
    #[error("Not connected")]
    NotConnected,

    /// The session cannot handle `event` in its current state
    #[error("Invalid transition: '{event}' while {from}")]
    InvalidTransition {
        from: SessionState,
        event: &'static str,
    },
}
