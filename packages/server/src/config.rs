//! Broker configuration.
//!
//! Built from command-line arguments by the server binary; tests construct it
//! directly and override single fields with struct update syntax.

use std::time::Duration;

use crate::domain::RateLimitPolicy;

#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Max characters of a message after trimming.
    pub max_message_length: usize,
    /// Messages replayed to a connection at join.
    pub history_limit: usize,
    /// Messages retained by the in-memory history store.
    pub history_capacity: usize,
    pub rate_limit: RateLimitPolicy,
    /// Server-side typing window.
    pub typing_expiry: Duration,
    pub typing_sweep_interval: Duration,
    /// Per-connection outbound queue length.
    pub outbound_queue_capacity: usize,
    /// Max time a single socket write may stall before the connection ends.
    pub write_timeout: Duration,
    /// Time allowed for the first `join_chat` frame.
    pub join_timeout: Duration,
    /// Random identity draws before the suffix fallback.
    pub identity_attempts: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_message_length: 500,
            history_limit: 50,
            history_capacity: 1000,
            rate_limit: RateLimitPolicy {
                max_messages: 5,
                interval: Duration::from_secs(10),
            },
            typing_expiry: Duration::from_millis(3000),
            typing_sweep_interval: Duration::from_millis(500),
            outbound_queue_capacity: 64,
            write_timeout: Duration::from_millis(5000),
            join_timeout: Duration::from_secs(10),
            identity_attempts: 8,
        }
    }
}
