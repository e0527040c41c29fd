//! Per-connection message budget (sliding window).

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use super::value_object::ConnectionId;

/// Budget of `max_messages` per `interval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub max_messages: usize,
    pub interval: Duration,
}

#[derive(Debug)]
pub struct RateLimiter {
    policy: RateLimitPolicy,
    sent: HashMap<ConnectionId, VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self {
            policy,
            sent: HashMap::new(),
        }
    }

    /// Record a send at `now` if it fits the budget.
    ///
    /// Rejected attempts are not recorded, so a client that backs off
    /// regains its budget once the window slides.
    pub fn try_acquire(&mut self, connection_id: ConnectionId, now: Instant) -> bool {
        let window = self.sent.entry(connection_id).or_default();
        while let Some(oldest) = window.front() {
            if now.duration_since(*oldest) >= self.policy.interval {
                window.pop_front();
            } else {
                break;
            }
        }

        if window.len() >= self.policy.max_messages {
            return false;
        }
        window.push_back(now);
        true
    }

    pub fn forget(&mut self, connection_id: &ConnectionId) {
        self.sent.remove(connection_id);
    }
}
