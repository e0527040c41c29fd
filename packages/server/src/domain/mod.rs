//! Domain layer
//!
//! Value Objects、Entities、Room 集約、および外部へのインターフェース
//! （HistoryStore / MessagePusher）を定義します。

pub mod entity;
pub mod error;
pub mod event;
pub mod identity;
pub mod message_pusher;
pub mod presence;
pub mod rate_limit;
pub mod repository;
pub mod room;
pub mod typing;
pub mod value_object;

pub use entity::{ChatMessage, Connection, MessageKind};
pub use error::{MessagePushError, RepositoryError, ValueObjectError};
pub use event::ChatEvent;
pub use identity::IdentityAssigner;
pub use message_pusher::{MessagePusher, PusherChannel};
pub use presence::{PresenceSet, PresenceSnapshot};
pub use rate_limit::{RateLimitPolicy, RateLimiter};
pub use repository::HistoryStore;
#[cfg(test)]
pub use repository::MockHistoryStore;
pub use room::{Departure, Room};
pub use typing::{TypingState, TypingUpdate};
pub use value_object::{
    AnonymousIdentity, ConnectionId, MessageContent, MessageId, Timestamp, UserId,
};
