//! Server → client events (domain side).
//!
//! The wire encoding lives in `infrastructure::dto::websocket`; the usecase
//! layer only ever builds these.

use super::{
    entity::ChatMessage, presence::PresenceSnapshot, value_object::AnonymousIdentity,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// Sent to the joining connection only, before its history.
    IdentityAssigned { identity: AnonymousIdentity },
    ChatHistory { messages: Vec<ChatMessage> },
    UserJoined {
        message: ChatMessage,
        active_count: usize,
    },
    UserLeft {
        message: ChatMessage,
        active_count: usize,
    },
    ActiveUsersUpdate(PresenceSnapshot),
    NewMessage(ChatMessage),
    UserTyping { identity: AnonymousIdentity },
    UserStopTyping { identity: AnonymousIdentity },
    Error { message: String },
}

impl ChatEvent {
    /// Event name as used on the wire and in logs.
    pub fn name(&self) -> &'static str {
        match self {
            ChatEvent::IdentityAssigned { .. } => "identity_assigned",
            ChatEvent::ChatHistory { .. } => "chat_history",
            ChatEvent::UserJoined { .. } => "user_joined",
            ChatEvent::UserLeft { .. } => "user_left",
            ChatEvent::ActiveUsersUpdate(_) => "active_users_update",
            ChatEvent::NewMessage(_) => "new_message",
            ChatEvent::UserTyping { .. } => "user_typing",
            ChatEvent::UserStopTyping { .. } => "user_stop_typing",
            ChatEvent::Error { .. } => "error",
        }
    }
}
