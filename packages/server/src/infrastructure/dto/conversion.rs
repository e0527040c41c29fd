//! Conversion logic from domain models to DTOs.

use yorisoi_shared::time::timestamp_to_rfc3339;

use crate::domain::{ChatEvent, ChatMessage, MessageKind, PresenceSnapshot};
use crate::infrastructure::dto::{http, websocket as dto};

// ========================================
// Domain → WebSocket DTO
// ========================================

impl From<MessageKind> for dto::MessageType {
    fn from(kind: MessageKind) -> Self {
        match kind {
            MessageKind::Message => Self::Message,
            MessageKind::Join => Self::Join,
            MessageKind::Leave => Self::Leave,
            MessageKind::System => Self::System,
        }
    }
}

impl From<ChatMessage> for dto::MessageDto {
    fn from(model: ChatMessage) -> Self {
        Self {
            id: model.id.value(),
            sender: model.sender.map(|s| s.into_string()),
            content: model.content.into_string(),
            kind: model.kind.into(),
            timestamp: model.created_at.value(),
        }
    }
}

impl From<PresenceSnapshot> for dto::ActiveUsersPayload {
    fn from(snapshot: PresenceSnapshot) -> Self {
        Self {
            count: snapshot.count,
            identities: snapshot
                .identities
                .into_iter()
                .map(|i| i.into_string())
                .collect(),
        }
    }
}

impl From<ChatEvent> for dto::ServerMessage {
    fn from(event: ChatEvent) -> Self {
        match event {
            ChatEvent::IdentityAssigned { identity } => {
                Self::IdentityAssigned(dto::IdentityPayload {
                    identity: identity.into_string(),
                })
            }
            ChatEvent::ChatHistory { messages } => {
                Self::ChatHistory(messages.into_iter().map(Into::into).collect())
            }
            ChatEvent::UserJoined {
                message,
                active_count,
            } => Self::UserJoined(dto::PresenceDeltaPayload {
                message: message.into(),
                active_count,
            }),
            ChatEvent::UserLeft {
                message,
                active_count,
            } => Self::UserLeft(dto::PresenceDeltaPayload {
                message: message.into(),
                active_count,
            }),
            ChatEvent::ActiveUsersUpdate(snapshot) => Self::ActiveUsersUpdate(snapshot.into()),
            ChatEvent::NewMessage(message) => Self::NewMessage(message.into()),
            ChatEvent::UserTyping { identity } => Self::UserTyping(dto::IdentityPayload {
                identity: identity.into_string(),
            }),
            ChatEvent::UserStopTyping { identity } => Self::UserStopTyping(dto::IdentityPayload {
                identity: identity.into_string(),
            }),
            ChatEvent::Error { message } => Self::Error(dto::ErrorPayload { message }),
        }
    }
}

// ========================================
// Domain → HTTP DTO
// ========================================

impl From<PresenceSnapshot> for http::PresenceDto {
    fn from(snapshot: PresenceSnapshot) -> Self {
        Self {
            count: snapshot.count,
            identities: snapshot
                .identities
                .into_iter()
                .map(|i| i.into_string())
                .collect(),
        }
    }
}

impl From<ChatMessage> for http::HistoryMessageDto {
    fn from(model: ChatMessage) -> Self {
        Self {
            id: model.id.value(),
            sender: model.sender.map(|s| s.into_string()),
            content: model.content.into_string(),
            kind: model.kind.into(),
            timestamp: timestamp_to_rfc3339(model.created_at.value()),
        }
    }
}
