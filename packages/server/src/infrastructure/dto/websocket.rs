//! WebSocket frame DTOs.
//!
//! Every frame is `{"event": "<name>", "data": <payload>}`. Each event has a
//! fixed payload type; unknown events or malformed payloads fail to parse at
//! the boundary and never reach the usecase layer.

use serde::{Deserialize, Serialize};

/// Message kind on the wire (`type` field).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Message,
    Join,
    Leave,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDto {
    pub id: u64,
    /// Absent for `system` messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: MessageType,
    /// Epoch milliseconds, assigned by the server.
    pub timestamp: i64,
}

// ========================================
// Client → Server
// ========================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinChatPayload {
    #[serde(default)]
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload {
    /// Informational only; the sender is the connection's identity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    JoinChat(JoinChatPayload),
    SendMessage(SendMessagePayload),
    Typing(TypingPayload),
    StopTyping(TypingPayload),
    LeaveChat,
}

// ========================================
// Server → Client
// ========================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityPayload {
    pub identity: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceDeltaPayload {
    pub message: MessageDto,
    pub active_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveUsersPayload {
    pub count: usize,
    pub identities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    IdentityAssigned(IdentityPayload),
    ChatHistory(Vec<MessageDto>),
    UserJoined(PresenceDeltaPayload),
    UserLeft(PresenceDeltaPayload),
    ActiveUsersUpdate(ActiveUsersPayload),
    NewMessage(MessageDto),
    UserTyping(IdentityPayload),
    UserStopTyping(IdentityPayload),
    Error(ErrorPayload),
}
