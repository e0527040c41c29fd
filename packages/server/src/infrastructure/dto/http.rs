//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

use super::websocket::MessageType;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceDto {
    pub count: usize,
    pub identities: Vec<String>,
}

/// History entry with a human-readable timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryMessageDto {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: MessageType,
    /// RFC 3339, UTC.
    pub timestamp: String,
}
