//! Entities
//!
//! - `ChatMessage`: 生成後は不変のメッセージ
//! - `Connection`: アクティブな 1 接続

use super::value_object::{
    AnonymousIdentity, ConnectionId, MessageContent, MessageId, Timestamp, UserId,
};

/// メッセージ種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// 参加者が送信したメッセージ
    Message,
    /// 参加通知
    Join,
    /// 退出通知
    Leave,
    /// サーバーからのお知らせ
    System,
}

/// チャットメッセージ
///
/// ID とタイムスタンプは常にサーバーが付与する。`System` のみ送信者を持たない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: MessageId,
    pub sender: Option<AnonymousIdentity>,
    pub content: MessageContent,
    pub kind: MessageKind,
    pub created_at: Timestamp,
}

impl ChatMessage {
    /// 参加者が送信したメッセージ
    pub fn user(
        id: MessageId,
        sender: AnonymousIdentity,
        content: MessageContent,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            sender: Some(sender),
            content,
            kind: MessageKind::Message,
            created_at,
        }
    }

    /// 参加通知
    pub fn joined(id: MessageId, identity: AnonymousIdentity, created_at: Timestamp) -> Self {
        let content = MessageContent::notice(format!("{} joined the chat", identity));
        Self {
            id,
            sender: Some(identity),
            content,
            kind: MessageKind::Join,
            created_at,
        }
    }

    /// 退出通知
    pub fn left(id: MessageId, identity: AnonymousIdentity, created_at: Timestamp) -> Self {
        let content = MessageContent::notice(format!("{} left the chat", identity));
        Self {
            id,
            sender: Some(identity),
            content,
            kind: MessageKind::Leave,
            created_at,
        }
    }

    /// サーバーからのお知らせ
    pub fn system(id: MessageId, text: String, created_at: Timestamp) -> Self {
        Self {
            id,
            sender: None,
            content: MessageContent::notice(text),
            kind: MessageKind::System,
            created_at,
        }
    }
}

/// アクティブな接続
///
/// 接続管理だけが所有し、切断とともに破棄される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub id: ConnectionId,
    pub user_id: UserId,
    pub identity: AnonymousIdentity,
    pub connected_at: Timestamp,
}

impl Connection {
    pub fn new(
        id: ConnectionId,
        user_id: UserId,
        identity: AnonymousIdentity,
        connected_at: Timestamp,
    ) -> Self {
        Self {
            id,
            user_id,
            identity,
            connected_at,
        }
    }
}
