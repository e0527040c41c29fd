//! ドメイン層のエラー型

use thiserror::Error;

use super::ConnectionId;

/// Value Object の生成時に発生するエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    /// 外部ユーザー ID が空
    #[error("user id must not be empty")]
    EmptyUserId,

    /// メッセージ本文が空（trim 後）
    #[error("message content must not be empty")]
    EmptyContent,

    /// メッセージ本文が上限を超えている
    #[error("message content is too long ({length} > {max} characters)")]
    ContentTooLong { length: usize, max: usize },

    /// 匿名表示名が空
    #[error("anonymous identity must not be empty")]
    EmptyIdentity,
}

/// 履歴ストアへのアクセスで発生するエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// ストアが利用できない
    #[error("history store unavailable: {0}")]
    Unavailable(String),
}

/// メッセージ送信（通知）で発生するエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    /// 送信先の接続が登録されていない
    #[error("connection {0} is not registered")]
    ClientNotFound(ConnectionId),

    /// 送信キューが満杯（クライアントが詰まっている）
    #[error("outbound queue for connection {0} is full")]
    QueueFull(ConnectionId),

    /// 送信キューが閉じている（writer タスクが終了済み）
    #[error("outbound queue for connection {0} is closed")]
    ChannelClosed(ConnectionId),

    /// イベントのシリアライズに失敗
    #[error("failed to serialize event: {0}")]
    Serialization(String),
}
