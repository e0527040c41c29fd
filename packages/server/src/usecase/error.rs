//! UseCase 層のエラー型

use thiserror::Error;

/// 接続ライフサイクル（join / rejoin / leave）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    /// join 時のユーザー ID が欠けている、または空
    #[error("invalid user: a non-empty userId is required")]
    InvalidUser,

    /// サーバー側で既に片付けられた接続
    #[error("unknown connection")]
    UnknownConnection,

    /// 接続自身への配送に失敗した（切断扱い）
    #[error("transport failure")]
    TransportFailure,
}

/// メッセージ送信のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendMessageError {
    #[error("message content must not be empty")]
    EmptyContent,

    #[error("message is too long ({length} > {max} characters)")]
    TooLong { length: usize, max: usize },

    #[error("rate limit exceeded, please slow down")]
    RateLimited,

    #[error("unknown connection")]
    UnknownConnection,

    /// 履歴ストアへの追記に失敗（メッセージは配信されない）
    #[error("message history is unavailable, please try again")]
    HistoryUnavailable,
}

/// 入力中通知のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypingError {
    #[error("unknown connection")]
    UnknownConnection,
}
