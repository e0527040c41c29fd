//! Repository trait 定義
//!
//! メッセージ履歴の永続化インターフェース。ドメイン層が定義し、
//! Infrastructure 層が実装します（依存性の逆転）。

use async_trait::async_trait;

use super::{ChatMessage, RepositoryError};

/// 履歴ストア
///
/// 追記順を保持し、直近の N 件を古い順で返す。
/// 追記は Broker のクリティカルセクション内で呼ばれるため、
/// 実装側で順序を入れ替えてはならない。
///
/// `load_recent` と `append` はどちらも Broker のロックを保持したまま await される
/// （join 時の取得をロック内で行うことで、再送した履歴とその後の配信の間に抜けが出ない）。
/// その間は全接続の送信・入力通知・退出が待たされるため、実装は応答時間に上限を持つこと。
/// 遅い永続ストアを繋ぐ場合は、実装側でタイムアウトして `RepositoryError::Unavailable` を返す。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// 直近 `limit` 件を古い順で取得
    async fn load_recent(&self, limit: usize) -> Result<Vec<ChatMessage>, RepositoryError>;

    /// メッセージを追記
    async fn append(&self, message: ChatMessage) -> Result<(), RepositoryError>;
}
