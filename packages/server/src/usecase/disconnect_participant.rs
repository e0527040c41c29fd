//! UseCase: 参加者切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectParticipantUseCase::execute() メソッド
//! - 在室からの削除、退出通知、入力中エントリの解放
//!
//! ### なぜこのテストが必要か
//! - join 直後の leave でも user_joined / user_left がちょうど 1 回ずつになることを保証
//! - 入力中のまま切断した参加者について stop typing が 1 回だけ届くことを確認
//! - 既に片付けられた接続の二重切断が何も起こさないことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：参加者の退出
//! - 異常系：未登録の接続の切断
//! - エッジケース：入力中の切断、退出通知の配送失敗による連鎖切断

use std::sync::Arc;

use crate::domain::{AnonymousIdentity, ConnectionId};

use super::{broker::Broker, error::ConnectError};

/// 参加者切断のユースケース
pub struct DisconnectParticipantUseCase {
    broker: Arc<Broker>,
}

impl DisconnectParticipantUseCase {
    pub fn new(broker: Arc<Broker>) -> Self {
        Self { broker }
    }

    /// 参加者切断を実行
    ///
    /// 明示的な `leave_chat` とトランスポートの切断のどちらからも呼ばれる。
    /// 既に切断扱いになっている接続では `UnknownConnection` を返し、何も通知しない。
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
    ) -> Result<AnonymousIdentity, ConnectError> {
        let mut room = self.broker.lock().await;
        match self.broker.remove_connection(&mut room, connection_id).await {
            Some(connection) => {
                tracing::info!(
                    "User '{}' left as '{}' ({} active)",
                    connection.user_id.as_str(),
                    connection.identity,
                    room.active_count()
                );
                Ok(connection.identity)
            }
            None => {
                tracing::debug!("Connection '{}' already removed", connection_id);
                Err(ConnectError::UnknownConnection)
            }
        }
    }
}
