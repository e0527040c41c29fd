//! UseCase: メッセージ送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() メソッド
//! - 検証（空・長さ超過）、レート制限、履歴への追記、全員への配信
//!
//! ### なぜこのテストが必要か
//! - 検証に失敗したメッセージが履歴にも配信にも現れないことを保証
//! - 送信者本人にも配信される（本人の判定はクライアント側）ことを確認
//! - 受理順がそのまま全員の受信順になることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：メッセージ送信とブロードキャスト
//! - 異常系：空のメッセージ、長すぎるメッセージ、レート制限、履歴ストアの障害
//! - エッジケース：切断後に届いたメッセージ（UnknownConnection）

use std::{sync::Arc, time::Instant};

use crate::domain::{
    ChatEvent, ChatMessage, ConnectionId, MessageContent, Room, ValueObjectError,
};

use super::{broker::Broker, error::SendMessageError};

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    broker: Arc<Broker>,
}

impl SendMessageUseCase {
    pub fn new(broker: Arc<Broker>) -> Self {
        Self { broker }
    }

    /// メッセージ送信を実行
    ///
    /// 検証・レート制限・履歴ストアのエラーは送信者にだけ `error` として返す。
    /// `UnknownConnection` は通知せずに破棄する。
    ///
    /// # Returns
    ///
    /// * `Ok(ChatMessage)` - 受理して配信したメッセージ
    /// * `Err(SendMessageError)` - 拒否（履歴への追記も配信もしていない）
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        raw_content: &str,
    ) -> Result<ChatMessage, SendMessageError> {
        let mut room = self.broker.lock().await;

        let Some(sender) = room.identity_of(connection_id).cloned() else {
            tracing::debug!(
                "Dropping message from unknown connection '{}'",
                connection_id
            );
            return Err(SendMessageError::UnknownConnection);
        };

        let max_length = self.broker.config().max_message_length;
        let content = match MessageContent::new(raw_content, max_length) {
            Ok(content) => content,
            Err(ValueObjectError::ContentTooLong { length, max }) => {
                return self
                    .reject(&mut room, connection_id, SendMessageError::TooLong { length, max })
                    .await;
            }
            Err(_) => {
                return self
                    .reject(&mut room, connection_id, SendMessageError::EmptyContent)
                    .await;
            }
        };

        if !room.try_acquire_send_budget(connection_id, Instant::now()) {
            return self
                .reject(&mut room, connection_id, SendMessageError::RateLimited)
                .await;
        }

        let id = room.next_message_id();
        let message = ChatMessage::user(id, sender, content, self.broker.now());
        if let Err(e) = self.broker.history().append(message.clone()).await {
            tracing::error!("Failed to append message {}: {}", message.id.value(), e);
            return self
                .reject(&mut room, connection_id, SendMessageError::HistoryUnavailable)
                .await;
        }

        tracing::info!(
            "Message {} accepted from '{}'",
            message.id.value(),
            connection_id
        );
        self.broker
            .fan_out_all(&mut room, &ChatEvent::NewMessage(message.clone()))
            .await;
        Ok(message)
    }

    /// 送信者にだけ `error` を返す
    async fn reject(
        &self,
        room: &mut Room,
        connection_id: &ConnectionId,
        error: SendMessageError,
    ) -> Result<ChatMessage, SendMessageError> {
        tracing::warn!("Message from '{}' rejected: {}", connection_id, error);
        let event = ChatEvent::Error {
            message: error.to_string(),
        };
        self.broker.push_or_evict(room, connection_id, &event).await;
        Err(error)
    }
}
