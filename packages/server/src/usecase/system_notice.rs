//! UseCase: サーバーからのお知らせ
//!
//! `system` メッセージは ID を消費して全体の順序に並ぶが、履歴には追記しない。

use std::sync::Arc;

use crate::domain::{ChatEvent, ChatMessage};

use super::broker::Broker;

pub struct SystemNoticeUseCase {
    broker: Arc<Broker>,
}

impl SystemNoticeUseCase {
    pub fn new(broker: Arc<Broker>) -> Self {
        Self { broker }
    }

    /// 在室中の全員へお知らせを配信する
    pub async fn execute(&self, text: impl Into<String>) -> ChatMessage {
        let mut room = self.broker.lock().await;
        let id = room.next_message_id();
        let message = ChatMessage::system(id, text.into(), self.broker.now());

        tracing::info!(
            "System notice {} to {} connection(s): {}",
            message.id.value(),
            room.active_count(),
            message.content.as_str()
        );
        self.broker
            .fan_out_all(&mut room, &ChatEvent::NewMessage(message.clone()))
            .await;
        message
    }
}
