//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - 接続ごとの送信キュー（`PusherChannel`）を管理
//! - ドメインイベントを DTO に変換し、JSON 文字列として一度だけシリアライズ
//! - キューへの投入（push_to, broadcast）
//!
//! ソケットへの書き込み自体は UI 層の writer タスクが行う。
//! ここでは `try_send` しか使わないため、遅いクライアントがいても
//! 呼び出し側（Broker のクリティカルセクション）は待たされない。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc::error::TrySendError};

use crate::{
    domain::{ChatEvent, ConnectionId, MessagePushError, MessagePusher, PusherChannel},
    infrastructure::dto::websocket::ServerMessage,
};

/// WebSocket を使った MessagePusher 実装
#[derive(Default)]
pub struct WebSocketMessagePusher {
    /// Key: 接続 ID, Value: 送信キュー
    clients: Mutex<HashMap<ConnectionId, PusherChannel>>,
}

impl WebSocketMessagePusher {
    pub fn new() -> Self {
        Self::default()
    }
}

fn encode(event: &ChatEvent) -> Result<String, MessagePushError> {
    let message = ServerMessage::from(event.clone());
    serde_json::to_string(&message).map_err(|e| MessagePushError::Serialization(e.to_string()))
}

fn enqueue(
    connection_id: &ConnectionId,
    sender: &PusherChannel,
    json: String,
) -> Result<(), MessagePushError> {
    sender.try_send(json).map_err(|e| match e {
        TrySendError::Full(_) => MessagePushError::QueueFull(*connection_id),
        TrySendError::Closed(_) => MessagePushError::ChannelClosed(*connection_id),
    })
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel) {
        let mut clients = self.clients.lock().await;
        clients.insert(connection_id, sender);
        tracing::debug!("Connection '{}' registered to MessagePusher", connection_id);
    }

    async fn unregister_client(&self, connection_id: &ConnectionId) {
        let mut clients = self.clients.lock().await;
        if clients.remove(connection_id).is_some() {
            tracing::debug!(
                "Connection '{}' unregistered from MessagePusher",
                connection_id
            );
        }
    }

    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        event: &ChatEvent,
    ) -> Result<(), MessagePushError> {
        let json = encode(event)?;
        let clients = self.clients.lock().await;
        let sender = clients
            .get(connection_id)
            .ok_or(MessagePushError::ClientNotFound(*connection_id))?;

        enqueue(connection_id, sender, json)?;
        tracing::debug!("Pushed '{}' to connection '{}'", event.name(), connection_id);
        Ok(())
    }

    async fn broadcast(&self, targets: &[ConnectionId], event: &ChatEvent) -> Vec<ConnectionId> {
        let json = match encode(event) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("Dropping '{}' broadcast: {}", event.name(), e);
                return Vec::new();
            }
        };

        let clients = self.clients.lock().await;
        let mut failed = Vec::new();
        for target in targets {
            let result = match clients.get(target) {
                Some(sender) => enqueue(target, sender, json.clone()),
                None => Err(MessagePushError::ClientNotFound(*target)),
            };
            if let Err(e) = result {
                tracing::warn!("Failed to deliver '{}': {}", event.name(), e);
                failed.push(*target);
            }
        }

        tracing::debug!(
            "Broadcasted '{}' to {} connection(s), {} failed",
            event.name(),
            targets.len() - failed.len(),
            failed.len()
        );
        failed
    }
}
