//! UseCase: 不正なフレームへのエラー通知
//!
//! パースできないフレームなど、UI 層で検出したエラーを本人にだけ返す。

use std::sync::Arc;

use crate::domain::{ChatEvent, ConnectionId};

use super::broker::Broker;

pub struct NotifyErrorUseCase {
    broker: Arc<Broker>,
}

impl NotifyErrorUseCase {
    pub fn new(broker: Arc<Broker>) -> Self {
        Self { broker }
    }

    /// 本人へ `error` を送る。配送できなければ切断扱いになる。
    pub async fn execute(&self, connection_id: &ConnectionId, message: impl Into<String>) {
        let mut room = self.broker.lock().await;
        let event = ChatEvent::Error {
            message: message.into(),
        };
        self.broker
            .push_or_evict(&mut room, connection_id, &event)
            .await;
    }
}
