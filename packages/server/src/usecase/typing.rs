//! UseCase: 入力中通知
//!
//! 入力中の状態はサーバー側の期限（`typing_expiry`）つきで保持し、
//! バックグラウンドの sweep が期限切れを 1 回だけ stop typing として配信する。
//! 通知は本人には返さない。

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::task::JoinHandle;

use crate::domain::{ChatEvent, ConnectionId, TypingUpdate};

use super::{broker::Broker, error::TypingError};

pub struct TypingUseCase {
    broker: Arc<Broker>,
}

impl TypingUseCase {
    pub fn new(broker: Arc<Broker>) -> Self {
        Self { broker }
    }

    /// 入力中の開始（または期限の延長）。延長では何も配信しない。
    pub async fn start(&self, connection_id: &ConnectionId) -> Result<(), TypingError> {
        let mut room = self.broker.lock().await;
        let update = room
            .start_typing(connection_id, Instant::now())
            .ok_or(TypingError::UnknownConnection)?;

        if let TypingUpdate::Started(identity) = update {
            tracing::debug!("'{}' started typing", identity);
            let targets = room.connection_ids_except(connection_id);
            self.broker
                .fan_out(&mut room, &targets, &ChatEvent::UserTyping { identity })
                .await;
        }
        Ok(())
    }

    /// 入力中の終了。入力中でなければ何もしない。
    pub async fn stop(&self, connection_id: &ConnectionId) -> Result<(), TypingError> {
        let mut room = self.broker.lock().await;
        if !room.is_connected(connection_id) {
            return Err(TypingError::UnknownConnection);
        }

        if let Some(identity) = room.stop_typing(connection_id) {
            tracing::debug!("'{}' stopped typing", identity);
            let targets = room.connection_ids_except(connection_id);
            self.broker
                .fan_out(&mut room, &targets, &ChatEvent::UserStopTyping { identity })
                .await;
        }
        Ok(())
    }

    /// `now` 時点で期限切れのエントリを取り除き、stop typing を配信する。
    /// 取り除いた件数を返す。
    pub async fn sweep_expired_at(&self, now: Instant) -> usize {
        let mut room = self.broker.lock().await;
        let expired = room.sweep_typing(now);
        for (owner, identity) in &expired {
            tracing::debug!("Typing of '{}' expired", identity);
            let targets = room.connection_ids_except(owner);
            let event = ChatEvent::UserStopTyping {
                identity: identity.clone(),
            };
            self.broker.fan_out(&mut room, &targets, &event).await;
        }
        expired.len()
    }

    /// 一定間隔で sweep するタスクを起動する。停止は `JoinHandle::abort`。
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let usecase = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let evicted = usecase.sweep_expired_at(Instant::now()).await;
                if evicted > 0 {
                    tracing::info!("Typing sweep evicted {} entr(ies)", evicted);
                }
            }
        })
    }
}
