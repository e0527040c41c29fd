//! Broker: 共有状態の単一ライター
//!
//! Room 集約（在室・入力中・レート制限・ID 採番）を 1 つの非同期 Mutex で保持し、
//! 各ユースケースはロックを取ったまま「状態の変更 → 履歴への追記 → 配信キューへの投入」
//! までを行う。ロック区間の順序がそのままメッセージの全順序になる。
//!
//! 配信キューへの投入は `try_send` なので、ロック区間が遅いクライアントを待つことはない。
//! 投入に失敗した接続はその場で切断扱い（暗黙の leave）にする。

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};
use yorisoi_shared::time::Clock;

use crate::{
    config::ChatConfig,
    domain::{
        ChatEvent, Connection, ConnectionId, Departure, HistoryStore, IdentityAssigner,
        MessagePusher, Room, Timestamp,
    },
};

pub struct Broker {
    room: Mutex<Room>,
    history: Arc<dyn HistoryStore>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
    identity_assigner: IdentityAssigner,
    config: ChatConfig,
}

impl Broker {
    pub fn new(
        config: ChatConfig,
        history: Arc<dyn HistoryStore>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            room: Mutex::new(Room::new(config.typing_expiry, config.rate_limit)),
            history,
            message_pusher,
            clock,
            identity_assigner: IdentityAssigner::new(config.identity_attempts),
            config,
        }
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    pub(crate) async fn lock(&self) -> MutexGuard<'_, Room> {
        self.room.lock().await
    }

    pub(crate) fn history(&self) -> &dyn HistoryStore {
        self.history.as_ref()
    }

    pub(crate) fn message_pusher(&self) -> &dyn MessagePusher {
        self.message_pusher.as_ref()
    }

    pub(crate) fn identity_assigner(&self) -> &IdentityAssigner {
        &self.identity_assigner
    }

    pub(crate) fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }

    /// 1 接続へ送信。失敗したらその接続を切断扱いにし、`false` を返す。
    pub(crate) async fn push_or_evict(
        &self,
        room: &mut Room,
        connection_id: &ConnectionId,
        event: &ChatEvent,
    ) -> bool {
        match self.message_pusher.push_to(connection_id, event).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to push '{}': {}", event.name(), e);
                self.evict(room, vec![*connection_id]).await;
                false
            }
        }
    }

    /// 複数の接続へ配信し、配送できなかった接続を切断扱いにする。
    pub(crate) async fn fan_out(&self, room: &mut Room, targets: &[ConnectionId], event: &ChatEvent) {
        let failed = self.message_pusher.broadcast(targets, event).await;
        self.evict(room, failed).await;
    }

    /// 在室中の全接続へ配信する。
    pub(crate) async fn fan_out_all(&self, room: &mut Room, event: &ChatEvent) {
        let targets = room.connection_ids();
        self.fan_out(room, &targets, event).await;
    }

    /// 接続を取り除き、退出を通知する。未登録なら `None`。
    pub(crate) async fn remove_connection(
        &self,
        room: &mut Room,
        connection_id: &ConnectionId,
    ) -> Option<Connection> {
        let departure = room.leave(connection_id, self.now())?;
        self.message_pusher.unregister_client(connection_id).await;
        let connection = departure.connection.clone();

        let failed = self.announce_departure(room, departure).await;
        self.evict(room, failed).await;
        Some(connection)
    }

    /// 配送失敗による切断。退出通知の配送に失敗した接続も同じように切断する（連鎖）。
    /// 切断される接続ごとに `user_left` はちょうど 1 回だけ出る。
    async fn evict(&self, room: &mut Room, connection_ids: Vec<ConnectionId>) {
        let mut pending = connection_ids;
        while let Some(connection_id) = pending.pop() {
            let Some(departure) = room.leave(&connection_id, self.now()) else {
                continue;
            };
            self.message_pusher.unregister_client(&connection_id).await;
            tracing::warn!(
                "Evicted connection '{}' ({}) after transport failure",
                connection_id,
                departure.connection.identity
            );
            pending.extend(self.announce_departure(room, departure).await);
        }
    }

    /// 残っている全接続へ stop typing（必要なら）/ user_left / active_users_update を送る。
    /// 配送に失敗した接続 ID を返す。
    async fn announce_departure(&self, room: &Room, departure: Departure) -> Vec<ConnectionId> {
        let targets = room.connection_ids();
        let mut failed = Vec::new();

        if let Some(identity) = departure.stopped_typing {
            let event = ChatEvent::UserStopTyping { identity };
            failed.extend(self.message_pusher.broadcast(&targets, &event).await);
        }

        let left = ChatEvent::UserLeft {
            message: departure.message,
            active_count: departure.active_count,
        };
        failed.extend(self.message_pusher.broadcast(&targets, &left).await);

        let update = ChatEvent::ActiveUsersUpdate(room.snapshot());
        failed.extend(self.message_pusher.broadcast(&targets, &update).await);

        failed.sort();
        failed.dedup();
        failed
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! ユースケースのテストで共有するヘルパー

    use std::sync::Arc;

    use tokio::sync::mpsc;
    use yorisoi_shared::time::FixedClock;

    use super::Broker;
    use crate::{
        config::ChatConfig,
        domain::{ConnectionId, HistoryStore, MessagePusher},
        infrastructure::{
            dto::websocket::ServerMessage, message_pusher::WebSocketMessagePusher,
            repository::InMemoryHistoryStore,
        },
    };

    pub const NOW: i64 = 1_700_000_000_000;

    pub fn broker_with(config: ChatConfig, history: Arc<dyn HistoryStore>) -> Arc<Broker> {
        let pusher: Arc<dyn MessagePusher> = Arc::new(WebSocketMessagePusher::new());
        Arc::new(Broker::new(
            config,
            history,
            pusher,
            Arc::new(FixedClock::new(NOW)),
        ))
    }

    pub fn broker() -> Arc<Broker> {
        let config = ChatConfig::default();
        let history = Arc::new(InMemoryHistoryStore::new(config.history_capacity));
        broker_with(config, history)
    }

    /// テスト用の接続（送信キューの受信側を保持する）
    pub struct TestClient {
        pub id: ConnectionId,
        pub rx: mpsc::Receiver<String>,
    }

    impl TestClient {
        pub fn new(capacity: usize) -> (Self, mpsc::Sender<String>) {
            let (tx, rx) = mpsc::channel(capacity);
            (
                Self {
                    id: ConnectionId::generate(),
                    rx,
                },
                tx,
            )
        }

        /// キューに溜まっているイベントを全て取り出す
        pub fn drain(&mut self) -> Vec<ServerMessage> {
            let mut events = Vec::new();
            while let Ok(json) = self.rx.try_recv() {
                events.push(serde_json::from_str(&json).unwrap());
            }
            events
        }

        /// キューに溜まっているイベント名を全て取り出す
        pub fn drain_names(&mut self) -> Vec<String> {
            let mut names = Vec::new();
            while let Ok(json) = self.rx.try_recv() {
                let value: serde_json::Value = serde_json::from_str(&json).unwrap();
                names.push(value["event"].as_str().unwrap_or_default().to_string());
            }
            names
        }
    }
}
