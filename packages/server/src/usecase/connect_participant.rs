//! UseCase: 参加者接続処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectParticipantUseCase::execute() / rejoin() メソッド
//! - 匿名 ID の払い出し、在室登録、履歴の再送、参加通知のブロードキャスト
//!
//! ### なぜこのテストが必要か
//! - 新しい接続だけが履歴を受け取り、参加通知は全員（本人を含む）に届くことを保証
//! - 払い出した匿名 ID が在室中の ID と重複しないことを確認
//! - 再 join で在室数が二重にカウントされないことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：新規参加、既存参加者への通知、同じ接続からの再 join
//! - 異常系：空のユーザー ID、履歴ストアの障害
//! - エッジケース：送信キューが小さすぎて本人への配送に失敗する場合

use std::sync::Arc;

use crate::domain::{
    AnonymousIdentity, ChatEvent, ChatMessage, Connection, ConnectionId, PusherChannel, Room,
    UserId,
};

use super::{broker::Broker, error::ConnectError};

/// 参加者接続のユースケース
pub struct ConnectParticipantUseCase {
    broker: Arc<Broker>,
}

impl ConnectParticipantUseCase {
    pub fn new(broker: Arc<Broker>) -> Self {
        Self { broker }
    }

    /// 参加者接続を実行
    ///
    /// 1 つのロック区間で以下を順に行う:
    /// 1. 匿名 ID を払い出す
    /// 2. 本人へ `identity_assigned` と `chat_history` を送る
    /// 3. 在室登録し、全員へ `user_joined` と `active_users_update` を送る
    ///
    /// # Returns
    ///
    /// * `Ok(AnonymousIdentity)` - 払い出した匿名 ID
    /// * `Err(ConnectError::InvalidUser)` - ユーザー ID が空（在室登録前に拒否）
    /// * `Err(ConnectError::TransportFailure)` - 本人への配送に失敗
    pub async fn execute(
        &self,
        connection_id: ConnectionId,
        raw_user_id: String,
        sender: PusherChannel,
    ) -> Result<AnonymousIdentity, ConnectError> {
        let user_id = UserId::new(raw_user_id).map_err(|_| ConnectError::InvalidUser)?;
        let pusher = self.broker.message_pusher();
        let mut room = self.broker.lock().await;

        if room.is_connected(&connection_id) {
            return self.resend_greeting(&mut room, &connection_id).await;
        }

        // 1. 匿名 ID の払い出し
        let identity = {
            let mut rng = rand::thread_rng();
            self.broker
                .identity_assigner()
                .assign(&user_id, &room.active_identities(), &mut rng)
        };

        // 2. 本人への ID 通知と履歴の再送（在室登録前なので他の参加者には影響しない）
        pusher.register_client(connection_id, sender).await;
        let history = self.load_history().await;
        let greeting = [
            ChatEvent::IdentityAssigned {
                identity: identity.clone(),
            },
            ChatEvent::ChatHistory { messages: history },
        ];
        for event in &greeting {
            if let Err(e) = pusher.push_to(&connection_id, event).await {
                tracing::warn!(
                    "Failed to greet connection '{}' ({}): {}",
                    connection_id,
                    identity,
                    e
                );
                pusher.unregister_client(&connection_id).await;
                return Err(ConnectError::TransportFailure);
            }
        }

        // 3. 在室登録と参加通知
        let connection = Connection::new(
            connection_id,
            user_id.clone(),
            identity.clone(),
            self.broker.now(),
        );
        let (message, active_count) = room.join(connection, self.broker.now());
        tracing::info!(
            "User '{}' joined as '{}' ({} active)",
            user_id.as_str(),
            identity,
            active_count
        );
        self.broker
            .fan_out_all(
                &mut room,
                &ChatEvent::UserJoined {
                    message,
                    active_count,
                },
            )
            .await;
        let snapshot = room.snapshot();
        self.broker
            .fan_out_all(&mut room, &ChatEvent::ActiveUsersUpdate(snapshot))
            .await;

        if room.is_connected(&connection_id) {
            Ok(identity)
        } else {
            Err(ConnectError::TransportFailure)
        }
    }

    /// 同じ接続からの再 join
    ///
    /// 在室状態は変えず、本人にだけ `identity_assigned` / `chat_history` /
    /// `active_users_update` を送り直す。
    pub async fn rejoin(
        &self,
        connection_id: &ConnectionId,
    ) -> Result<AnonymousIdentity, ConnectError> {
        let mut room = self.broker.lock().await;
        self.resend_greeting(&mut room, connection_id).await
    }

    async fn resend_greeting(
        &self,
        room: &mut Room,
        connection_id: &ConnectionId,
    ) -> Result<AnonymousIdentity, ConnectError> {
        let identity = room
            .identity_of(connection_id)
            .cloned()
            .ok_or(ConnectError::UnknownConnection)?;

        let history = self.load_history().await;
        let events = [
            ChatEvent::IdentityAssigned {
                identity: identity.clone(),
            },
            ChatEvent::ChatHistory { messages: history },
            ChatEvent::ActiveUsersUpdate(room.snapshot()),
        ];
        for event in &events {
            if !self
                .broker
                .push_or_evict(room, connection_id, event)
                .await
            {
                return Err(ConnectError::TransportFailure);
            }
        }

        tracing::debug!("Connection '{}' re-joined as '{}'", connection_id, identity);
        Ok(identity)
    }

    /// 直近の履歴を取得。ストア障害時は空の履歴で続行する。
    async fn load_history(&self) -> Vec<ChatMessage> {
        let limit = self.broker.config().history_limit;
        match self.broker.history().load_recent(limit).await {
            Ok(messages) => messages,
            Err(e) => {
                tracing::warn!("Replaying empty history: {}", e);
                Vec::new()
            }
        }
    }

    /// 現在の在室数
    pub async fn active_count(&self) -> usize {
        self.broker.lock().await.active_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::ChatConfig,
        domain::{MockHistoryStore, RepositoryError},
        infrastructure::dto::websocket::{MessageType, ServerMessage},
        usecase::broker::test_support::{TestClient, broker, broker_with},
    };

    #[tokio::test]
    async fn test_connect_first_participant() {
        // テスト項目: 最初の参加者に ID 通知、空の履歴、参加通知、在室スナップショットが順に届く
        // given (前提条件):
        let usecase = ConnectParticipantUseCase::new(broker());
        let (mut alice, tx) = TestClient::new(16);

        // when (操作):
        let identity = usecase
            .execute(alice.id, "user-alice".to_string(), tx)
            .await
            .unwrap();

        // then (期待する結果):
        let events = alice.drain();
        assert_eq!(events.len(), 4);
        assert!(matches!(
            &events[0],
            ServerMessage::IdentityAssigned(p) if p.identity == identity.as_str()
        ));
        assert!(matches!(&events[1], ServerMessage::ChatHistory(h) if h.is_empty()));
        match &events[2] {
            ServerMessage::UserJoined(p) => {
                assert_eq!(p.active_count, 1);
                assert_eq!(p.message.kind, MessageType::Join);
                assert_eq!(p.message.sender.as_deref(), Some(identity.as_str()));
            }
            other => panic!("unexpected event: {:?}", other),
        }
        match &events[3] {
            ServerMessage::ActiveUsersUpdate(p) => {
                assert_eq!(p.count, 1);
                assert_eq!(p.identities, vec![identity.as_str().to_string()]);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_connect_notifies_existing_participants_without_history() {
        // テスト項目: 既存の参加者には参加通知だけが届き、履歴や ID 通知は届かない
        // given (前提条件):
        let usecase = ConnectParticipantUseCase::new(broker());
        let (mut alice, alice_tx) = TestClient::new(16);
        let (mut bob, bob_tx) = TestClient::new(16);
        usecase
            .execute(alice.id, "user-alice".to_string(), alice_tx)
            .await
            .unwrap();
        alice.drain();

        // when (操作):
        usecase
            .execute(bob.id, "user-bob".to_string(), bob_tx)
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(
            alice.drain_names(),
            vec!["user_joined", "active_users_update"]
        );
        assert_eq!(
            bob.drain_names(),
            vec![
                "identity_assigned",
                "chat_history",
                "user_joined",
                "active_users_update"
            ]
        );
        assert_eq!(usecase.active_count().await, 2);
    }

    #[tokio::test]
    async fn test_connect_assigns_distinct_identities() {
        // テスト項目: 同じユーザー ID でも接続ごとに重複しない匿名 ID が払い出される
        // given (前提条件):
        let usecase = ConnectParticipantUseCase::new(broker());
        let mut identities = Vec::new();
        let mut clients = Vec::new();

        // when (操作):
        for _ in 0..20 {
            let (client, tx) = TestClient::new(64);
            let identity = usecase
                .execute(client.id, "same-user".to_string(), tx)
                .await
                .unwrap();
            identities.push(identity);
            clients.push(client);
        }

        // then (期待する結果):
        let mut unique = identities.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), identities.len());
        assert_eq!(usecase.active_count().await, 20);
    }

    #[tokio::test]
    async fn test_connect_rejects_empty_user_id() {
        // テスト項目: 空のユーザー ID は在室登録前に拒否される
        // given (前提条件):
        let usecase = ConnectParticipantUseCase::new(broker());
        let (mut alice, tx) = TestClient::new(16);

        // when (操作):
        let result = usecase.execute(alice.id, "   ".to_string(), tx).await;

        // then (期待する結果):
        assert_eq!(result, Err(ConnectError::InvalidUser));
        assert!(alice.drain().is_empty());
        assert_eq!(usecase.active_count().await, 0);
    }

    #[tokio::test]
    async fn test_rejoin_does_not_double_count() {
        // テスト項目: 同じ接続から再 join しても在室数は変わらず、本人にだけ再送される
        // given (前提条件):
        let usecase = ConnectParticipantUseCase::new(broker());
        let (mut alice, alice_tx) = TestClient::new(16);
        let (mut bob, bob_tx) = TestClient::new(16);
        let alice_identity = usecase
            .execute(alice.id, "user-alice".to_string(), alice_tx)
            .await
            .unwrap();
        usecase
            .execute(bob.id, "user-bob".to_string(), bob_tx)
            .await
            .unwrap();
        alice.drain();
        bob.drain();

        // when (操作):
        let identity = usecase.rejoin(&alice.id).await.unwrap();

        // then (期待する結果):
        assert_eq!(identity, alice_identity);
        assert_eq!(
            alice.drain_names(),
            vec!["identity_assigned", "chat_history", "active_users_update"]
        );
        assert!(bob.drain().is_empty());
        assert_eq!(usecase.active_count().await, 2);
    }

    #[tokio::test]
    async fn test_rejoin_unknown_connection() {
        // テスト項目: 在室していない接続の再 join は UnknownConnection
        // given (前提条件):
        let usecase = ConnectParticipantUseCase::new(broker());

        // when (操作):
        let result = usecase.rejoin(&ConnectionId::generate()).await;

        // then (期待する結果):
        assert_eq!(result, Err(ConnectError::UnknownConnection));
    }

    #[tokio::test]
    async fn test_connect_with_unavailable_history_replays_empty() {
        // テスト項目: 履歴ストアの障害時も参加でき、空の履歴が届く
        // given (前提条件):
        let mut history = MockHistoryStore::new();
        history
            .expect_load_recent()
            .returning(|_| Err(RepositoryError::Unavailable("down".to_string())));
        let usecase =
            ConnectParticipantUseCase::new(broker_with(ChatConfig::default(), Arc::new(history)));
        let (mut alice, tx) = TestClient::new(16);

        // when (操作):
        let result = usecase.execute(alice.id, "user-alice".to_string(), tx).await;

        // then (期待する結果):
        assert!(result.is_ok());
        let events = alice.drain();
        assert!(matches!(&events[1], ServerMessage::ChatHistory(h) if h.is_empty()));
    }

    #[tokio::test]
    async fn test_connect_replays_history_with_configured_limit() {
        // テスト項目: 履歴は設定された件数で取得される
        // given (前提条件):
        let mut history = MockHistoryStore::new();
        history
            .expect_load_recent()
            .withf(|limit| *limit == 2)
            .times(1)
            .returning(|_| Ok(Vec::new()));
        let config = ChatConfig {
            history_limit: 2,
            ..ChatConfig::default()
        };
        let usecase = ConnectParticipantUseCase::new(broker_with(config, Arc::new(history)));
        let (alice, tx) = TestClient::new(16);

        // when (操作):
        let result = usecase.execute(alice.id, "user-alice".to_string(), tx).await;

        // then (期待する結果):
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_connect_fails_when_own_queue_is_too_small() {
        // テスト項目: 本人の送信キューに挨拶が入りきらない場合は TransportFailure で、在室登録されない
        // given (前提条件):
        let usecase = ConnectParticipantUseCase::new(broker());
        let (alice, tx) = TestClient::new(1);

        // when (操作):
        let result = usecase
            .execute(alice.id, "user-alice".to_string(), tx)
            .await;

        // then (期待する結果):
        assert_eq!(result, Err(ConnectError::TransportFailure));
        assert_eq!(usecase.active_count().await, 0);
    }

    #[tokio::test]
    async fn test_join_message_names_identity() {
        // テスト項目: 参加通知の本文は匿名 ID を含む
        // given (前提条件):
        let usecase = ConnectParticipantUseCase::new(broker());
        let (mut alice, tx) = TestClient::new(16);

        // when (操作):
        let identity = usecase
            .execute(alice.id, "user-alice".to_string(), tx)
            .await
            .unwrap();

        // then (期待する結果):
        let joined = alice
            .drain()
            .into_iter()
            .find_map(|e| match e {
                ServerMessage::UserJoined(p) => Some(p.message),
                _ => None,
            })
            .unwrap();
        assert_eq!(joined.content, format!("{} joined the chat", identity));
        assert_eq!(joined.kind, MessageType::Join);
    }

    #[tokio::test]
    async fn test_resend_greeting_on_join_for_joined_connection() {
        // テスト項目: 参加済みの接続が execute を再度呼ぶと、同じロック区間で本人にだけ再送される
        // given (前提条件):
        let usecase = ConnectParticipantUseCase::new(broker());
        let (mut alice, alice_tx) = TestClient::new(16);
        let identity = usecase
            .execute(alice.id, "user-alice".to_string(), alice_tx.clone())
            .await
            .unwrap();
        alice.drain();

        // when (操作):
        let again = usecase
            .execute(alice.id, "user-alice".to_string(), alice_tx)
            .await;

        // then (期待する結果):
        assert_eq!(again, Ok(identity));
        assert_eq!(
            alice.drain_names(),
            vec!["identity_assigned", "chat_history", "active_users_update"]
        );
        assert_eq!(usecase.active_count().await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_joins_and_leaves_keep_presence_consistent() {
        // テスト項目: 並行した参加・退出の中でも、各 active_users_update の人数は一覧の長さと一致し、
        //            直前の更新から ±1 だけ変化し、最終的な人数は残った接続数と一致する
        // given (前提条件):
        let broker = broker();
        let connect = Arc::new(ConnectParticipantUseCase::new(broker.clone()));
        let disconnect = Arc::new(crate::usecase::DisconnectParticipantUseCase::new(
            broker.clone(),
        ));
        let (mut observer, observer_tx) = TestClient::new(4096);
        connect
            .execute(observer.id, "observer".to_string(), observer_tx)
            .await
            .unwrap();
        observer.drain();

        // when (操作):
        let mut tasks = Vec::new();
        for i in 0..32 {
            let connect = connect.clone();
            let disconnect = disconnect.clone();
            tasks.push(tokio::spawn(async move {
                let (client, tx) = TestClient::new(4096);
                connect
                    .execute(client.id, format!("user-{}", i), tx)
                    .await
                    .unwrap();
                tokio::task::yield_now().await;
                let leaves = i % 2 == 0;
                if leaves {
                    disconnect.execute(&client.id).await.unwrap();
                }
                (client, leaves)
            }));
        }
        let mut survivors = Vec::new();
        for task in tasks {
            let (client, left) = task.await.unwrap();
            if !left {
                survivors.push(client);
            }
        }

        // then (期待する結果):
        let counts: Vec<usize> = observer
            .drain()
            .into_iter()
            .filter_map(|e| match e {
                ServerMessage::ActiveUsersUpdate(p) => {
                    assert_eq!(p.count, p.identities.len());
                    Some(p.count)
                }
                _ => None,
            })
            .collect();
        assert_eq!(counts.len(), 32 + 16);
        let mut previous = 1;
        for count in &counts {
            assert_eq!(count.abs_diff(previous), 1);
            previous = *count;
        }
        assert_eq!(previous, 1 + survivors.len());
        assert_eq!(connect.active_count().await, 1 + survivors.len());
    }
}
