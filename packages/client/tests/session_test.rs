//! Client sessions against an in-process server on an ephemeral port.

use std::{sync::Arc, time::Duration};

use tokio::{net::TcpListener, sync::mpsc, task::JoinHandle};
use yorisoi_client::{
    ClientError,
    domain::SessionState,
    input::InputEvent,
    session::{ClientSession, run_connection},
};
use yorisoi_server::{
    config::ChatConfig,
    infrastructure::{message_pusher::WebSocketMessagePusher, repository::InMemoryHistoryStore},
    ui::Server,
    usecase::Broker,
};
use yorisoi_shared::time::SystemClock;

const PROMPT: &str = "test";

async fn start_server() -> (String, JoinHandle<std::io::Result<()>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let config = ChatConfig::default();
    let history = Arc::new(InMemoryHistoryStore::new(config.history_capacity));
    let broker = Arc::new(Broker::new(
        config,
        history,
        Arc::new(WebSocketMessagePusher::new()),
        Arc::new(SystemClock),
    ));
    let handle = tokio::spawn(Server::new(broker).serve(listener, std::future::pending()));

    (format!("ws://{}/ws", addr), handle)
}

#[tokio::test]
async fn test_empty_user_id_is_refused() {
    // テスト項目: 空の userId で参加すると InvalidUser が返り、セッションは Closed になる
    // given (前提条件):
    let (url, server) = start_server().await;
    let mut session = ClientSession::new("");
    let (_tx, mut rx) = mpsc::unbounded_channel::<InputEvent>();

    // when (操作):
    let result = tokio::time::timeout(
        Duration::from_secs(5),
        run_connection(&url, &mut session, &mut rx, PROMPT),
    )
    .await
    .unwrap();

    // then (期待する結果):
    assert!(matches!(result, Err(ClientError::InvalidUser(_))));
    assert_eq!(session.state(), SessionState::Closed);

    server.abort();
}

#[tokio::test]
async fn test_join_then_quit() {
    // テスト項目: 参加後に Quit すると正常終了し、割り当てられた identity が残る
    // given (前提条件):
    let (url, server) = start_server().await;
    let mut session = ClientSession::new("u-1");
    let (tx, mut rx) = mpsc::unbounded_channel::<InputEvent>();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        tx.send(InputEvent::Quit).ok();
    });

    // when (操作):
    let result = tokio::time::timeout(
        Duration::from_secs(5),
        run_connection(&url, &mut session, &mut rx, PROMPT),
    )
    .await
    .unwrap();

    // then (期待する結果):
    assert_eq!(result, Ok(()));
    assert!(session.identity().is_some());
    assert!(session.take_established());
    assert_eq!(session.state(), SessionState::Closed);

    server.abort();
}

#[tokio::test]
async fn test_unreachable_server_moves_to_reconnecting() {
    // テスト項目: 接続できない場合は ConnectionError が返り、Reconnecting になる
    // given (前提条件):
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/ws", listener.local_addr().unwrap());
    drop(listener);
    let mut session = ClientSession::new("u-1");
    let (_tx, mut rx) = mpsc::unbounded_channel::<InputEvent>();

    // when (操作):
    let result = run_connection(&url, &mut session, &mut rx, PROMPT).await;

    // then (期待する結果):
    assert!(matches!(result, Err(ClientError::ConnectionError(_))));
    assert_eq!(session.state(), SessionState::Reconnecting);
}
