//! MessagePusher trait 定義
//!
//! 接続ごとの送信キューへイベントを積むためのインターフェース。
//! 実装（WebSocket）は Infrastructure 層が提供します。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ChatEvent, ConnectionId, MessagePushError};

/// 接続ごとの送信キュー（容量つき）
///
/// 受信側は UI 層の writer タスクが所有し、ソケットへ書き出す。
pub type PusherChannel = mpsc::Sender<String>;

/// MessagePusher trait
///
/// どの操作もブロックしない。キューが満杯、または閉じている場合は
/// 待たずにエラーを返し、呼び出し側がその接続を切断扱いにする。
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// 接続の送信キューを登録
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel);

    /// 接続の送信キューを破棄（未登録なら何もしない）
    async fn unregister_client(&self, connection_id: &ConnectionId);

    /// 1 接続へイベントを送信
    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        event: &ChatEvent,
    ) -> Result<(), MessagePushError>;

    /// 複数の接続へイベントを送信
    ///
    /// 一部の失敗は許容し、配送できなかった接続 ID を返す。
    async fn broadcast(&self, targets: &[ConnectionId], event: &ChatEvent) -> Vec<ConnectionId>;
}
