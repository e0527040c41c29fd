//! メッセージ送信（通知）の実装
//!
//! - `websocket`: 接続ごとの送信キュー（WebSocket writer タスクが消費）

pub mod websocket;

pub use websocket::WebSocketMessagePusher;
