//! Infrastructure layer
//!
//! ドメイン層の trait（HistoryStore / MessagePusher）の具体的な実装と、
//! 外部との入出力に使う DTO を提供します。

pub mod dto;
pub mod message_pusher;
pub mod repository;
