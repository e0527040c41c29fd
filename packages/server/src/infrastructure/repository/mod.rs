//! 履歴ストアの実装
//!
//! - `inmemory`: プロセス内のリングバッファ

pub mod inmemory;

pub use inmemory::InMemoryHistoryStore;
