//! InMemory History Store 実装
//!
//! ドメイン層が定義する HistoryStore trait の具体的な実装。
//! 容量つきのリングバッファで直近のメッセージだけを保持します。
//! 外部の永続ストアに置き換える場合も、この trait の契約だけを満たせばよい。

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ChatMessage, HistoryStore, RepositoryError};

/// インメモリ履歴ストア
///
/// 容量を超えると最も古いメッセージから捨てる。
pub struct InMemoryHistoryStore {
    capacity: usize,
    messages: Mutex<VecDeque<ChatMessage>>,
}

impl InMemoryHistoryStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            messages: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn load_recent(&self, limit: usize) -> Result<Vec<ChatMessage>, RepositoryError> {
        let messages = self.messages.lock().await;
        let skip = messages.len().saturating_sub(limit);
        Ok(messages.iter().skip(skip).cloned().collect())
    }

    async fn append(&self, message: ChatMessage) -> Result<(), RepositoryError> {
        if self.capacity == 0 {
            return Ok(());
        }

        let mut messages = self.messages.lock().await;
        while messages.len() >= self.capacity {
            messages.pop_front();
        }
        messages.push_back(message);
        Ok(())
    }
}
