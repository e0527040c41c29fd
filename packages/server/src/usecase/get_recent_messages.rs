//! UseCase: 直近の履歴の取得（HTTP 用）

use std::sync::Arc;

use crate::domain::{ChatMessage, RepositoryError};

use super::broker::Broker;

pub struct GetRecentMessagesUseCase {
    broker: Arc<Broker>,
}

impl GetRecentMessagesUseCase {
    pub fn new(broker: Arc<Broker>) -> Self {
        Self { broker }
    }

    /// `limit` 省略時は `history_limit`。`history_capacity` を上限に切り詰める。
    pub async fn execute(&self, limit: Option<usize>) -> Result<Vec<ChatMessage>, RepositoryError> {
        let config = self.broker.config();
        let limit = limit
            .unwrap_or(config.history_limit)
            .min(config.history_capacity);
        self.broker.history().load_recent(limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::ChatConfig,
        domain::MockHistoryStore,
        usecase::broker::test_support::broker_with,
    };

    fn usecase_expecting(limit: usize) -> GetRecentMessagesUseCase {
        let mut history = MockHistoryStore::new();
        history
            .expect_load_recent()
            .withf(move |l| *l == limit)
            .times(1)
            .returning(|_| Ok(Vec::new()));
        let config = ChatConfig {
            history_limit: 50,
            history_capacity: 100,
            ..ChatConfig::default()
        };
        GetRecentMessagesUseCase::new(broker_with(config, Arc::new(history)))
    }

    #[tokio::test]
    async fn test_default_limit() {
        // テスト項目: limit 省略時は history_limit が使われる
        // given (前提条件):
        let usecase = usecase_expecting(50);

        // when (操作):
        let result = usecase.execute(None).await;

        // then (期待する結果):
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_limit_is_capped_by_capacity() {
        // テスト項目: limit は history_capacity で切り詰められる
        // given (前提条件):
        let usecase = usecase_expecting(100);

        // when (操作):
        let result = usecase.execute(Some(10_000)).await;

        // then (期待する結果):
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_store_failure_is_propagated() {
        // テスト項目: ストアの障害はそのまま返される
        // given (前提条件):
        let mut history = MockHistoryStore::new();
        history
            .expect_load_recent()
            .returning(|_| Err(RepositoryError::Unavailable("down".to_string())));
        let usecase =
            GetRecentMessagesUseCase::new(broker_with(ChatConfig::default(), Arc::new(history)));

        // when (操作):
        let result = usecase.execute(Some(5)).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(RepositoryError::Unavailable("down".to_string()))
        );
    }
}
