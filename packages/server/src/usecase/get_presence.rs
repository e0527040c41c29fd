//! UseCase: 在室状況の取得

use std::sync::Arc;

use crate::domain::PresenceSnapshot;

use super::broker::Broker;

pub struct GetPresenceUseCase {
    broker: Arc<Broker>,
}

impl GetPresenceUseCase {
    pub fn new(broker: Arc<Broker>) -> Self {
        Self { broker }
    }

    /// ロック区間内で取ったスナップショットを返す（進行中の join/leave と混ざらない）
    pub async fn execute(&self) -> PresenceSnapshot {
        self.broker.lock().await.snapshot()
    }
}
