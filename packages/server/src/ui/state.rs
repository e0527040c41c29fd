//! Server state shared by all handlers.

use std::{sync::Arc, time::Duration};

use crate::usecase::{
    Broker, ConnectParticipantUseCase, DisconnectParticipantUseCase, GetPresenceUseCase,
    GetRecentMessagesUseCase, NotifyErrorUseCase, SendMessageUseCase, SystemNoticeUseCase,
    TypingUseCase,
};

/// Shared application state
pub struct AppState {
    /// ConnectParticipantUseCase（参加・再参加）
    pub connect_participant_usecase: Arc<ConnectParticipantUseCase>,
    /// DisconnectParticipantUseCase（退出・切断）
    pub disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
    /// SendMessageUseCase（メッセージ送信）
    pub send_message_usecase: Arc<SendMessageUseCase>,
    /// TypingUseCase（入力中通知）
    pub typing_usecase: Arc<TypingUseCase>,
    /// NotifyErrorUseCase（不正なフレームへのエラー通知）
    pub notify_error_usecase: Arc<NotifyErrorUseCase>,
    /// SystemNoticeUseCase（サーバーからのお知らせ）
    pub system_notice_usecase: Arc<SystemNoticeUseCase>,
    /// GetPresenceUseCase（在室状況の取得）
    pub get_presence_usecase: Arc<GetPresenceUseCase>,
    /// GetRecentMessagesUseCase（履歴の取得）
    pub get_recent_messages_usecase: Arc<GetRecentMessagesUseCase>,
    pub outbound_queue_capacity: usize,
    pub write_timeout: Duration,
    pub join_timeout: Duration,
}

impl AppState {
    /// Build every usecase around one shared broker.
    pub fn new(broker: Arc<Broker>) -> Self {
        let config = broker.config().clone();
        Self {
            connect_participant_usecase: Arc::new(ConnectParticipantUseCase::new(broker.clone())),
            disconnect_participant_usecase: Arc::new(DisconnectParticipantUseCase::new(
                broker.clone(),
            )),
            send_message_usecase: Arc::new(SendMessageUseCase::new(broker.clone())),
            typing_usecase: Arc::new(TypingUseCase::new(broker.clone())),
            notify_error_usecase: Arc::new(NotifyErrorUseCase::new(broker.clone())),
            system_notice_usecase: Arc::new(SystemNoticeUseCase::new(broker.clone())),
            get_presence_usecase: Arc::new(GetPresenceUseCase::new(broker.clone())),
            get_recent_messages_usecase: Arc::new(GetRecentMessagesUseCase::new(broker)),
            outbound_queue_capacity: config.outbound_queue_capacity.max(1),
            write_timeout: config.write_timeout,
            join_timeout: config.join_timeout,
        }
    }
}
