//! UseCase 層
//!
//! 全てのユースケースは 1 つの `Broker` を共有し、そのロック区間の中で
//! ドメインの状態変更と配信を行う。

pub mod broker;
pub mod connect_participant;
pub mod disconnect_participant;
pub mod error;
pub mod get_presence;
pub mod get_recent_messages;
pub mod notify_error;
pub mod send_message;
pub mod system_notice;
pub mod typing;

pub use broker::Broker;
pub use connect_participant::ConnectParticipantUseCase;
pub use disconnect_participant::DisconnectParticipantUseCase;
pub use error::{ConnectError, SendMessageError, TypingError};
pub use get_presence::GetPresenceUseCase;
pub use get_recent_messages::GetRecentMessagesUseCase;
pub use notify_error::NotifyErrorUseCase;
pub use send_message::SendMessageUseCase;
pub use system_notice::SystemNoticeUseCase;
pub use typing::TypingUseCase;
