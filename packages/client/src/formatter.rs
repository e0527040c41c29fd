//! Message formatting utilities for client display.

use yorisoi_server::infrastructure::dto::websocket::{
    ActiveUsersPayload, MessageDto, MessageType, PresenceDeltaPayload,
};
use yorisoi_shared::time::timestamp_to_clock_time;

const BANNER: &str = "============================================================";

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format the history replayed right after joining
    ///
    /// # Arguments
    ///
    /// * `messages` - Recent messages, oldest first
    /// * `my_identity` - The identity assigned to this client (to mark as "me")
    pub fn format_history(messages: &[MessageDto], my_identity: Option<&str>) -> String {
        let mut output = String::new();
        output.push_str(&format!("\n{}\n", BANNER));
        output.push_str("Recent messages:\n");

        if messages.is_empty() {
            output.push_str("(No messages yet)\n");
        } else {
            for message in messages {
                output.push_str(&Self::format_line(message, my_identity));
                output.push('\n');
            }
        }

        output.push_str(&format!("{}\n", BANNER));
        output
    }

    /// Format the identity notice shown once per connection
    pub fn format_identity_assigned(identity: &str) -> String {
        format!("\nYou are '{}' in this room.\n", identity)
    }

    pub fn format_user_joined(payload: &PresenceDeltaPayload) -> String {
        format!(
            "\n+ {} ({} online)\n",
            payload.message.content, payload.active_count
        )
    }

    pub fn format_user_left(payload: &PresenceDeltaPayload) -> String {
        format!(
            "\n- {} ({} online)\n",
            payload.message.content, payload.active_count
        )
    }

    /// Format the presence snapshot
    ///
    /// # Arguments
    ///
    /// * `payload` - Count and identities currently connected
    /// * `my_identity` - The identity assigned to this client (to mark as "me")
    pub fn format_active_users(payload: &ActiveUsersPayload, my_identity: Option<&str>) -> String {
        let names: Vec<String> = payload
            .identities
            .iter()
            .map(|identity| Self::with_me_suffix(identity, my_identity))
            .collect();
        format!("\nOnline ({}): {}\n", payload.count, names.join(", "))
    }

    /// Format a chat message or a system notice
    pub fn format_chat_message(message: &MessageDto, my_identity: Option<&str>) -> String {
        format!("\n{}\n", Self::format_line(message, my_identity))
    }

    pub fn format_typing(identity: &str) -> String {
        format!("\n... {} is typing\n", identity)
    }

    pub fn format_stop_typing(identity: &str) -> String {
        format!("\n... {} stopped typing\n", identity)
    }

    pub fn format_error(message: &str) -> String {
        format!("\n! {}\n", message)
    }

    /// Shown when a line is entered while the session cannot send
    pub fn format_not_connected() -> String {
        "\n! Not connected. Your message was not sent.\n".to_string()
    }

    pub fn format_reconnecting(attempt: u32, max_attempts: u32) -> String {
        format!("\n! Connection lost. Reconnecting ({}/{})...\n", attempt, max_attempts)
    }

    fn format_line(message: &MessageDto, my_identity: Option<&str>) -> String {
        let time = timestamp_to_clock_time(message.timestamp);
        match (message.kind, message.sender.as_deref()) {
            (MessageType::Message, Some(sender)) => format!(
                "[{}] {}: {}",
                time,
                Self::with_me_suffix(sender, my_identity),
                message.content
            ),
            (MessageType::System, _) => format!("[{}] * {}", time, message.content),
            _ => format!("[{}] {}", time, message.content),
        }
    }

    fn with_me_suffix(identity: &str, my_identity: Option<&str>) -> String {
        if my_identity == Some(identity) {
            format!("{} (me)", identity)
        } else {
            identity.to_string()
        }
    }
}
