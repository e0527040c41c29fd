//! WebSocket client session management.
//!
//! `ClientSession` holds everything that outlives a single connection (the
//! user id, the state machine, the typing debouncer) and turns server frames
//! into display text and user input into client frames. `run_connection`
//! drives one socket from `join_chat` until it is left or lost.

use std::time::Instant;

use futures_util::{SinkExt, StreamExt, stream::SplitSink};
use tokio::{net::TcpStream, sync::mpsc::UnboundedReceiver};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::protocol::Message,
};
use yorisoi_server::infrastructure::dto::websocket::{
    ClientMessage, JoinChatPayload, SendMessagePayload, ServerMessage, TypingPayload,
};

use crate::{
    domain::{SessionState, SessionStateMachine, TypingDebouncer, TypingSignal},
    error::ClientError,
    formatter::MessageFormatter,
    input::InputEvent,
    ui::print_with_prompt,
};

type WsWriter = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

#[derive(Debug)]
pub struct ClientSession {
    user_id: String,
    machine: SessionStateMachine,
    typing: TypingDebouncer,
    identity: Option<String>,
    established: bool,
}

impl ClientSession {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            machine: SessionStateMachine::new(),
            typing: TypingDebouncer::default(),
            identity: None,
            established: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.machine.state()
    }

    /// Identity assigned on the current (or last) connection.
    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    /// Whether a connection reached Synced since the last call.
    pub fn take_established(&mut self) -> bool {
        std::mem::take(&mut self.established)
    }

    pub fn join_frame(&self) -> ClientMessage {
        ClientMessage::JoinChat(JoinChatPayload {
            user_id: self.user_id.clone(),
        })
    }

    /// Apply one server frame. Returns the text to display, if any.
    pub fn apply_server_message(
        &mut self,
        message: &ServerMessage,
    ) -> Result<Option<String>, ClientError> {
        let my_identity = self.identity.as_deref();
        let output = match message {
            ServerMessage::IdentityAssigned(payload) => {
                let output = MessageFormatter::format_identity_assigned(&payload.identity);
                self.identity = Some(payload.identity.clone());
                output
            }
            ServerMessage::ChatHistory(messages) => {
                let output = MessageFormatter::format_history(messages, my_identity);
                self.machine.on_history_received()?;
                self.established = true;
                output
            }
            ServerMessage::UserJoined(payload) => MessageFormatter::format_user_joined(payload),
            ServerMessage::UserLeft(payload) => MessageFormatter::format_user_left(payload),
            ServerMessage::ActiveUsersUpdate(payload) => {
                let output = MessageFormatter::format_active_users(payload, my_identity);
                if self.machine.state() == SessionState::Synced {
                    self.machine.on_presence_confirmed()?;
                }
                output
            }
            ServerMessage::NewMessage(message) => {
                MessageFormatter::format_chat_message(message, my_identity)
            }
            ServerMessage::UserTyping(payload) => MessageFormatter::format_typing(&payload.identity),
            ServerMessage::UserStopTyping(payload) => {
                MessageFormatter::format_stop_typing(&payload.identity)
            }
            ServerMessage::Error(payload) => {
                if self.machine.state() == SessionState::Connecting {
                    self.machine.close();
                    return Err(ClientError::InvalidUser(payload.message.clone()));
                }
                MessageFormatter::format_error(&payload.message)
            }
        };
        Ok(Some(output))
    }

    /// Frames for a submitted line: `stop_typing` if a burst was open, then
    /// the message itself. Fails fast when the session cannot send.
    pub fn submit_line(&mut self, line: &str) -> Result<Vec<ClientMessage>, ClientError> {
        self.machine.ensure_can_send()?;

        let mut frames = Vec::with_capacity(2);
        if self.typing.on_submit().is_some() {
            frames.push(self.typing_frame(TypingSignal::Stop));
        }
        frames.push(ClientMessage::SendMessage(SendMessagePayload {
            user_id: Some(self.user_id.clone()),
            content: line.to_string(),
        }));
        Ok(frames)
    }

    pub fn on_keystroke(&mut self, now: Instant) -> Option<ClientMessage> {
        if self.machine.ensure_can_send().is_err() {
            return None;
        }
        self.typing
            .on_keystroke(now)
            .map(|signal| self.typing_frame(signal))
    }

    pub fn poll_typing(&mut self, now: Instant) -> Option<ClientMessage> {
        self.typing.poll(now).map(|signal| self.typing_frame(signal))
    }

    pub fn typing_deadline(&self) -> Option<Instant> {
        self.typing.deadline()
    }

    /// The socket is gone; the server already cleared our typing state.
    pub fn on_transport_lost(&mut self) {
        self.typing.reset();
        self.machine.on_transport_lost().ok();
    }

    pub fn close(&mut self) {
        self.typing.reset();
        self.machine.close();
    }

    fn typing_frame(&self, signal: TypingSignal) -> ClientMessage {
        let payload = TypingPayload {
            user_id: Some(self.user_id.clone()),
        };
        match signal {
            TypingSignal::Start => ClientMessage::Typing(payload),
            TypingSignal::Stop => ClientMessage::StopTyping(payload),
        }
    }
}

/// Run one connection until the user leaves (`Ok`) or it fails (`Err`).
///
/// `InvalidUser` means the server refused the join and retrying is pointless.
/// Any other error leaves the session in Reconnecting.
pub async fn run_connection(
    url: &str,
    session: &mut ClientSession,
    input: &mut UnboundedReceiver<InputEvent>,
    prompt: &str,
) -> Result<(), ClientError> {
    let (ws_stream, _response) = match connect_async(url).await {
        Ok(result) => result,
        Err(e) => return Err(lost(session, e.to_string())),
    };

    tracing::info!("Connected to chat server!");

    let (mut write, mut read) = ws_stream.split();
    if let Err(e) = send_frame(&mut write, &session.join_frame()).await {
        return Err(lost(session, e));
    }

    loop {
        let deadline = session.typing_deadline();

        tokio::select! {
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<ServerMessage>(&text) {
                        Ok(message) => {
                            if let Some(output) = session.apply_server_message(&message)? {
                                print_with_prompt(&output, prompt);
                            }
                        }
                        Err(e) => tracing::warn!("Ignoring unparseable frame: {}", e),
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    return Err(lost(session, "Server closed the connection".to_string()));
                }
                Some(Err(e)) => return Err(lost(session, e.to_string())),
                Some(Ok(_)) => {}
            },
            event = input.recv() => match event {
                Some(InputEvent::Line(line)) => match session.submit_line(&line) {
                    Ok(frames) => {
                        for frame in &frames {
                            if let Err(e) = send_frame(&mut write, frame).await {
                                return Err(lost(session, e));
                            }
                        }
                    }
                    Err(_) => print_with_prompt(&MessageFormatter::format_not_connected(), prompt),
                },
                Some(InputEvent::Keystroke) => {
                    if let Some(frame) = session.on_keystroke(Instant::now())
                        && let Err(e) = send_frame(&mut write, &frame).await
                    {
                        return Err(lost(session, e));
                    }
                }
                Some(InputEvent::Quit) | None => {
                    send_frame(&mut write, &ClientMessage::LeaveChat).await.ok();
                    write.close().await.ok();
                    session.close();
                    return Ok(());
                }
            },
            _ = wait_until(deadline) => {
                if let Some(frame) = session.poll_typing(Instant::now())
                    && let Err(e) = send_frame(&mut write, &frame).await
                {
                    return Err(lost(session, e));
                }
            }
        }
    }
}

fn lost(session: &mut ClientSession, reason: String) -> ClientError {
    tracing::warn!("Connection lost: {}", reason);
    session.on_transport_lost();
    ClientError::ConnectionError(reason)
}

async fn send_frame(write: &mut WsWriter, frame: &ClientMessage) -> Result<(), String> {
    let json = serde_json::to_string(frame).map_err(|e| e.to_string())?;
    write
        .send(Message::Text(json.into()))
        .await
        .map_err(|e| e.to_string())
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline.into()).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use yorisoi_server::infrastructure::dto::websocket::{
        ActiveUsersPayload, ErrorPayload, IdentityPayload, MessageDto, MessageType,
    };

    use super::*;

    fn identity(name: &str) -> ServerMessage {
        ServerMessage::IdentityAssigned(IdentityPayload {
            identity: name.to_string(),
        })
    }

    fn presence(identities: &[&str]) -> ServerMessage {
        ServerMessage::ActiveUsersUpdate(ActiveUsersPayload {
            count: identities.len(),
            identities: identities.iter().map(|s| s.to_string()).collect(),
        })
    }

    fn joined_session() -> ClientSession {
        let mut session = ClientSession::new("u-1");
        session.apply_server_message(&identity("Quiet Fox")).unwrap();
        session
            .apply_server_message(&ServerMessage::ChatHistory(vec![]))
            .unwrap();
        session.apply_server_message(&presence(&["Quiet Fox"])).unwrap();
        session
    }

    #[test]
    fn test_handshake_reaches_active() {
        // テスト項目: identity → history → presence の順で Active になり、名前が記録される
        // given (前提条件):
        let mut session = ClientSession::new("u-1");

        // when (操作):
        session.apply_server_message(&identity("Quiet Fox")).unwrap();
        session
            .apply_server_message(&ServerMessage::ChatHistory(vec![]))
            .unwrap();
        session.apply_server_message(&presence(&["Quiet Fox"])).unwrap();

        // then (期待する結果):
        assert_eq!(session.state(), SessionState::Active);
        assert_eq!(session.identity(), Some("Quiet Fox"));
        assert!(session.take_established());
        assert!(!session.take_established());
    }

    #[test]
    fn test_error_while_connecting_is_invalid_user() {
        // テスト項目: 接続中に受け取った error は InvalidUser として扱われる
        // given (前提条件):
        let mut session = ClientSession::new("");
        let refusal = ServerMessage::Error(ErrorPayload {
            message: "A non-empty userId is required".to_string(),
        });

        // when (操作):
        let result = session.apply_server_message(&refusal);

        // then (期待する結果):
        assert_eq!(
            result,
            Err(ClientError::InvalidUser(
                "A non-empty userId is required".to_string()
            ))
        );
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[test]
    fn test_error_after_join_is_displayed() {
        // テスト項目: 参加後の error は表示されるだけでセッションは継続する
        // given (前提条件):
        let mut session = joined_session();
        let error = ServerMessage::Error(ErrorPayload {
            message: "Rate limit exceeded".to_string(),
        });

        // when (操作):
        let result = session.apply_server_message(&error).unwrap();

        // then (期待する結果):
        assert_eq!(result, Some("\n! Rate limit exceeded\n".to_string()));
        assert_eq!(session.state(), SessionState::Active);
    }

    #[test]
    fn test_own_message_is_marked_me() {
        // テスト項目: 自分の identity で届いたメッセージに (me) が付く
        // given (前提条件):
        let mut session = joined_session();
        let message = ServerMessage::NewMessage(MessageDto {
            id: 5,
            sender: Some("Quiet Fox".to_string()),
            content: "hello".to_string(),
            kind: MessageType::Message,
            timestamp: 1_700_000_000_000,
        });

        // when (操作):
        let output = session.apply_server_message(&message).unwrap().unwrap();

        // then (期待する結果):
        assert!(output.contains("Quiet Fox (me): hello"));
    }

    #[test]
    fn test_submit_line_closes_typing_burst_first() {
        // テスト項目: 入力中に送信すると stop_typing の後に send_message が送られる
        // given (前提条件):
        let mut session = joined_session();
        let start = session.on_keystroke(Instant::now());

        // when (操作):
        let frames = session.submit_line("hello").unwrap();

        // then (期待する結果):
        assert!(matches!(start, Some(ClientMessage::Typing(_))));
        assert_eq!(frames.len(), 2);
        assert!(matches!(frames[0], ClientMessage::StopTyping(_)));
        assert_eq!(
            frames[1],
            ClientMessage::SendMessage(SendMessagePayload {
                user_id: Some("u-1".to_string()),
                content: "hello".to_string(),
            })
        );
    }

    #[test]
    fn test_submit_line_fails_fast_when_reconnecting() {
        // テスト項目: 切断後の送信は NotConnected で失敗し、キューには積まれない
        // given (前提条件):
        let mut session = joined_session();
        session.on_transport_lost();

        // when (操作):
        let result = session.submit_line("hello");
        let keystroke = session.on_keystroke(Instant::now());

        // then (期待する結果):
        assert_eq!(result, Err(ClientError::NotConnected));
        assert_eq!(keystroke, None);
        assert_eq!(session.state(), SessionState::Reconnecting);
    }

    #[test]
    fn test_idle_typing_emits_stop() {
        // テスト項目: キー入力後 1 秒経つと stop_typing が 1 回出る
        // given (前提条件):
        let mut session = joined_session();
        let t0 = Instant::now();
        session.on_keystroke(t0);

        // when (操作):
        let stop = session.poll_typing(t0 + Duration::from_secs(1));
        let again = session.poll_typing(t0 + Duration::from_secs(2));

        // then (期待する結果):
        assert!(matches!(stop, Some(ClientMessage::StopTyping(_))));
        assert_eq!(again, None);
        assert_eq!(session.typing_deadline(), None);
    }

    #[test]
    fn test_resume_after_reconnect() {
        // テスト項目: 再接続後に新しい identity と履歴を受け取ると再び送信できる
        // given (前提条件):
        let mut session = joined_session();
        session.take_established();
        session.on_transport_lost();

        // when (操作):
        session.apply_server_message(&identity("Gentle Owl")).unwrap();
        session
            .apply_server_message(&ServerMessage::ChatHistory(vec![]))
            .unwrap();

        // then (期待する結果):
        assert_eq!(session.state(), SessionState::Synced);
        assert_eq!(session.identity(), Some("Gentle Owl"));
        assert!(session.submit_line("back").is_ok());
        assert!(session.take_established());
    }
}
