//! WebSocket connection handlers.
//!
//! Each connection runs two tasks:
//! - a reader that parses frames and dispatches them to usecases
//! - a writer (`pusher_loop`) that drains the bounded outbound queue
//!
//! The first frame must be `join_chat`, within `join_timeout`.

use std::{sync::Arc, time::Duration};

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, SplitStream, StreamExt},
};
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{
    domain::{AnonymousIdentity, ConnectionId, PusherChannel},
    infrastructure::dto::websocket::{ClientMessage, ErrorPayload, ServerMessage},
    ui::state::AppState,
    usecase::ConnectError,
};

const JOIN_REQUIRED: &str = "join_chat is required before any other event";
const MALFORMED_EVENT: &str = "malformed event";

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Drains the outbound queue into the socket.
///
/// Ends when the queue is closed (all senders dropped), a write fails, or a
/// write stalls for longer than `write_timeout`. A closed queue ends with a
/// close frame.
fn pusher_loop(
    mut rx: mpsc::Receiver<String>,
    mut sender: SplitSink<WebSocket, Message>,
    write_timeout: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(json) = rx.recv().await {
            match tokio::time::timeout(write_timeout, sender.send(Message::Text(json.into()))).await
            {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::debug!("WebSocket write failed: {}", e);
                    return;
                }
                Err(_) => {
                    tracing::warn!("WebSocket write stalled for {:?}, closing", write_timeout);
                    return;
                }
            }
        }

        let _ = tokio::time::timeout(write_timeout, sender.send(Message::Close(None))).await;
    })
}

/// Queue an `error` frame on a connection that has not joined yet.
fn send_direct_error(tx: &PusherChannel, message: &str) {
    let frame = ServerMessage::Error(ErrorPayload {
        message: message.to_string(),
    });
    match serde_json::to_string(&frame) {
        Ok(json) => {
            if let Err(e) = tx.try_send(json) {
                tracing::debug!("Dropping pre-join error frame: {}", e);
            }
        }
        Err(e) => tracing::error!("Failed to serialize error frame: {}", e),
    }
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let connection_id = ConnectionId::generate();
    let (sender, mut receiver) = socket.split();
    let (tx, rx) = mpsc::channel(state.outbound_queue_capacity);
    let mut send_task = pusher_loop(rx, sender, state.write_timeout);
    tracing::debug!("Connection '{}' accepted, waiting for join_chat", connection_id);

    // The join itself is not cancel-safe, so only the wait for `join_chat`
    // is bounded.
    let requested = tokio::time::timeout(
        state.join_timeout,
        wait_for_join_request(&mut receiver, &tx),
    )
    .await;

    let joined = match requested {
        Ok(Some(user_id)) => join(&state, connection_id, user_id, &tx).await,
        Ok(None) => None,
        Err(_) => {
            tracing::info!(
                "Connection '{}' did not join within {:?}",
                connection_id,
                state.join_timeout
            );
            None
        }
    };
    // From here on the pusher owns the only sender: dropping it when the
    // connection is removed ends the writer.
    drop(tx);

    let Some(identity) = joined else {
        finish_writer(send_task, state.write_timeout).await;
        return;
    };
    tracing::info!("Connection '{}' joined as '{}'", connection_id, identity);

    let mut recv_task = tokio::spawn(read_loop(receiver, state.clone(), connection_id));

    let writer_done = tokio::select! {
        _ = &mut recv_task => false,
        _ = &mut send_task => {
            recv_task.abort();
            true
        }
    };

    match state
        .disconnect_participant_usecase
        .execute(&connection_id)
        .await
    {
        Ok(identity) => tracing::info!("Connection '{}' ({}) closed", connection_id, identity),
        Err(e) => tracing::debug!("Connection '{}' already cleaned up: {}", connection_id, e),
    }

    if !writer_done {
        finish_writer(send_task, state.write_timeout).await;
    }
}

/// Wait for the writer to flush and close, bounded by `write_timeout`.
async fn finish_writer(mut send_task: JoinHandle<()>, write_timeout: Duration) {
    if tokio::time::timeout(write_timeout, &mut send_task)
        .await
        .is_err()
    {
        send_task.abort();
    }
}

/// Reads frames until `join_chat` arrives and returns its user id, or `None`
/// if the connection should be closed. Other events are answered with `error`.
async fn wait_for_join_request(
    receiver: &mut SplitStream<WebSocket>,
    tx: &PusherChannel,
) -> Option<String> {
    while let Some(frame) = receiver.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => return None,
            Ok(_) => continue,
            Err(e) => {
                tracing::debug!("WebSocket error before join: {}", e);
                return None;
            }
        };

        match serde_json::from_str::<ClientMessage>(text.as_str()) {
            Ok(ClientMessage::JoinChat(payload)) => return Some(payload.user_id),
            Ok(ClientMessage::LeaveChat) => return None,
            Ok(_) => send_direct_error(tx, JOIN_REQUIRED),
            Err(e) => {
                tracing::warn!("Malformed frame before join: {}", e);
                send_direct_error(tx, MALFORMED_EVENT);
            }
        }
    }
    None
}

/// Registers the connection. Returns the assigned identity, or `None` if the
/// connection should be closed.
async fn join(
    state: &AppState,
    connection_id: ConnectionId,
    user_id: String,
    tx: &PusherChannel,
) -> Option<AnonymousIdentity> {
    match state
        .connect_participant_usecase
        .execute(connection_id, user_id, tx.clone())
        .await
    {
        Ok(identity) => Some(identity),
        Err(ConnectError::InvalidUser) => {
            tracing::warn!("Refusing connection '{}': empty userId", connection_id);
            send_direct_error(tx, &ConnectError::InvalidUser.to_string());
            None
        }
        Err(e) => {
            tracing::warn!("Failed to join connection '{}': {}", connection_id, e);
            None
        }
    }
}

/// Reads frames until the client closes, leaves, or the socket fails.
async fn read_loop(
    mut receiver: SplitStream<WebSocket>,
    state: Arc<AppState>,
    connection_id: ConnectionId,
) {
    while let Some(frame) = receiver.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!("WebSocket error on '{}': {}", connection_id, e);
                break;
            }
        };

        match frame {
            Message::Text(text) => match serde_json::from_str::<ClientMessage>(text.as_str()) {
                Ok(ClientMessage::LeaveChat) => {
                    tracing::info!("Connection '{}' requested leave", connection_id);
                    break;
                }
                Ok(message) => dispatch(&state, &connection_id, message).await,
                Err(e) => {
                    tracing::warn!("Malformed frame from '{}': {}", connection_id, e);
                    state
                        .notify_error_usecase
                        .execute(&connection_id, MALFORMED_EVENT)
                        .await;
                }
            },
            Message::Close(_) => {
                tracing::debug!("Connection '{}' sent close", connection_id);
                break;
            }
            // Ping/pong is handled by the protocol layer
            _ => {}
        }
    }
}

async fn dispatch(state: &AppState, connection_id: &ConnectionId, message: ClientMessage) {
    match message {
        ClientMessage::JoinChat(_) => {
            if let Err(e) = state.connect_participant_usecase.rejoin(connection_id).await {
                tracing::debug!("Re-join of '{}' failed: {}", connection_id, e);
            }
        }
        ClientMessage::SendMessage(payload) => {
            if let Err(e) = state
                .send_message_usecase
                .execute(connection_id, &payload.content)
                .await
            {
                tracing::debug!("Message from '{}' not delivered: {}", connection_id, e);
            }
        }
        ClientMessage::Typing(_) => {
            if let Err(e) = state.typing_usecase.start(connection_id).await {
                tracing::debug!("typing from '{}' ignored: {}", connection_id, e);
            }
        }
        ClientMessage::StopTyping(_) => {
            if let Err(e) = state.typing_usecase.stop(connection_id).await {
                tracing::debug!("stop_typing from '{}' ignored: {}", connection_id, e);
            }
        }
        ClientMessage::LeaveChat => {}
    }
}
