//! Client execution logic with reconnection support.

use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver};

use crate::{
    domain::{should_attempt_reconnect, should_exit_immediately},
    error::ClientError,
    formatter::MessageFormatter,
    input::{InputEvent, spawn_input_thread},
    session::{ClientSession, run_connection},
    ui::print_with_prompt,
};

const PROMPT: &str = "you";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub url: String,
    pub user_id: String,
    /// Consecutive failed attempts tolerated before giving up
    pub max_reconnect_attempts: u32,
    pub reconnect_interval: Duration,
}

/// Run the WebSocket client with reconnection logic
///
/// Returns `Ok` when the user leaves. The attempt counter resets whenever a
/// connection gets as far as receiving the history.
pub async fn run_client(config: ClientConfig) -> Result<(), ClientError> {
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<InputEvent>();
    let _input_thread = spawn_input_thread(PROMPT.to_string(), input_tx);

    println!("\nType messages and press Enter to send. Type /quit or press Ctrl+C to exit.\n");

    let mut session = ClientSession::new(config.user_id.clone());
    let mut failed_attempts = 0;

    loop {
        tracing::info!(
            "Attempting to connect to {} (attempt {}/{})",
            config.url,
            failed_attempts + 1,
            config.max_reconnect_attempts + 1
        );

        match run_connection(&config.url, &mut session, &mut input_rx, PROMPT).await {
            Ok(()) => {
                tracing::info!("Client session ended normally");
                return Ok(());
            }
            Err(e) => {
                if session.take_established() {
                    failed_attempts = 0;
                }

                if !should_attempt_reconnect(&e, failed_attempts, config.max_reconnect_attempts) {
                    session.close();
                    if should_exit_immediately(&e) {
                        tracing::error!("{}. Exiting.", e);
                    } else {
                        tracing::error!(
                            "Failed to reconnect after {} attempts. Exiting.",
                            failed_attempts
                        );
                    }
                    return Err(e);
                }

                failed_attempts += 1;
                print_with_prompt(
                    &MessageFormatter::format_reconnecting(
                        failed_attempts,
                        config.max_reconnect_attempts,
                    ),
                    PROMPT,
                );

                if !wait_for_retry(config.reconnect_interval, &mut input_rx).await {
                    session.close();
                    return Ok(());
                }
            }
        }
    }
}

/// Sleep until the next attempt, rejecting lines typed meanwhile.
/// Returns false if the user quit.
async fn wait_for_retry(interval: Duration, input: &mut UnboundedReceiver<InputEvent>) -> bool {
    let sleep = tokio::time::sleep(interval);
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            _ = &mut sleep => return true,
            event = input.recv() => match event {
                Some(InputEvent::Line(_)) => {
                    print_with_prompt(&MessageFormatter::format_not_connected(), PROMPT);
                }
                Some(InputEvent::Keystroke) => {}
                Some(InputEvent::Quit) | None => return false,
            },
        }
    }
}
