//! Terminal chat client for Yorisoi.
//!
//! Joins the room with a user id, prints the anonymous identity the server
//! assigns, and sends lines from stdin. Automatically reconnects when the
//! connection drops; an empty user id is refused by the server and ends the
//! client immediately.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin yorisoi-client -- --user-id u-123
//! YORISOI_USER_ID=u-123 cargo run --bin yorisoi-client
//! ```

use std::time::Duration;

use clap::Parser;

use yorisoi_client::{ClientConfig, run_client};
use yorisoi_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "yorisoi-client")]
#[command(about = "Anonymous chat client for the Yorisoi room", long_about = None)]
struct Args {
    /// Caller-supplied user id (never shown to other participants)
    #[arg(short = 'u', long, env = "YORISOI_USER_ID")]
    user_id: String,

    /// WebSocket server URL
    #[arg(long, env = "YORISOI_URL", default_value = "ws://127.0.0.1:8080/ws")]
    url: String,

    /// Consecutive reconnect attempts before giving up
    #[arg(long, env = "YORISOI_MAX_RECONNECT_ATTEMPTS", default_value_t = 5)]
    max_reconnect_attempts: u32,

    /// Seconds to wait between reconnect attempts
    #[arg(long, env = "YORISOI_RECONNECT_INTERVAL_SECS", default_value_t = 3)]
    reconnect_interval_secs: u64,
}

#[tokio::main]
async fn main() {
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();
    let config = ClientConfig {
        url: args.url,
        user_id: args.user_id,
        max_reconnect_attempts: args.max_reconnect_attempts,
        reconnect_interval: Duration::from_secs(args.reconnect_interval_secs),
    };

    if let Err(e) = run_client(config).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
