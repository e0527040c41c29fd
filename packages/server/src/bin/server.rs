//! Anonymous real-time chat server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin yorisoi-server
//! cargo run --bin yorisoi-server -- --host 0.0.0.0 --port 3000
//! YORISOI_MAX_MESSAGE_LENGTH=280 cargo run --bin yorisoi-server
//! ```

use std::{sync::Arc, time::Duration};

use clap::Parser;
use yorisoi_server::{
    config::ChatConfig,
    domain::RateLimitPolicy,
    infrastructure::{message_pusher::WebSocketMessagePusher, repository::InMemoryHistoryStore},
    ui::Server,
    usecase::Broker,
};
use yorisoi_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "yorisoi-server")]
#[command(about = "Anonymous real-time presence and messaging server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "YORISOI_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "YORISOI_PORT", default_value = "8080")]
    port: u16,

    /// Max characters of a message after trimming
    #[arg(long, env = "YORISOI_MAX_MESSAGE_LENGTH", default_value = "500")]
    max_message_length: usize,

    /// Messages replayed to a connection when it joins
    #[arg(long, env = "YORISOI_HISTORY_LIMIT", default_value = "50")]
    history_limit: usize,

    /// Messages retained in memory
    #[arg(long, env = "YORISOI_HISTORY_CAPACITY", default_value = "1000")]
    history_capacity: usize,

    /// Messages a connection may send per interval
    #[arg(long, env = "YORISOI_RATE_LIMIT_MESSAGES", default_value = "5")]
    rate_limit_messages: usize,

    #[arg(long, env = "YORISOI_RATE_LIMIT_INTERVAL_SECS", default_value = "10")]
    rate_limit_interval_secs: u64,

    /// Server-side typing window
    #[arg(long, env = "YORISOI_TYPING_EXPIRY_MS", default_value = "3000")]
    typing_expiry_ms: u64,

    #[arg(long, env = "YORISOI_TYPING_SWEEP_INTERVAL_MS", default_value = "500")]
    typing_sweep_interval_ms: u64,

    /// Per-connection outbound queue length
    #[arg(long, env = "YORISOI_OUTBOUND_QUEUE_CAPACITY", default_value = "64")]
    outbound_queue_capacity: usize,

    #[arg(long, env = "YORISOI_WRITE_TIMEOUT_MS", default_value = "5000")]
    write_timeout_ms: u64,

    /// Time allowed for the first join_chat frame
    #[arg(long, env = "YORISOI_JOIN_TIMEOUT_SECS", default_value = "10")]
    join_timeout_secs: u64,

    /// Random identity draws before falling back to a numeric suffix
    #[arg(long, env = "YORISOI_IDENTITY_ATTEMPTS", default_value = "8")]
    identity_attempts: usize,
}

impl From<&Args> for ChatConfig {
    fn from(args: &Args) -> Self {
        Self {
            max_message_length: args.max_message_length,
            history_limit: args.history_limit,
            history_capacity: args.history_capacity,
            rate_limit: RateLimitPolicy {
                max_messages: args.rate_limit_messages,
                interval: Duration::from_secs(args.rate_limit_interval_secs),
            },
            typing_expiry: Duration::from_millis(args.typing_expiry_ms),
            typing_sweep_interval: Duration::from_millis(args.typing_sweep_interval_ms.max(1)),
            outbound_queue_capacity: args.outbound_queue_capacity,
            write_timeout: Duration::from_millis(args.write_timeout_ms),
            join_timeout: Duration::from_secs(args.join_timeout_secs),
            identity_attempts: args.identity_attempts,
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();
    let config = ChatConfig::from(&args);
    tracing::debug!("Configuration: {:?}", config);

    // Initialize dependencies in order:
    // 1. HistoryStore
    // 2. MessagePusher
    // 3. Broker (shared by all usecases)
    // 4. Server
    let history = Arc::new(InMemoryHistoryStore::new(config.history_capacity));
    let message_pusher = Arc::new(WebSocketMessagePusher::new());
    let broker = Arc::new(Broker::new(
        config,
        history,
        message_pusher,
        Arc::new(SystemClock),
    ));

    let server = Server::new(broker);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
