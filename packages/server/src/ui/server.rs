//! Server execution logic.

use std::{future::Future, sync::Arc, time::Duration};

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::usecase::Broker;

use super::{
    handler::{get_messages, get_presence, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

const SHUTDOWN_NOTICE: &str = "Server is shutting down";

/// WebSocket chat server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(broker);
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
    typing_sweep_interval: Duration,
}

impl Server {
    pub fn new(broker: Arc<Broker>) -> Self {
        let typing_sweep_interval = broker.config().typing_sweep_interval;
        Self {
            state: Arc::new(AppState::new(broker)),
            typing_sweep_interval,
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/presence", get(get_presence))
            .route("/api/messages", get(get_messages))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Run the WebSocket chat server until Ctrl+C / SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!(
            "WebSocket chat server listening on {}",
            listener.local_addr()?
        );
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// Serve on an already bound listener until `signal` resolves.
    ///
    /// On shutdown every connection receives a `system` notice before the
    /// listener stops accepting.
    pub async fn serve<F>(self, listener: TcpListener, signal: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        let sweeper = self
            .state
            .typing_usecase
            .spawn_sweeper(self.typing_sweep_interval);
        let notice = self.state.system_notice_usecase.clone();

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                signal.await;
                notice.execute(SHUTDOWN_NOTICE).await;
            })
            .await;

        sweeper.abort();
        result
    }
}
