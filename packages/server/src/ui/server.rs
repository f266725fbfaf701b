//! Server execution logic.

use std::{future::Future, sync::Arc, time::Duration};

use axum::{Router, routing::get};
use tokio::{net::TcpListener, sync::mpsc};
use tower_http::trace::TraceLayer;

use roomcast_shared::time::Clock;

use crate::{
    config::ChatConfig,
    domain::{ConnectionId, ConnectionRepository, HistoryRepository, MessagePusher, RoomRepository},
};

use super::{
    handler::{
        get_room_detail, get_room_messages, get_rooms, get_user_presence, health_check,
        websocket_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// Room-based chat server
///
/// Owns the application state and the background tasks (typing sweeper and
/// dead-connection reaper) that run alongside the HTTP listener.
///
/// # Example
///
/// ```ignore
/// let server = Server::new(config, connections, rooms, history, pusher, clock);
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
    dead_connections: mpsc::UnboundedReceiver<ConnectionId>,
    sweep_interval: Duration,
}

impl Server {
    /// Create a new Server instance
    pub fn new(
        config: ChatConfig,
        connections: Arc<dyn ConnectionRepository>,
        rooms: Arc<dyn RoomRepository>,
        history: Arc<dyn HistoryRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (dead_tx, dead_rx) = mpsc::unbounded_channel();
        let state = AppState::new(
            &config,
            connections,
            rooms,
            history,
            message_pusher,
            clock,
            dead_tx,
        );
        Self {
            state: Arc::new(state),
            dead_connections: dead_rx,
            sweep_interval: config.sweep_interval,
        }
    }

    /// Build the router
    pub fn router(&self) -> Router {
        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/rooms", get(get_rooms))
            .route("/api/rooms/{room}", get(get_room_detail))
            .route("/api/rooms/{room}/messages", get(get_room_messages))
            .route("/api/users/{user_id}/presence", get(get_user_presence))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Run the server until Ctrl+C
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Chat server listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws?user_id=<id>&name=<name>", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await?;
        Ok(())
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        let sweeper = self
            .state
            .typing_usecase
            .clone()
            .spawn_sweeper(self.sweep_interval);
        let reaper = self
            .state
            .disconnect_participant_usecase
            .clone()
            .spawn_reaper(self.dead_connections);

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await;

        sweeper.abort();
        reaper.abort();
        tracing::info!("Server shutdown complete");
        result
    }
}
