//! Room-based chat server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin roomcast-server
//! cargo run --bin roomcast-server -- --host 0.0.0.0 --port 3000
//! cargo run --bin roomcast-server -- --database-url sqlite://chat.db --default-room general --default-room random
//! ```

use std::{sync::Arc, time::Duration};

use clap::Parser;

use roomcast_server::{
    config::ChatConfig,
    domain::{HistoryRepository, RoomName, RoomRepository},
    infrastructure::{
        message_pusher::WebSocketMessagePusher,
        repository::{
            InMemoryConnectionRepository, InMemoryHistoryRepository, InMemoryRoomRepository,
            SqliteHistoryRepository,
        },
    },
    ui::Server,
};
use roomcast_shared::{
    logger::setup_logger,
    time::{Clock, SystemClock},
};

#[derive(Parser, Debug)]
#[command(name = "roomcast-server")]
#[command(about = "Room-based chat server with presence and typing indicators", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "ROOMCAST_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "ROOMCAST_PORT", default_value = "8080")]
    port: u16,

    /// SQLite URL for message history (in-memory history when omitted)
    #[arg(long, env = "ROOMCAST_DATABASE_URL")]
    database_url: Option<String>,

    /// How long a typing indicator stays live without a refresh
    #[arg(long, env = "ROOMCAST_TYPING_TIMEOUT_MS", default_value = "1000")]
    typing_timeout_ms: u64,

    /// Period of the typing expiry sweep
    #[arg(long, env = "ROOMCAST_SWEEP_INTERVAL_MS", default_value = "250")]
    sweep_interval_ms: u64,

    /// Bound on a single socket write before the connection is dropped
    #[arg(long, env = "ROOMCAST_DELIVERY_TIMEOUT_MS", default_value = "5000")]
    delivery_timeout_ms: u64,

    /// Maximum message body length, in characters
    #[arg(long, env = "ROOMCAST_MAX_MESSAGE_LENGTH", default_value = "2000")]
    max_message_length: usize,

    /// Number of messages sent to a connection when it joins a room
    #[arg(long, env = "ROOMCAST_BACKFILL_LIMIT", default_value = "50")]
    backfill_limit: usize,

    /// Capacity of each connection's outbound queue
    #[arg(long = "outbound-queue", env = "ROOMCAST_OUTBOUND_QUEUE", default_value = "256")]
    outbound_queue_capacity: usize,

    /// Room created at startup (repeatable)
    #[arg(long = "default-room", default_value = "general")]
    default_rooms: Vec<String>,
}

impl Args {
    fn chat_config(&self) -> ChatConfig {
        ChatConfig {
            typing_timeout: Duration::from_millis(self.typing_timeout_ms),
            sweep_interval: Duration::from_millis(self.sweep_interval_ms),
            delivery_timeout: Duration::from_millis(self.delivery_timeout_ms),
            max_message_length: self.max_message_length,
            backfill_limit: self.backfill_limit,
            outbound_queue_capacity: self.outbound_queue_capacity,
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger("roomcast_server", env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();
    let config = args.chat_config();
    if let Err(e) = config.validate() {
        tracing::error!("Invalid configuration: {}", e);
        std::process::exit(2);
    }

    // Initialize dependencies in order:
    // 1. Repositories
    // 2. MessagePusher
    // 3. Server (use cases are wired inside)

    // 1. Create Repositories
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let connections = Arc::new(InMemoryConnectionRepository::new());
    let rooms = Arc::new(InMemoryRoomRepository::new(
        clock.clone(),
        config.typing_timeout,
    ));
    let history: Arc<dyn HistoryRepository> = match &args.database_url {
        Some(url) => match SqliteHistoryRepository::connect(url, clock.clone()).await {
            Ok(repository) => Arc::new(repository),
            Err(e) => {
                tracing::error!("Failed to open history database '{}': {}", url, e);
                std::process::exit(1);
            }
        },
        None => {
            tracing::info!("No database configured, keeping history in memory");
            Arc::new(InMemoryHistoryRepository::new(clock.clone()))
        }
    };

    for name in &args.default_rooms {
        match RoomName::new(name.clone()) {
            Ok(room_name) => {
                rooms.get_or_create(&room_name).await.lock().await.pin();
            }
            Err(e) => {
                tracing::error!("Invalid default room '{}': {}", name, e);
                std::process::exit(2);
            }
        }
    }

    // 2. Create MessagePusher (WebSocket implementation)
    let message_pusher = Arc::new(WebSocketMessagePusher::new());

    // 3. Create and run the server
    let server = Server::new(config, connections, rooms, history, message_pusher, clock);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
