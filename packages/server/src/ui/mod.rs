//! Axum front end of the coordinator: the WebSocket endpoint and the HTTP API.

mod handler;
mod server;
mod signal;
pub mod state;

pub use server::Server;
pub use signal::shutdown_signal;
