//! InMemory repository implementations.

pub mod connection;
pub mod history;
pub mod room;

pub use connection::InMemoryConnectionRepository;
pub use history::InMemoryHistoryRepository;
pub use room::InMemoryRoomRepository;
