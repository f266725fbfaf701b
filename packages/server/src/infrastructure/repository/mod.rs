//! Repository implementations.
//!
//! - `inmemory`: rooms, connections and message history held in process memory
//! - `sqlite`: message history persisted in SQLite

pub mod inmemory;
pub mod sqlite;

pub use inmemory::{
    InMemoryConnectionRepository, InMemoryHistoryRepository, InMemoryRoomRepository,
};
pub use sqlite::SqliteHistoryRepository;
