//! SQLite repository implementations.

pub mod history;

pub use history::SqliteHistoryRepository;
