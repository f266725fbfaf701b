//! Room-based real-time chat coordinator.
//!
//! Tracks which users are connected to which rooms, fans out messages and
//! presence events per room in a total order, expires typing indicators and
//! mediates access to persisted history.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
