//! Infrastructure layer: concrete collaborators and wire formats.

pub mod dto;
pub mod message_pusher;
pub mod repository;
