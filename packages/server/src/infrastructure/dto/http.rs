//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

use super::websocket::{MessageDto, UserSummaryDto};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummaryDto {
    pub name: String,
    pub online_users: usize,
    pub connections: usize,
    /// RFC 3339
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomDetailDto {
    pub name: String,
    pub users: Vec<UserSummaryDto>,
    pub connections: usize,
    /// RFC 3339
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceDto {
    pub user_id: String,
    pub online: bool,
    pub connections: usize,
    /// RFC 3339, set once the user has gone offline
    pub last_seen: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryPageDto {
    pub room: String,
    /// Newest first
    pub messages: Vec<MessageDto>,
    /// Pass as `before_id` to fetch the next older page
    pub next_before_id: Option<i64>,
}

/// Query parameters of `GET /api/rooms/{room}/messages`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryQuery {
    pub before_id: Option<i64>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponseDto {
    pub code: String,
    pub message: String,
    pub retryable: bool,
}
