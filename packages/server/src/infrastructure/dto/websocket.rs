//! WebSocket event DTOs.
//!
//! Every frame is a JSON object tagged by `type`.

use serde::{Deserialize, Serialize};

/// Inbound events sent by clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    Join {
        room: String,
    },
    Leave {
        room: String,
    },
    Send {
        room: String,
        body: String,
    },
    Typing {
        room: String,
    },
    StopTyping {
        room: String,
    },
    History {
        room: String,
        #[serde(default)]
        before_id: Option<i64>,
        #[serde(default)]
        limit: Option<usize>,
    },
}

impl ClientEvent {
    pub fn room(&self) -> &str {
        match self {
            Self::Join { room }
            | Self::Leave { room }
            | Self::Send { room, .. }
            | Self::Typing { room }
            | Self::StopTyping { room }
            | Self::History { room, .. } => room,
        }
    }
}

/// Outbound events sent to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEventDto {
    Message(MessageDto),
    UserJoined(UserPresenceDto),
    UserLeft(UserPresenceDto),
    Typing(TypingDto),
    StopTyping(TypingDto),
    RoomUsers(RoomUsersDto),
    History(HistoryDto),
    Error(ErrorDto),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDto {
    pub id: i64,
    pub room: String,
    pub sender_id: String,
    pub sender_name: String,
    /// Palette color derived from `sender_id`
    pub avatar_color: String,
    pub body: String,
    pub kind: String,
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummaryDto {
    pub user_id: String,
    pub user_name: String,
    pub avatar_color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPresenceDto {
    pub room: String,
    pub user_id: String,
    pub user_name: String,
    pub avatar_color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingDto {
    pub room: String,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomUsersDto {
    pub room: String,
    pub users: Vec<UserSummaryDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryDto {
    pub room: String,
    /// Newest first
    pub messages: Vec<MessageDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDto {
    pub code: String,
    pub message: String,
    pub retryable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
}
