//! Outbound events.
//!
//! The closed set of events the coordinator delivers to connections. Wire
//! encoding lives in `infrastructure::dto::websocket`.

use super::{
    entity::{Message, UserSummary},
    value_object::{RoomName, UserId},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    /// A persisted chat message
    Message(Message),
    UserJoined {
        room: RoomName,
        user: UserSummary,
    },
    UserLeft {
        room: RoomName,
        user: UserSummary,
    },
    Typing {
        room: RoomName,
        user_id: UserId,
    },
    StopTyping {
        room: RoomName,
        user_id: UserId,
    },
    /// Online users of a room, sent to a joining connection
    RoomUsers {
        room: RoomName,
        users: Vec<UserSummary>,
    },
    /// A page of history, newest first
    History {
        room: RoomName,
        messages: Vec<Message>,
    },
    /// Rejection of an action, sent to the initiating connection only
    Error(ErrorNotice),
}

impl ServerEvent {
    /// Event name on the wire
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Message(_) => "message",
            Self::UserJoined { .. } => "user_joined",
            Self::UserLeft { .. } => "user_left",
            Self::Typing { .. } => "typing",
            Self::StopTyping { .. } => "stop_typing",
            Self::RoomUsers { .. } => "room_users",
            Self::History { .. } => "history",
            Self::Error(_) => "error",
        }
    }
}

/// Client-visible error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Unauthenticated,
    NotMember,
    InvalidMessage,
    StorageUnavailable,
    BadRequest,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::NotMember => "not_member",
            Self::InvalidMessage => "invalid_message",
            Self::StorageUnavailable => "storage_unavailable",
            Self::BadRequest => "bad_request",
        }
    }

    /// Whether repeating the same request may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StorageUnavailable)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorNotice {
    pub code: ErrorCode,
    pub message: String,
    pub room: Option<RoomName>,
}

impl ErrorNotice {
    pub fn new(code: ErrorCode, message: impl Into<String>, room: Option<RoomName>) -> Self {
        Self {
            code,
            message: message.into(),
            room,
        }
    }
}
