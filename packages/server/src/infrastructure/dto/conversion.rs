//! Conversion logic from domain entities to DTOs.

use roomcast_shared::time::timestamp_to_rfc3339;

use crate::domain::{
    AvatarColor, Message, Presence, RoomSnapshot, ServerEvent, UserSummary, event::ErrorNotice,
};
use crate::infrastructure::dto::{
    http::{ErrorResponseDto, PresenceDto, RoomDetailDto, RoomSummaryDto},
    websocket::{
        ErrorDto, HistoryDto, MessageDto, RoomUsersDto, ServerEventDto, TypingDto,
        UserPresenceDto, UserSummaryDto,
    },
};

// ========================================
// Domain Entity → WebSocket DTO
// ========================================

impl From<&Message> for MessageDto {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id.value(),
            room: message.room.as_str().to_string(),
            sender_id: message.sender_id.as_str().to_string(),
            sender_name: message.sender_name.as_str().to_string(),
            avatar_color: AvatarColor::for_user(&message.sender_id)
                .as_str()
                .to_string(),
            body: message.body.as_str().to_string(),
            kind: message.kind.as_str().to_string(),
            timestamp: message.created_at.value(),
        }
    }
}

impl From<&UserSummary> for UserSummaryDto {
    fn from(user: &UserSummary) -> Self {
        Self {
            user_id: user.user_id.as_str().to_string(),
            user_name: user.name.as_str().to_string(),
            avatar_color: user.avatar_color.as_str().to_string(),
        }
    }
}

impl From<&ErrorNotice> for ErrorDto {
    fn from(notice: &ErrorNotice) -> Self {
        Self {
            code: notice.code.as_str().to_string(),
            message: notice.message.clone(),
            retryable: notice.code.is_retryable(),
            room: notice.room.as_ref().map(|room| room.as_str().to_string()),
        }
    }
}

impl From<&ErrorNotice> for ErrorResponseDto {
    fn from(notice: &ErrorNotice) -> Self {
        Self {
            code: notice.code.as_str().to_string(),
            message: notice.message.clone(),
            retryable: notice.code.is_retryable(),
        }
    }
}

fn user_presence(room: &crate::domain::RoomName, user: &UserSummary) -> UserPresenceDto {
    UserPresenceDto {
        room: room.as_str().to_string(),
        user_id: user.user_id.as_str().to_string(),
        user_name: user.name.as_str().to_string(),
        avatar_color: user.avatar_color.as_str().to_string(),
    }
}

impl From<&ServerEvent> for ServerEventDto {
    fn from(event: &ServerEvent) -> Self {
        match event {
            ServerEvent::Message(message) => Self::Message(message.into()),
            ServerEvent::UserJoined { room, user } => Self::UserJoined(user_presence(room, user)),
            ServerEvent::UserLeft { room, user } => Self::UserLeft(user_presence(room, user)),
            ServerEvent::Typing { room, user_id } => Self::Typing(TypingDto {
                room: room.as_str().to_string(),
                user_id: user_id.as_str().to_string(),
            }),
            ServerEvent::StopTyping { room, user_id } => Self::StopTyping(TypingDto {
                room: room.as_str().to_string(),
                user_id: user_id.as_str().to_string(),
            }),
            ServerEvent::RoomUsers { room, users } => Self::RoomUsers(RoomUsersDto {
                room: room.as_str().to_string(),
                users: users.iter().map(UserSummaryDto::from).collect(),
            }),
            ServerEvent::History { room, messages } => Self::History(HistoryDto {
                room: room.as_str().to_string(),
                messages: messages.iter().map(MessageDto::from).collect(),
            }),
            ServerEvent::Error(notice) => Self::Error(notice.into()),
        }
    }
}

// ========================================
// Domain Entity → HTTP DTO
// ========================================

impl From<&RoomSnapshot> for RoomSummaryDto {
    fn from(snapshot: &RoomSnapshot) -> Self {
        Self {
            name: snapshot.name.as_str().to_string(),
            online_users: snapshot.users.len(),
            connections: snapshot.connection_count,
            created_at: timestamp_to_rfc3339(snapshot.created_at.value()),
        }
    }
}

impl From<&RoomSnapshot> for RoomDetailDto {
    fn from(snapshot: &RoomSnapshot) -> Self {
        Self {
            name: snapshot.name.as_str().to_string(),
            users: snapshot.users.iter().map(UserSummaryDto::from).collect(),
            connections: snapshot.connection_count,
            created_at: timestamp_to_rfc3339(snapshot.created_at.value()),
        }
    }
}

impl From<&Presence> for PresenceDto {
    fn from(presence: &Presence) -> Self {
        Self {
            user_id: presence.user_id.as_str().to_string(),
            online: presence.online,
            connections: presence.connections,
            last_seen: presence
                .last_seen
                .map(|timestamp| timestamp_to_rfc3339(timestamp.value())),
        }
    }
}
