//! Entities of the chat domain.

use std::collections::BTreeSet;

use serde::Serialize;

use super::value_object::{
    AvatarColor, ConnectionId, MessageBody, MessageId, RoomName, Timestamp, UserId, UserName,
};

/// Verified identity handed over by the authentication collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub id: UserId,
    pub name: UserName,
}

impl UserIdentity {
    pub fn new(id: UserId, name: UserName) -> Self {
        Self { id, name }
    }

    /// Public summary of this user as shown to other room members
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            user_id: self.id.clone(),
            name: self.name.clone(),
            avatar_color: AvatarColor::for_user(&self.id),
        }
    }
}

/// Online user summary, as listed in `room_users`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub user_id: UserId,
    pub name: UserName,
    pub avatar_color: AvatarColor,
}

/// One live real-time channel to one authenticated user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub id: ConnectionId,
    pub user: UserIdentity,
    /// Rooms this connection has joined; ordered so cleanup locks rooms deterministically
    pub rooms: BTreeSet<RoomName>,
    pub connected_at: Timestamp,
}

impl Connection {
    pub fn new(id: ConnectionId, user: UserIdentity, connected_at: Timestamp) -> Self {
        Self {
            id,
            user,
            rooms: BTreeSet::new(),
            connected_at,
        }
    }
}

/// Kind of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Ordinary text sent by a user
    Text,
    /// Generated by the server
    System,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::System => "system",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "text" => Some(Self::Text),
            "system" => Some(Self::System),
            _ => None,
        }
    }
}

/// A validated message that has not been persisted yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub room: RoomName,
    pub sender_id: UserId,
    /// Denormalized at creation time
    pub sender_name: UserName,
    pub body: MessageBody,
    pub kind: MessageKind,
}

/// A persisted, immutable chat message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub room: RoomName,
    pub sender_id: UserId,
    pub sender_name: UserName,
    pub body: MessageBody,
    pub kind: MessageKind,
    pub created_at: Timestamp,
}

impl Message {
    /// Complete a `NewMessage` with the id and timestamp assigned by the store
    pub fn from_new(new: NewMessage, id: MessageId, created_at: Timestamp) -> Self {
        Self {
            id,
            room: new.room,
            sender_id: new.sender_id,
            sender_name: new.sender_name,
            body: new.body,
            kind: new.kind,
            created_at,
        }
    }
}

/// Presence of a user, derived from the connection registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presence {
    pub user_id: UserId,
    pub online: bool,
    pub connections: usize,
    /// Set when the user's last connection was removed
    pub last_seen: Option<Timestamp>,
}
