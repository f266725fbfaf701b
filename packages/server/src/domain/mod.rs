//! Domain layer for the chat coordinator.
//!
//! Value objects, entities and the pure aggregates (connection registry, room,
//! typing tracker), plus the traits of the collaborators the use cases depend on.

pub mod entity;
pub mod error;
pub mod event;
pub mod message_pusher;
pub mod registry;
pub mod repository;
pub mod room;
pub mod typing;
pub mod value_object;

pub use entity::{
    Connection, Message, MessageKind, NewMessage, Presence, UserIdentity, UserSummary,
};
pub use error::{HistoryError, MessagePushError, RepositoryError, ValueObjectError};
pub use event::{ErrorCode, ErrorNotice, ServerEvent};
pub use message_pusher::{MessagePusher, PusherChannel};
pub use registry::{ConnectionRegistry, Unregistered};
pub use repository::{ConnectionRepository, HistoryRepository, RoomHandle, RoomRepository};
pub use room::{JoinOutcome, LeaveOutcome, Room, RoomSnapshot};
pub use typing::{DEFAULT_TYPING_TIMEOUT, TypingTracker, TypingTransition};
pub use value_object::{
    AvatarColor, ConnectionId, ConnectionIdFactory, MessageBody, MessageId, RoomName, Timestamp,
    UserId, UserName,
};

#[cfg(test)]
pub use message_pusher::MockMessagePusher;
#[cfg(test)]
pub use repository::MockHistoryRepository;
