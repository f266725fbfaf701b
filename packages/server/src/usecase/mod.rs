//! UseCase layer.
//!
//! One use case per operation of the coordinator. Use cases depend only on the
//! domain traits and are wired together in `ui::state::AppState`.

pub mod connect_participant;
pub mod disconnect_participant;
pub mod dispatcher;
pub mod error;
pub mod get_history;
pub mod get_presence;
pub mod get_room_detail;
pub mod get_rooms;
pub mod join_room;
pub mod leave_room;
pub mod send_message;
pub mod typing;

#[cfg(test)]
pub(crate) mod test_support;

pub use connect_participant::ConnectParticipantUseCase;
pub use disconnect_participant::{DisconnectOutcome, DisconnectParticipantUseCase};
pub use dispatcher::BroadcastDispatcher;
pub use error::{
    ConnectError, GetRoomDetailError, HistoryQueryError, JoinError, SendMessageError, TypingError,
};
pub use get_history::GetHistoryUseCase;
pub use get_presence::GetPresenceUseCase;
pub use get_room_detail::GetRoomDetailUseCase;
pub use get_rooms::GetRoomsUseCase;
pub use join_room::JoinRoomUseCase;
pub use leave_room::LeaveRoomUseCase;
pub use send_message::SendMessageUseCase;
pub use typing::TypingUseCase;
