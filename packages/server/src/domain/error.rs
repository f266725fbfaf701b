//! Domain errors.

use thiserror::Error;

/// Value object construction errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("user id must not be empty")]
    UserIdEmpty,

    #[error("user id is too long ({0} chars, max {max})", max = super::value_object::MAX_ID_LENGTH)]
    UserIdTooLong(usize),

    #[error("user name must not be empty")]
    UserNameEmpty,

    #[error("user name is too long ({0} chars, max {max})", max = super::value_object::MAX_ID_LENGTH)]
    UserNameTooLong(usize),

    #[error("room name must not be empty")]
    RoomNameEmpty,

    #[error("room name is too long ({0} chars, max {max})", max = super::value_object::MAX_ID_LENGTH)]
    RoomNameTooLong(usize),

    #[error("room name must not contain control characters")]
    RoomNameInvalidCharacter,

    #[error("connection id must not be empty")]
    ConnectionIdEmpty,

    #[error("message body must not be empty")]
    MessageBodyEmpty,

    #[error("message body is too long ({actual} chars, max {max})")]
    MessageBodyTooLong { actual: usize, max: usize },
}

/// Repository errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("connection '{0}' is not registered")]
    ConnectionNotFound(String),

    #[error("room '{0}' not found")]
    RoomNotFound(String),
}

/// History store errors
///
/// `StorageUnavailable` is the only failure the history gateway surfaces.
/// Callers treat it as retryable at the request level.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    #[error("message storage is unavailable: {0}")]
    StorageUnavailable(String),
}

/// Message push errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("client '{0}' not found")]
    ClientNotFound(String),

    #[error("outbound queue of client '{0}' is full")]
    QueueFull(String),

    #[error("connection of client '{0}' is closed")]
    ConnectionClosed(String),

    #[error("failed to encode event: {0}")]
    Serialization(String),
}
