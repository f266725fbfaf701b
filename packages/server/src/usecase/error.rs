//! UseCase 層のエラー定義
//!
//! 各ユースケースのエラーは、クライアントに見せる `ErrorCode` に対応付けられます。
//! 検証・メンバーシップのエラーは操作した接続にのみ同期的に返され、
//! 接続自体は開いたままです。

use thiserror::Error;

use crate::domain::{ErrorCode, ErrorNotice, RoomName, ValueObjectError};

/// 参加者接続のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    /// 認証コラボレーターが検証済みの ID を渡さなかった
    #[error("no verified user identity was supplied")]
    Unauthenticated,
}

/// ルーム参加のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinError {
    /// 接続がすでにレジストリから削除されている
    #[error("connection '{0}' is not registered")]
    NotConnected(String),
}

/// メッセージ送信のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendMessageError {
    #[error("connection is not a member of room '{0}'")]
    NotMember(String),

    #[error("invalid message: {0}")]
    InvalidMessage(#[from] ValueObjectError),

    #[error("message could not be stored: {0}")]
    StorageUnavailable(String),
}

/// typing シグナルのエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypingError {
    #[error("connection is not a member of room '{0}'")]
    NotMember(String),
}

/// 履歴取得のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryQueryError {
    #[error("limit must be between 1 and {max}, got {limit}")]
    InvalidLimit { limit: usize, max: usize },

    #[error("history could not be loaded: {0}")]
    StorageUnavailable(String),
}

/// ルーム詳細取得のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GetRoomDetailError {
    #[error("room '{0}' not found")]
    RoomNotFound(String),
}

impl ConnectError {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::Unauthenticated
    }
}

impl JoinError {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::NotMember
    }
}

impl SendMessageError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotMember(_) => ErrorCode::NotMember,
            Self::InvalidMessage(_) => ErrorCode::InvalidMessage,
            Self::StorageUnavailable(_) => ErrorCode::StorageUnavailable,
        }
    }
}

impl TypingError {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::NotMember
    }
}

impl HistoryQueryError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidLimit { .. } => ErrorCode::BadRequest,
            Self::StorageUnavailable(_) => ErrorCode::StorageUnavailable,
        }
    }
}

/// エラーをクライアント向けの通知に変換
pub fn notice_for<E>(error: &E, code: ErrorCode, room: Option<RoomName>) -> ErrorNotice
where
    E: std::error::Error,
{
    ErrorNotice::new(code, error.to_string(), room)
}
