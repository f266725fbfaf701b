//! Value objects of the chat domain.
//!
//! Every value object validates itself on construction, so the rest of the
//! crate can rely on identifiers and bodies being well-formed.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ValueObjectError;

/// Maximum length (in chars) of user ids, user names and room names
pub const MAX_ID_LENGTH: usize = 64;

/// Default maximum length (in chars) of a message body
pub const DEFAULT_MAX_MESSAGE_LENGTH: usize = 2000;

/// Identifier of an authenticated user, supplied by the authentication collaborator
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValueObjectError::UserIdEmpty);
        }
        let len = trimmed.chars().count();
        if len > MAX_ID_LENGTH {
            return Err(ValueObjectError::UserIdTooLong(len));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Display name of a user
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserName(String);

impl UserName {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValueObjectError::UserNameEmpty);
        }
        let len = trimmed.chars().count();
        if len > MAX_ID_LENGTH {
            return Err(ValueObjectError::UserNameTooLong(len));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<&UserId> for UserName {
    fn from(user_id: &UserId) -> Self {
        // UserId already satisfies the same constraints
        Self(user_id.as_str().to_string())
    }
}

/// Opaque identifier of one live connection, unique for the connection's lifetime
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.is_empty() {
            return Err(ValueObjectError::ConnectionIdEmpty);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// ConnectionId factory
pub struct ConnectionIdFactory;

impl ConnectionIdFactory {
    /// Generate a fresh random connection id (UUID v4)
    pub fn generate() -> ConnectionId {
        ConnectionId(Uuid::new_v4().to_string())
    }
}

/// Name of a room; rooms are created implicitly on first join
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoomName(String);

impl RoomName {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValueObjectError::RoomNameEmpty);
        }
        let len = trimmed.chars().count();
        if len > MAX_ID_LENGTH {
            return Err(ValueObjectError::RoomNameTooLong(len));
        }
        if trimmed.chars().any(char::is_control) {
            return Err(ValueObjectError::RoomNameInvalidCharacter);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for RoomName {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Body of a chat message, non-empty and bounded in length
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBody(String);

impl MessageBody {
    /// Validate a body against `max_len` (counted in chars).
    ///
    /// Whitespace-only bodies count as empty. The body itself is kept as sent.
    pub fn new(value: String, max_len: usize) -> Result<Self, ValueObjectError> {
        if value.trim().is_empty() {
            return Err(ValueObjectError::MessageBodyEmpty);
        }
        let len = value.chars().count();
        if len > max_len {
            return Err(ValueObjectError::MessageBodyTooLong {
                actual: len,
                max: max_len,
            });
        }
        Ok(Self(value))
    }

    /// Rebuild a body that was validated before it was persisted
    pub(crate) fn from_persisted(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Identifier of a persisted message; strictly increasing in append order
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct MessageId(i64);

impl MessageId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

/// Unix timestamp in milliseconds
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

/// Avatar colors, picked deterministically per user
const AVATAR_PALETTE: [&str; 6] = [
    "#667eea", "#764ba2", "#f093fb", "#f5576c", "#4facfe", "#43e97b",
];

/// Avatar color of a user (CSS hex color)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct AvatarColor(&'static str);

impl AvatarColor {
    /// Pick a palette color from the user id with FNV-1a, stable across restarts
    pub fn for_user(user_id: &UserId) -> Self {
        let hash = user_id
            .as_str()
            .bytes()
            .fold(0xcbf2_9ce4_8422_2325_u64, |acc, b| {
                (acc ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
            });
        let index = (hash % AVATAR_PALETTE.len() as u64) as usize;
        Self(AVATAR_PALETTE[index])
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_is_trimmed() {
        // テスト項目: UserId は前後の空白が除去される
        // given (前提条件):
        let raw = "  alice ".to_string();

        // when (操作):
        let user_id = UserId::new(raw).unwrap();

        // then (期待する結果):
        assert_eq!(user_id.as_str(), "alice");
    }

    #[test]
    fn test_user_id_rejects_blank() {
        // テスト項目: 空白のみの UserId はエラーになる
        // given (前提条件):
        let raw = "   ".to_string();

        // when (操作):
        let result = UserId::new(raw);

        // then (期待する結果):
        assert_eq!(result, Err(ValueObjectError::UserIdEmpty));
    }

    #[test]
    fn test_room_name_rejects_too_long() {
        // テスト項目: 上限を超える RoomName はエラーになる
        // given (前提条件):
        let raw = "r".repeat(MAX_ID_LENGTH + 1);

        // when (操作):
        let result = RoomName::new(raw);

        // then (期待する結果):
        assert_eq!(
            result,
            Err(ValueObjectError::RoomNameTooLong(MAX_ID_LENGTH + 1))
        );
    }

    #[test]
    fn test_room_name_rejects_control_characters() {
        // テスト項目: 制御文字を含む RoomName はエラーになる
        // given (前提条件):
        let raw = "gen\u{0007}eral".to_string();

        // when (操作):
        let result = RoomName::new(raw);

        // then (期待する結果):
        assert_eq!(result, Err(ValueObjectError::RoomNameInvalidCharacter));
    }

    #[test]
    fn test_message_body_rejects_whitespace_only() {
        // テスト項目: 空白のみのメッセージ本文はエラーになる
        // given (前提条件):
        let raw = " \n\t ".to_string();

        // when (操作):
        let result = MessageBody::new(raw, 10);

        // then (期待する結果):
        assert_eq!(result, Err(ValueObjectError::MessageBodyEmpty));
    }

    #[test]
    fn test_message_body_length_is_counted_in_chars() {
        // テスト項目: 本文の長さは文字数で判定される（マルチバイト文字を含む）
        // given (前提条件):
        let exact = "こんにちは".to_string(); // 5 chars, 15 bytes
        let over = "こんにちは!".to_string();

        // when (操作):
        let ok = MessageBody::new(exact, 5);
        let err = MessageBody::new(over, 5);

        // then (期待する結果):
        assert!(ok.is_ok());
        assert_eq!(
            err,
            Err(ValueObjectError::MessageBodyTooLong { actual: 6, max: 5 })
        );
    }

    #[test]
    fn test_connection_ids_are_unique() {
        // テスト項目: 生成される ConnectionId は一意である
        // given (前提条件):

        // when (操作):
        let a = ConnectionIdFactory::generate();
        let b = ConnectionIdFactory::generate();

        // then (期待する結果):
        assert_ne!(a, b);
    }

    #[test]
    fn test_avatar_color_is_stable_per_user() {
        // テスト項目: 同じユーザーには常に同じアバター色が割り当てられる
        // given (前提条件):
        let alice = UserId::new("alice".to_string()).unwrap();

        // when (操作):
        let first = AvatarColor::for_user(&alice);
        let second = AvatarColor::for_user(&alice);

        // then (期待する結果):
        assert_eq!(first, second);
        assert!(AVATAR_PALETTE.contains(&first.as_str()));
    }
}
