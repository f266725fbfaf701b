//! SQLite History Repository 実装
//!
//! `sqlx` の SQLite プールを使ってメッセージを永続化します。
//! テーブルは起動時に存在しなければ作成します。
//! 接続・クエリの失敗はすべて `HistoryError::StorageUnavailable` に変換されます。

use std::{str::FromStr, sync::Arc};

use async_trait::async_trait;
use roomcast_shared::time::Clock;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

use crate::domain::{
    HistoryError, HistoryRepository, Message, MessageBody, MessageId, MessageKind, NewMessage,
    RoomName, Timestamp, UserId, UserName,
};

const CREATE_MESSAGES_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS messages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        room_name TEXT NOT NULL,
        user_id TEXT NOT NULL,
        username TEXT NOT NULL,
        message TEXT NOT NULL,
        message_type TEXT NOT NULL DEFAULT 'text',
        created_at INTEGER NOT NULL
    )
";

const CREATE_ROOM_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_messages_room_id ON messages (room_name, id)";

type MessageRow = (i64, String, String, String, String, String, i64);

fn unavailable(error: sqlx::Error) -> HistoryError {
    tracing::warn!("SQLite history store error: {}", error);
    HistoryError::StorageUnavailable(error.to_string())
}

/// SQLite History Repository 実装
pub struct SqliteHistoryRepository {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl SqliteHistoryRepository {
    /// データベースに接続し、テーブルを準備する
    ///
    /// `database_url` の例: `sqlite://chat.db`, `sqlite::memory:`
    pub async fn connect(database_url: &str, clock: Arc<dyn Clock>) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // An in-memory database exists per connection
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let repository = Self { pool, clock };
        repository.migrate().await?;
        tracing::info!("SQLite history store ready at {}", database_url);
        Ok(repository)
    }

    async fn migrate(&self) -> Result<(), sqlx::Error> {
        sqlx::query(CREATE_MESSAGES_TABLE).execute(&self.pool).await?;
        sqlx::query(CREATE_ROOM_INDEX).execute(&self.pool).await?;
        Ok(())
    }

    fn row_to_message(row: MessageRow) -> Result<Message, HistoryError> {
        let (id, room, user_id, username, body, kind, created_at) = row;
        let corrupt = |field: &str| {
            HistoryError::StorageUnavailable(format!("corrupt {field} in message {id}"))
        };
        Ok(Message {
            id: MessageId::new(id),
            room: RoomName::new(room).map_err(|_| corrupt("room_name"))?,
            sender_id: UserId::new(user_id).map_err(|_| corrupt("user_id"))?,
            sender_name: UserName::new(username).map_err(|_| corrupt("username"))?,
            body: MessageBody::from_persisted(body),
            kind: MessageKind::parse(&kind).ok_or_else(|| corrupt("message_type"))?,
            created_at: Timestamp::new(created_at),
        })
    }
}

#[async_trait]
impl HistoryRepository for SqliteHistoryRepository {
    async fn append(&self, message: NewMessage) -> Result<Message, HistoryError> {
        let created_at = Timestamp::new(self.clock.now_millis());
        let result = sqlx::query(
            "INSERT INTO messages (room_name, user_id, username, message, message_type, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(message.room.as_str())
        .bind(message.sender_id.as_str())
        .bind(message.sender_name.as_str())
        .bind(message.body.as_str())
        .bind(message.kind.as_str())
        .bind(created_at.value())
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        let id = MessageId::new(result.last_insert_rowid());
        Ok(Message::from_new(message, id, created_at))
    }

    async fn page(
        &self,
        room: &RoomName,
        before: Option<MessageId>,
        limit: usize,
    ) -> Result<Vec<Message>, HistoryError> {
        let before = before.map_or(i64::MAX, |id| id.value());
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows: Vec<MessageRow> = sqlx::query_as(
            "SELECT id, room_name, user_id, username, message, message_type, created_at
             FROM messages
             WHERE room_name = ? AND id < ?
             ORDER BY id DESC
             LIMIT ?",
        )
        .bind(room.as_str())
        .bind(before)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;

        rows.into_iter().map(Self::row_to_message).collect()
    }
}
