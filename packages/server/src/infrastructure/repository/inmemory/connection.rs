//! InMemory Connection Repository 実装
//!
//! `ConnectionRegistry` 集約を 1 つの `Mutex` で保護します。
//! ルームのロックとは独立しており、ロック順序は常に「ルーム → レジストリ」です。

use std::collections::BTreeSet;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    Connection, ConnectionId, ConnectionRegistry, ConnectionRepository, Presence,
    RepositoryError, RoomName, Timestamp, Unregistered, UserId, UserIdentity,
};

/// インメモリ Connection Repository 実装
#[derive(Default)]
pub struct InMemoryConnectionRepository {
    registry: Mutex<ConnectionRegistry>,
}

impl InMemoryConnectionRepository {
    /// 新しい InMemoryConnectionRepository を作成
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConnectionRepository for InMemoryConnectionRepository {
    async fn register(&self, user: UserIdentity, connected_at: Timestamp) -> Connection {
        self.registry.lock().await.register(user, connected_at)
    }

    async fn unregister(
        &self,
        connection_id: &ConnectionId,
        now: Timestamp,
    ) -> Option<Unregistered> {
        self.registry.lock().await.unregister(connection_id, now)
    }

    async fn get(&self, connection_id: &ConnectionId) -> Option<Connection> {
        self.registry.lock().await.get(connection_id).cloned()
    }

    async fn connections_of(&self, user_id: &UserId) -> BTreeSet<ConnectionId> {
        self.registry.lock().await.connections_of(user_id)
    }

    async fn presence(&self, user_id: &UserId) -> Presence {
        self.registry.lock().await.presence(user_id)
    }

    async fn add_room(
        &self,
        connection_id: &ConnectionId,
        room: RoomName,
    ) -> Result<(), RepositoryError> {
        self.registry.lock().await.add_room(connection_id, room)
    }

    async fn remove_room(&self, connection_id: &ConnectionId, room: &RoomName) -> bool {
        self.registry.lock().await.remove_room(connection_id, room)
    }

    async fn count(&self) -> usize {
        self.registry.lock().await.len()
    }
}
