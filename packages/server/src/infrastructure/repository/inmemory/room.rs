//! InMemory Room Repository 実装
//!
//! ルーム名をキーにした Room のアリーナ。アリーナ自体は `RwLock` で保護し、
//! 各ルームは独立した `Mutex`（`RoomHandle`）を持ちます。
//! アリーナのロックはハンドルの取得・作成の間だけ保持されるため、
//! 別のルームに対する操作が互いにブロックすることはありません。

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use roomcast_shared::time::Clock;
use tokio::sync::{Mutex, RwLock};

use crate::domain::{Room, RoomHandle, RoomName, RoomRepository, Timestamp};

/// インメモリ Room Repository 実装
pub struct InMemoryRoomRepository {
    rooms: RwLock<BTreeMap<RoomName, RoomHandle>>,
    clock: Arc<dyn Clock>,
    typing_timeout: Duration,
}

impl InMemoryRoomRepository {
    /// 新しい InMemoryRoomRepository を作成
    pub fn new(clock: Arc<dyn Clock>, typing_timeout: Duration) -> Self {
        Self {
            rooms: RwLock::new(BTreeMap::new()),
            clock,
            typing_timeout,
        }
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn get_or_create(&self, name: &RoomName) -> RoomHandle {
        if let Some(handle) = self.rooms.read().await.get(name) {
            return handle.clone();
        }

        let mut rooms = self.rooms.write().await;
        rooms
            .entry(name.clone())
            .or_insert_with(|| {
                tracing::info!("Room '{}' created", name);
                Arc::new(Mutex::new(Room::new(
                    name.clone(),
                    Timestamp::new(self.clock.now_millis()),
                    self.typing_timeout,
                )))
            })
            .clone()
    }

    async fn find(&self, name: &RoomName) -> Option<RoomHandle> {
        self.rooms.read().await.get(name).cloned()
    }

    async fn list(&self) -> Vec<RoomHandle> {
        self.rooms.read().await.values().cloned().collect()
    }

    async fn remove_if_idle(&self, name: &RoomName) -> bool {
        let mut rooms = self.rooms.write().await;
        let Some(handle) = rooms.get(name).cloned() else {
            return false;
        };
        // 使用中のルームは待たずに残す
        let Ok(mut room) = handle.try_lock() else {
            return false;
        };
        if !room.is_disposable() {
            return false;
        }
        room.retire();
        drop(room);

        rooms.remove(name);
        tracing::info!("Room '{}' removed", name);
        true
    }
}
