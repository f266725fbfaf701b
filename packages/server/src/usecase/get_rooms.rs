//! UseCase: ルーム一覧取得処理

use std::sync::Arc;

use crate::domain::{RoomRepository, RoomSnapshot};

/// ルーム一覧取得のユースケース
pub struct GetRoomsUseCase {
    rooms: Arc<dyn RoomRepository>,
}

impl GetRoomsUseCase {
    /// 新しい GetRoomsUseCase を作成
    pub fn new(rooms: Arc<dyn RoomRepository>) -> Self {
        Self { rooms }
    }

    /// 全ルームのスナップショットをルーム名の辞書順で取得
    pub async fn execute(&self) -> Vec<RoomSnapshot> {
        let handles = self.rooms.list().await;
        let mut snapshots = Vec::with_capacity(handles.len());
        for handle in handles {
            snapshots.push(handle.lock().await.snapshot());
        }
        snapshots
    }
}
