//! UseCase: ルーム詳細取得処理

use std::sync::Arc;

use crate::domain::{RoomName, RoomRepository, RoomSnapshot};

use super::error::GetRoomDetailError;

/// ルーム詳細取得のユースケース
pub struct GetRoomDetailUseCase {
    rooms: Arc<dyn RoomRepository>,
}

impl GetRoomDetailUseCase {
    /// 新しい GetRoomDetailUseCase を作成
    pub fn new(rooms: Arc<dyn RoomRepository>) -> Self {
        Self { rooms }
    }

    /// ルームのスナップショットを取得
    pub async fn execute(&self, room_name: &RoomName) -> Result<RoomSnapshot, GetRoomDetailError> {
        let handle = self
            .rooms
            .find(room_name)
            .await
            .ok_or_else(|| GetRoomDetailError::RoomNotFound(room_name.to_string()))?;
        let room = handle.lock().await;
        Ok(room.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecase::test_support::{Harness, room};

    #[tokio::test]
    async fn test_room_detail() {
        // テスト項目: 参加者のいるルームの詳細を取得できる
        // given (前提条件):
        let harness = Harness::new();
        let mut alice = harness.connect("alice").await;
        harness.join(&mut alice, "general").await;
        let usecase = GetRoomDetailUseCase::new(harness.rooms.clone());

        // when (操作):
        let detail = usecase.execute(&room("general")).await.unwrap();

        // then (期待する結果):
        assert_eq!(detail.name, room("general"));
        assert_eq!(detail.users[0].user_id.as_str(), "alice");
    }

    #[tokio::test]
    async fn test_unknown_room_is_not_found() {
        // テスト項目: 一度も作られていないルームは RoomNotFound になる
        // given (前提条件):
        let harness = Harness::new();
        let usecase = GetRoomDetailUseCase::new(harness.rooms.clone());

        // when (操作):
        let result = usecase.execute(&room("nowhere")).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(GetRoomDetailError::RoomNotFound("nowhere".to_string()))
        );
    }
}
