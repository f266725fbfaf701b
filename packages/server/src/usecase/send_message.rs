//! UseCase: メッセージ送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() メソッド
//! - 本文の検証、メンバーシップ確認、履歴への追記、ルームへの配信
//!
//! ### なぜこのテストが必要か
//! - 拒否された送信が永続化も配信もされないことを保証
//! - 永続化に失敗したメッセージが配信されないことを確認
//! - 同じルームへの並行送信が全メンバーに同じ順序で届くことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：送信者を含む全メンバーへの配信
//! - 異常系：非メンバーからの送信、空・長すぎる本文、ストレージ障害
//! - エッジケース：並行送信時の順序

use std::sync::Arc;

use crate::domain::{
    ConnectionId, HistoryRepository, Message, MessageBody, MessageKind, NewMessage, RoomName,
    RoomRepository, ServerEvent,
};

use super::{dispatcher::BroadcastDispatcher, error::SendMessageError};

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    rooms: Arc<dyn RoomRepository>,
    /// 永続化コラボレーター
    history: Arc<dyn HistoryRepository>,
    dispatcher: Arc<BroadcastDispatcher>,
    max_message_length: usize,
}

impl SendMessageUseCase {
    /// 新しい SendMessageUseCase を作成
    pub fn new(
        rooms: Arc<dyn RoomRepository>,
        history: Arc<dyn HistoryRepository>,
        dispatcher: Arc<BroadcastDispatcher>,
        max_message_length: usize,
    ) -> Self {
        Self {
            rooms,
            history,
            dispatcher,
            max_message_length,
        }
    }

    /// メッセージ送信を実行
    ///
    /// 永続化に成功したメッセージだけが、送信者を含むルームの全接続に配信される。
    /// 追記と配信はルームのロック内で行うため、配信順は ID 順と一致する。
    ///
    /// # Returns
    ///
    /// * `Ok(Message)` - 永続化されたメッセージ
    /// * `Err(SendMessageError)` - 拒否（何も配信されない）
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        room_name: &RoomName,
        body: String,
    ) -> Result<Message, SendMessageError> {
        // 1. 本文を検証
        let body = MessageBody::new(body, self.max_message_length)?;

        // 2. メンバーシップを確認
        let handle = self
            .rooms
            .find(room_name)
            .await
            .ok_or_else(|| SendMessageError::NotMember(room_name.to_string()))?;
        let mut room = handle.lock().await;
        let sender = room
            .member(connection_id)
            .cloned()
            .ok_or_else(|| SendMessageError::NotMember(room_name.to_string()))?;

        // 3. 永続化
        let new_message = NewMessage {
            room: room_name.clone(),
            sender_id: sender.id,
            sender_name: sender.name,
            body,
            kind: MessageKind::Text,
        };
        let message = self.history.append(new_message).await.map_err(|e| {
            tracing::error!("Failed to persist message in room '{}': {}", room_name, e);
            SendMessageError::StorageUnavailable(e.to_string())
        })?;
        room.record_history();

        // 4. ルームの全接続に配信
        let delivered = self
            .dispatcher
            .deliver_to_room(&room, &ServerEvent::Message(message.clone()), None)
            .await;
        tracing::debug!(
            "Message {} in room '{}' delivered to {} connection(s)",
            message.id.value(),
            room_name,
            delivered
        );

        Ok(message)
    }
}
