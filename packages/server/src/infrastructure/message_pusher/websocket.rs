//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - 接続ごとの送信キュー（`PusherChannel`）を管理
//! - イベントを JSON にエンコードしてキューへ投入（push_to, broadcast）
//!
//! ## 設計ノート
//!
//! ソケットへの実際の書き込みは UI 層（`ui/handler/websocket.rs`）の
//! writer タスクが行います。ここではキューへの投入だけを行い、決して待機しません。
//! キューが満杯・切断済みの接続は配信失敗として呼び出し元に返されます。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc::error::TrySendError};

use crate::{
    domain::{ConnectionId, MessagePushError, MessagePusher, PusherChannel, ServerEvent},
    infrastructure::dto::websocket::ServerEventDto,
};

/// WebSocket を使った MessagePusher 実装
///
/// ## 使用例
///
/// ```ignore
/// let pusher = WebSocketMessagePusher::new();
/// pusher.register_client(connection_id.clone(), tx).await;
/// pusher.push_to(&connection_id, &event).await?;
/// ```
#[derive(Default)]
pub struct WebSocketMessagePusher {
    /// 接続中のクライアントの送信キュー
    clients: Mutex<HashMap<ConnectionId, PusherChannel>>,
}

impl WebSocketMessagePusher {
    /// 新しい WebSocketMessagePusher を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// イベントを JSON フレームにエンコード
    pub fn encode(event: &ServerEvent) -> Result<String, MessagePushError> {
        serde_json::to_string(&ServerEventDto::from(event))
            .map_err(|e| MessagePushError::Serialization(e.to_string()))
    }

    fn enqueue(
        connection_id: &ConnectionId,
        sender: &PusherChannel,
        frame: String,
    ) -> Result<(), MessagePushError> {
        sender.try_send(frame).map_err(|e| match e {
            TrySendError::Full(_) => MessagePushError::QueueFull(connection_id.to_string()),
            TrySendError::Closed(_) => {
                MessagePushError::ConnectionClosed(connection_id.to_string())
            }
        })
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel) {
        let mut clients = self.clients.lock().await;
        tracing::debug!("Connection '{}' registered to MessagePusher", connection_id);
        clients.insert(connection_id, sender);
    }

    async fn unregister_client(&self, connection_id: &ConnectionId) {
        let mut clients = self.clients.lock().await;
        // Dropping the sender ends the connection's writer task
        if clients.remove(connection_id).is_some() {
            tracing::debug!(
                "Connection '{}' unregistered from MessagePusher",
                connection_id
            );
        }
    }

    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        event: &ServerEvent,
    ) -> Result<(), MessagePushError> {
        let frame = Self::encode(event)?;
        let clients = self.clients.lock().await;

        let sender = clients
            .get(connection_id)
            .ok_or_else(|| MessagePushError::ClientNotFound(connection_id.to_string()))?;
        Self::enqueue(connection_id, sender, frame)?;
        tracing::debug!("Pushed '{}' to connection '{}'", event.kind(), connection_id);
        Ok(())
    }

    async fn broadcast(
        &self,
        targets: &[ConnectionId],
        event: &ServerEvent,
    ) -> Result<Vec<ConnectionId>, MessagePushError> {
        let frame = Self::encode(event)?;
        let clients = self.clients.lock().await;
        let mut failed = Vec::new();

        for target in targets {
            match clients.get(target) {
                Some(sender) => {
                    // ブロードキャストでは一部の送信失敗を許容
                    if let Err(e) = Self::enqueue(target, sender, frame.clone()) {
                        tracing::warn!("Failed to push '{}': {}", event.kind(), e);
                        failed.push(target.clone());
                    } else {
                        tracing::debug!("Broadcasted '{}' to connection '{}'", event.kind(), target);
                    }
                }
                None => {
                    tracing::debug!(
                        "Connection '{}' not found during broadcast, skipping",
                        target
                    );
                }
            }
        }

        Ok(failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RoomName, UserId};
    use tokio::sync::mpsc;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - push_to: 特定の接続への送信
    // - broadcast: 複数接続への送信と、失敗した接続の報告
    //
    // 【なぜこのテストが必要か】
    // - 遅い接続が他の接続への配信を止めないことを保証する
    // - 満杯・切断済みのキューが dead connection として報告されることを確認する
    // ========================================

    fn conn(id: &str) -> ConnectionId {
        ConnectionId::new(id.to_string()).unwrap()
    }

    fn typing_event() -> ServerEvent {
        ServerEvent::Typing {
            room: RoomName::new("general".to_string()).unwrap(),
            user_id: UserId::new("alice".to_string()).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_push_to_success() {
        // テスト項目: 特定の接続にエンコード済みイベントが届く
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let (tx, mut rx) = mpsc::channel(8);
        pusher.register_client(conn("c1"), tx).await;

        // when (操作):
        let result = pusher.push_to(&conn("c1"), &typing_event()).await;

        // then (期待する結果):
        assert!(result.is_ok());
        let frame = rx.recv().await.unwrap();
        let json: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(json["type"], "typing");
        assert_eq!(json["user_id"], "alice");
    }

    #[tokio::test]
    async fn test_push_to_client_not_found() {
        // テスト項目: 存在しない接続への送信はエラーを返す
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();

        // when (操作):
        let result = pusher.push_to(&conn("ghost"), &typing_event()).await;

        // then (期待する結果):
        assert!(matches!(result, Err(MessagePushError::ClientNotFound(_))));
    }

    #[tokio::test]
    async fn test_broadcast_reports_full_queue_without_blocking_others() {
        // テスト項目: キューが満杯の接続は失敗として報告され、他の接続には届く
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let (slow_tx, _slow_rx) = mpsc::channel(1);
        let (fast_tx, mut fast_rx) = mpsc::channel(8);
        pusher.register_client(conn("slow"), slow_tx).await;
        pusher.register_client(conn("fast"), fast_tx).await;
        pusher.push_to(&conn("slow"), &typing_event()).await.unwrap();

        // when (操作):
        let failed = pusher
            .broadcast(&[conn("slow"), conn("fast")], &typing_event())
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(failed, vec![conn("slow")]);
        assert!(fast_rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_broadcast_reports_closed_connection() {
        // テスト項目: 受信側が閉じた接続は失敗として報告される
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let (tx, rx) = mpsc::channel(8);
        pusher.register_client(conn("gone"), tx).await;
        drop(rx);

        // when (操作):
        let failed = pusher.broadcast(&[conn("gone")], &typing_event()).await.unwrap();

        // then (期待する結果):
        assert_eq!(failed, vec![conn("gone")]);
    }

    #[tokio::test]
    async fn test_unregister_closes_channel() {
        // テスト項目: 登録解除すると送信キューが閉じられる
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let (tx, mut rx) = mpsc::channel(8);
        pusher.register_client(conn("c1"), tx).await;

        // when (操作):
        pusher.unregister_client(&conn("c1")).await;

        // then (期待する結果):
        assert_eq!(rx.recv().await, None);
    }
}
