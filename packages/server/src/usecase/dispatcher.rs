//! Broadcast Dispatcher
//!
//! ルーム単位の配信プリミティブ。メッセージもシステムイベント
//! （user_joined / user_left / typing / stop_typing）も同じ経路で配信されます。
//!
//! ## 順序保証
//!
//! `deliver_to_room` は `&Room` を受け取るため、呼び出し側は必ずルームのロックを
//! 保持しています。キューへの投入はロックの内側で完了するので、
//! 同じルームのイベントはすべてのメンバーに同じ相対順序で届きます。
//!
//! ## 障害の分離
//!
//! 投入はノンブロッキングです。キューが満杯・切断済みの接続は他の接続への
//! 配信を巻き戻さず、dead connection として登録解除キューに送られます。

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::domain::{ConnectionId, MessagePushError, MessagePusher, Room, ServerEvent, UserId};

/// ルーム単位の配信を担う Dispatcher
pub struct BroadcastDispatcher {
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    /// 登録解除を待つ dead connection の通知先
    dead_connections: mpsc::UnboundedSender<ConnectionId>,
}

impl BroadcastDispatcher {
    /// 新しい BroadcastDispatcher を作成
    pub fn new(
        message_pusher: Arc<dyn MessagePusher>,
        dead_connections: mpsc::UnboundedSender<ConnectionId>,
    ) -> Self {
        Self {
            message_pusher,
            dead_connections,
        }
    }

    /// ルームのメンバーにイベントを配信
    ///
    /// `exclude_user` を指定すると、そのユーザーのすべての接続を除外する。
    ///
    /// # Returns
    ///
    /// 配信対象になった接続数
    pub async fn deliver_to_room(
        &self,
        room: &Room,
        event: &ServerEvent,
        exclude_user: Option<&UserId>,
    ) -> usize {
        let targets = match exclude_user {
            Some(user_id) => room.connections_excluding_user(user_id),
            None => room.member_connections(),
        };
        if targets.is_empty() {
            return 0;
        }

        match self.message_pusher.broadcast(&targets, event).await {
            Ok(failed) => {
                for connection_id in failed {
                    self.schedule_unregister(connection_id);
                }
            }
            Err(e) => {
                tracing::error!(
                    "Failed to broadcast '{}' to room '{}': {}",
                    event.kind(),
                    room.name,
                    e
                );
            }
        }
        targets.len()
    }

    /// 1 接続にのみイベントを送信（バックフィル、room_users、エラー通知）
    pub async fn send_to(&self, connection_id: &ConnectionId, event: &ServerEvent) {
        match self.message_pusher.push_to(connection_id, event).await {
            Ok(()) => {}
            Err(MessagePushError::ClientNotFound(_)) => {
                tracing::debug!(
                    "Connection '{}' already gone, dropping '{}'",
                    connection_id,
                    event.kind()
                );
            }
            Err(e @ (MessagePushError::QueueFull(_) | MessagePushError::ConnectionClosed(_))) => {
                tracing::warn!("Delivery to '{}' failed: {}", connection_id, e);
                self.schedule_unregister(connection_id.clone());
            }
            Err(e) => {
                tracing::error!("Failed to send '{}': {}", event.kind(), e);
            }
        }
    }

    fn schedule_unregister(&self, connection_id: ConnectionId) {
        tracing::info!(
            "Connection '{}' failed to receive in time, scheduling unregistration",
            connection_id
        );
        // The reaper is gone only during shutdown
        let _ = self.dead_connections.send(connection_id);
    }
}
