//! UseCase: 参加者切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectParticipantUseCase::execute() メソッド
//! - 接続の登録解除と、参加中の全ルームからの連鎖的な退出
//! - 配信に失敗した接続を登録解除する reaper タスク
//!
//! ### なぜこのテストが必要か
//! - 切断後に接続がどのルームにも残らないことを保証
//! - 最後の接続が切れたときだけユーザーがオフラインになることを確認
//! - 同じ接続に対する二重の切断が安全であることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：複数ルームに参加中の接続の切断
//! - エッジケース：同一ユーザーの別タブが残る場合、二重切断、未登録 ID

use std::sync::Arc;

use tokio::{sync::mpsc, task::JoinHandle};

use roomcast_shared::time::Clock;

use crate::domain::{
    ConnectionId, ConnectionRepository, MessagePusher, RoomName, RoomRepository, Timestamp,
};

use super::{dispatcher::BroadcastDispatcher, leave_room::announce_departure};

/// 切断処理の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisconnectOutcome {
    /// 退出したルーム（辞書順）
    pub rooms_left: Vec<RoomName>,
    /// ユーザーの最後の接続だったか
    pub went_offline: bool,
}

/// 参加者切断のユースケース
pub struct DisconnectParticipantUseCase {
    connections: Arc<dyn ConnectionRepository>,
    rooms: Arc<dyn RoomRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    dispatcher: Arc<BroadcastDispatcher>,
    clock: Arc<dyn Clock>,
}

impl DisconnectParticipantUseCase {
    /// 新しい DisconnectParticipantUseCase を作成
    pub fn new(
        connections: Arc<dyn ConnectionRepository>,
        rooms: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        dispatcher: Arc<BroadcastDispatcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            connections,
            rooms,
            message_pusher,
            dispatcher,
            clock,
        }
    }

    /// 参加者切断を実行
    ///
    /// 送信キューを先に破棄するため、この接続への配信は以降すべて取り消される。
    /// 参加中のルームはルーム名の辞書順に 1 つずつ退出する。
    ///
    /// # Returns
    ///
    /// * `Some(DisconnectOutcome)` - 切断した
    /// * `None` - 既に登録解除済み（何もしない）
    pub async fn execute(&self, connection_id: &ConnectionId) -> Option<DisconnectOutcome> {
        // 1. 送信キューを破棄
        self.message_pusher.unregister_client(connection_id).await;

        // 2. レジストリから削除（以降の join はすべて NotConnected になる）
        let now = Timestamp::new(self.clock.now_millis());
        let unregistered = self.connections.unregister(connection_id, now).await?;

        // 3. 参加中の全ルームから退出
        let mut rooms_left = Vec::with_capacity(unregistered.connection.rooms.len());
        for room_name in &unregistered.connection.rooms {
            let Some(handle) = self.rooms.find(room_name).await else {
                continue;
            };
            let mut room = handle.lock().await;
            let Some(outcome) = room.leave(connection_id) else {
                continue;
            };
            announce_departure(&self.dispatcher, &room, &outcome).await;
            rooms_left.push(room_name.clone());

            let disposable = room.is_disposable();
            drop(room);
            if disposable {
                self.rooms.remove_if_idle(room_name).await;
            }
        }

        tracing::info!(
            "Connection '{}' ({}) disconnected, left {} room(s)",
            connection_id,
            unregistered.connection.user.id,
            rooms_left.len()
        );
        if unregistered.went_offline {
            tracing::info!("User '{}' is now offline", unregistered.connection.user.id);
        }

        Some(DisconnectOutcome {
            rooms_left,
            went_offline: unregistered.went_offline,
        })
    }

    /// 配信に失敗した接続を登録解除するタスクを起動
    pub fn spawn_reaper(
        self: Arc<Self>,
        mut dead_connections: mpsc::UnboundedReceiver<ConnectionId>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(connection_id) = dead_connections.recv().await {
                if self.execute(&connection_id).await.is_some() {
                    tracing::warn!("Unregistered unresponsive connection '{}'", connection_id);
                }
            }
        })
    }
}
