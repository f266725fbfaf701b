//! UseCase: ルーム参加処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - JoinRoomUseCase::execute() メソッド
//! - メンバーシップ追加、バックフィル・room_users の送信、user_joined の配信
//!
//! ### なぜこのテストが必要か
//! - 同じルームへの再参加が何も配信しない（冪等）ことを保証
//! - user_joined はユーザーの最初の接続が参加したときだけ、他のユーザーに届くことを確認
//! - 履歴ストアが落ちていても参加自体は成功することを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：新規参加、既存ルームへの参加
//! - 異常系：登録解除済みの接続からの参加、履歴ストア障害
//! - エッジケース：二重参加、同一ユーザーの 2 つ目のタブ

use std::sync::Arc;

use crate::domain::{
    ConnectionId, ConnectionRepository, ErrorCode, ErrorNotice, HistoryRepository, JoinOutcome,
    RoomName, RoomRepository, ServerEvent,
};

use super::{dispatcher::BroadcastDispatcher, error::JoinError};

/// ルーム参加のユースケース
pub struct JoinRoomUseCase {
    connections: Arc<dyn ConnectionRepository>,
    rooms: Arc<dyn RoomRepository>,
    history: Arc<dyn HistoryRepository>,
    dispatcher: Arc<BroadcastDispatcher>,
    /// 参加時に送る履歴の件数
    backfill_limit: usize,
}

impl JoinRoomUseCase {
    /// 新しい JoinRoomUseCase を作成
    pub fn new(
        connections: Arc<dyn ConnectionRepository>,
        rooms: Arc<dyn RoomRepository>,
        history: Arc<dyn HistoryRepository>,
        dispatcher: Arc<BroadcastDispatcher>,
        backfill_limit: usize,
    ) -> Self {
        Self {
            connections,
            rooms,
            history,
            dispatcher,
            backfill_limit,
        }
    }

    /// ルーム参加を実行
    ///
    /// ルームが存在しなければ作成する。参加した接続には
    /// 直近の履歴（新しい順）とオンラインユーザー一覧が送られる。
    ///
    /// # Returns
    ///
    /// * `Ok(JoinOutcome)` - 参加結果（既に参加済みなら `AlreadyMember`）
    /// * `Err(JoinError)` - 接続が既に登録解除されている
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        room_name: RoomName,
    ) -> Result<JoinOutcome, JoinError> {
        // 1. 接続を確認（登録解除済みの接続ではルームを作らない）
        let connection = self
            .connections
            .get(connection_id)
            .await
            .ok_or_else(|| JoinError::NotConnected(connection_id.to_string()))?;

        // 2. ルームをロック（削除済みのハンドルを掴んだら取り直す）
        let mut room = loop {
            let room = self.rooms.get_or_create(&room_name).await.lock_owned().await;
            if !room.is_retired() {
                break room;
            }
        };

        if room.is_member(connection_id) {
            return Ok(JoinOutcome::AlreadyMember);
        }

        // 3. レジストリ側に参加ルームを記録（ロック順序: ルーム → レジストリ）
        if self
            .connections
            .add_room(connection_id, room_name.clone())
            .await
            .is_err()
        {
            // 確認後に切断された。作ったばかりのルームを残さない
            drop(room);
            self.rooms.remove_if_idle(&room_name).await;
            return Err(JoinError::NotConnected(connection_id.to_string()));
        }

        // 4. メンバーシップを追加
        let user = connection.user;
        let outcome = room.join(connection_id.clone(), user.clone());

        // 5. 参加した接続にバックフィルとオンラインユーザー一覧を送信
        match self
            .history
            .page(&room_name, None, self.backfill_limit)
            .await
        {
            Ok(messages) => {
                if !messages.is_empty() {
                    room.record_history();
                }
                let event = ServerEvent::History {
                    room: room_name.clone(),
                    messages,
                };
                self.dispatcher.send_to(connection_id, &event).await;
            }
            Err(e) => {
                tracing::warn!("Backfill for room '{}' failed: {}", room_name, e);
                let notice = ErrorNotice::new(
                    ErrorCode::StorageUnavailable,
                    e.to_string(),
                    Some(room_name.clone()),
                );
                self.dispatcher
                    .send_to(connection_id, &ServerEvent::Error(notice))
                    .await;
            }
        }
        let users = ServerEvent::RoomUsers {
            room: room_name.clone(),
            users: room.online_users(),
        };
        self.dispatcher.send_to(connection_id, &users).await;

        // 6. ユーザーの最初の接続なら他のユーザーに通知
        if let JoinOutcome::Joined {
            first_for_user: true,
        } = outcome
        {
            let event = ServerEvent::UserJoined {
                room: room_name.clone(),
                user: user.summary(),
            };
            self.dispatcher
                .deliver_to_room(&room, &event, Some(&user.id))
                .await;
        }

        tracing::info!(
            "Connection '{}' ({}) joined room '{}'",
            connection_id,
            user.id,
            room_name
        );
        Ok(outcome)
    }
}
