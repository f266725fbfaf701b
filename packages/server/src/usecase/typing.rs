//! UseCase: typing インジケーター
//!
//! (ルーム, ユーザー) ごとの状態機械を駆動します。
//!
//! ```text
//! Idle --typing--> Typing(deadline)      typing を配信
//! Typing --typing--> Typing(deadline')   配信なし（期限のみ延長）
//! Typing --stop_typing / leave--> Idle   stop_typing を配信
//! Typing --期限切れ--> Idle               stop_typing を配信（1 回だけ）
//! ```
//!
//! 期限切れの判定は、各操作の冒頭と定期的な sweep の両方で行います。
//! どちらもルームのロック内で行うため、stop_typing が二重に配信されることはありません。
//! sweep はロック中のルームを飛ばすので、あるルームの遅い処理が
//! 別のルームの期限切れを遅らせることはありません。

use std::{sync::Arc, time::Duration};

use tokio::{
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};

use crate::domain::{
    ConnectionId, Room, RoomName, RoomRepository, ServerEvent, TypingTransition, UserIdentity,
};

use super::{dispatcher::BroadcastDispatcher, error::TypingError};

/// typing シグナルのユースケース
pub struct TypingUseCase {
    rooms: Arc<dyn RoomRepository>,
    dispatcher: Arc<BroadcastDispatcher>,
}

impl TypingUseCase {
    /// 新しい TypingUseCase を作成
    pub fn new(rooms: Arc<dyn RoomRepository>, dispatcher: Arc<BroadcastDispatcher>) -> Self {
        Self { rooms, dispatcher }
    }

    /// typing シグナルを処理
    ///
    /// # Returns
    ///
    /// * `Ok(TypingTransition::Started)` - typing を配信した
    /// * `Ok(TypingTransition::Refreshed)` - 期限のみ延長した
    /// * `Err(TypingError)` - 接続がルームのメンバーでない
    pub async fn start(
        &self,
        connection_id: &ConnectionId,
        room_name: &RoomName,
    ) -> Result<TypingTransition, TypingError> {
        let handle = self
            .rooms
            .find(room_name)
            .await
            .ok_or_else(|| TypingError::NotMember(room_name.to_string()))?;
        let mut room = handle.lock().await;
        let user = member_of(&room, connection_id, room_name)?;

        let now = Instant::now();
        self.flush_expired(&mut room, now).await;

        let transition = room.start_typing(&user.id, now);
        if transition == TypingTransition::Started {
            let event = ServerEvent::Typing {
                room: room_name.clone(),
                user_id: user.id.clone(),
            };
            self.dispatcher
                .deliver_to_room(&room, &event, Some(&user.id))
                .await;
        }
        Ok(transition)
    }

    /// stop_typing シグナルを処理
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - stop_typing を配信した
    /// * `Ok(false)` - 入力中ではなかった
    /// * `Err(TypingError)` - 接続がルームのメンバーでない
    pub async fn stop(
        &self,
        connection_id: &ConnectionId,
        room_name: &RoomName,
    ) -> Result<bool, TypingError> {
        let handle = self
            .rooms
            .find(room_name)
            .await
            .ok_or_else(|| TypingError::NotMember(room_name.to_string()))?;
        let mut room = handle.lock().await;
        let user = member_of(&room, connection_id, room_name)?;

        self.flush_expired(&mut room, Instant::now()).await;

        if !room.stop_typing(&user.id) {
            return Ok(false);
        }
        let event = ServerEvent::StopTyping {
            room: room_name.clone(),
            user_id: user.id.clone(),
        };
        self.dispatcher
            .deliver_to_room(&room, &event, Some(&user.id))
            .await;
        Ok(true)
    }

    /// 全ルームの期限切れの typing を終了させる
    ///
    /// 他の操作がロック中のルームは待たずに飛ばし、次の sweep で再試行する。
    /// 空になったルームもここでアリーナから外す。
    ///
    /// # Returns
    ///
    /// 終了させた typing の数
    pub async fn sweep(&self, now: Instant) -> usize {
        let mut expired = 0;
        let mut idle = Vec::new();
        for handle in self.rooms.list().await {
            let Ok(mut room) = handle.try_lock() else {
                continue;
            };
            expired += self.flush_expired(&mut room, now).await;
            if room.is_disposable() {
                idle.push(room.name.clone());
            }
        }
        for name in &idle {
            self.rooms.remove_if_idle(name).await;
        }
        expired
    }

    /// 一定間隔で sweep するタスクを起動
    pub fn spawn_sweeper(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let expired = self.sweep(Instant::now()).await;
                if expired > 0 {
                    tracing::debug!("Expired {} typing indicator(s)", expired);
                }
            }
        })
    }

    async fn flush_expired(&self, room: &mut Room, now: Instant) -> usize {
        let expired = room.expire_typing(now);
        for user_id in &expired {
            let event = ServerEvent::StopTyping {
                room: room.name.clone(),
                user_id: user_id.clone(),
            };
            self.dispatcher
                .deliver_to_room(room, &event, Some(user_id))
                .await;
        }
        expired.len()
    }
}

fn member_of(
    room: &Room,
    connection_id: &ConnectionId,
    room_name: &RoomName,
) -> Result<UserIdentity, TypingError> {
    room.member(connection_id)
        .cloned()
        .ok_or_else(|| TypingError::NotMember(room_name.to_string()))
}
