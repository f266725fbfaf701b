//! UseCase: ルーム退出処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - LeaveRoomUseCase::execute() メソッド
//! - メンバーシップ削除、typing 状態のクリア、user_left の配信
//!
//! ### なぜこのテストが必要か
//! - 参加していないルームからの退出が何も起こさないことを保証
//! - 退出したユーザーの typing 表示が残らないことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：参加中のルームからの退出
//! - エッジケース：未参加ルーム、存在しないルーム、同一ユーザーの別タブが残っている場合

use std::sync::Arc;

use crate::domain::{
    ConnectionId, ConnectionRepository, LeaveOutcome, Room, RoomName, RoomRepository,
    ServerEvent,
};

use super::dispatcher::BroadcastDispatcher;

/// ルーム退出のユースケース
pub struct LeaveRoomUseCase {
    connections: Arc<dyn ConnectionRepository>,
    rooms: Arc<dyn RoomRepository>,
    dispatcher: Arc<BroadcastDispatcher>,
}

impl LeaveRoomUseCase {
    /// 新しい LeaveRoomUseCase を作成
    pub fn new(
        connections: Arc<dyn ConnectionRepository>,
        rooms: Arc<dyn RoomRepository>,
        dispatcher: Arc<BroadcastDispatcher>,
    ) -> Self {
        Self {
            connections,
            rooms,
            dispatcher,
        }
    }

    /// ルーム退出を実行
    ///
    /// # Returns
    ///
    /// 実際に退出した場合は `true`、参加していなかった場合は `false`
    pub async fn execute(&self, connection_id: &ConnectionId, room_name: &RoomName) -> bool {
        let Some(handle) = self.rooms.find(room_name).await else {
            return false;
        };
        let mut room = handle.lock().await;

        let Some(outcome) = room.leave(connection_id) else {
            return false;
        };
        self.connections.remove_room(connection_id, room_name).await;

        announce_departure(&self.dispatcher, &room, &outcome).await;
        tracing::info!(
            "Connection '{}' ({}) left room '{}'",
            connection_id,
            outcome.user.id,
            room_name
        );

        // 誰もいなくなり履歴も無いルームはアリーナから外す
        let disposable = room.is_disposable();
        drop(room);
        if disposable {
            self.rooms.remove_if_idle(room_name).await;
        }
        true
    }
}

/// 退出に伴うイベントを残りのメンバーに配信
///
/// ルームのロックを保持したまま呼び出すこと。
pub(super) async fn announce_departure(
    dispatcher: &BroadcastDispatcher,
    room: &Room,
    outcome: &LeaveOutcome,
) {
    let user_id = &outcome.user.id;
    if outcome.typing_cleared {
        let event = ServerEvent::StopTyping {
            room: room.name.clone(),
            user_id: user_id.clone(),
        };
        dispatcher.deliver_to_room(room, &event, Some(user_id)).await;
    }
    if outcome.last_for_user {
        let event = ServerEvent::UserLeft {
            room: room.name.clone(),
            user: outcome.user.summary(),
        };
        dispatcher.deliver_to_room(room, &event, Some(user_id)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        infrastructure::dto::websocket::ServerEventDto,
        usecase::test_support::{Harness, room},
    };

    #[tokio::test]
    async fn test_leave_notifies_remaining_members() {
        // テスト項目: 退出すると残りのメンバーに user_left が届く
        // given (前提条件):
        let harness = Harness::new();
        let mut alice = harness.connect("alice").await;
        let mut bob = harness.connect("bob").await;
        harness.join(&mut alice, "general").await;
        harness.join(&mut bob, "general").await;
        alice.drain();

        // when (操作):
        let left = harness
            .leave_usecase()
            .execute(bob.id(), &room("general"))
            .await;

        // then (期待する結果):
        assert!(left);
        let events = alice.drain();
        assert_eq!(events.len(), 1);
        match &events[0] {
            ServerEventDto::UserLeft(user) => assert_eq!(user.user_id, "bob"),
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(bob.drain().is_empty());
        let connection = harness.connections.get(bob.id()).await.unwrap();
        assert!(connection.rooms.is_empty());
    }

    #[tokio::test]
    async fn test_leave_unjoined_room_is_noop() {
        // テスト項目: 参加していないルームからの退出は何も起こさない
        // given (前提条件):
        let harness = Harness::new();
        let mut alice = harness.connect("alice").await;
        let bob = harness.connect("bob").await;
        harness.join(&mut alice, "general").await;

        // when (操作):
        let not_joined = harness
            .leave_usecase()
            .execute(bob.id(), &room("general"))
            .await;
        let missing_room = harness
            .leave_usecase()
            .execute(bob.id(), &room("nowhere"))
            .await;

        // then (期待する結果):
        assert!(!not_joined);
        assert!(!missing_room);
        assert!(alice.drain().is_empty());
    }

    #[tokio::test]
    async fn test_leave_clears_typing() {
        // テスト項目: 入力中のユーザーが退出すると stop_typing が配信される
        // given (前提条件):
        let harness = Harness::new();
        let mut alice = harness.connect("alice").await;
        let mut bob = harness.connect("bob").await;
        harness.join(&mut alice, "general").await;
        harness.join(&mut bob, "general").await;
        harness
            .typing_usecase()
            .start(bob.id(), &room("general"))
            .await
            .unwrap();
        alice.drain();

        // when (操作):
        harness
            .leave_usecase()
            .execute(bob.id(), &room("general"))
            .await;

        // then (期待する結果): stop_typing の後に user_left が届く
        assert_eq!(alice.drain_kinds(), vec!["stop_typing", "user_left"]);
        let handle = harness.rooms.find(&room("general")).await.unwrap();
        let now = tokio::time::Instant::now();
        assert!(handle.lock().await.typing_users(now).is_empty());
    }

    #[tokio::test]
    async fn test_leave_with_other_tab_keeps_user_present() {
        // テスト項目: 同じユーザーの別タブが残っていれば user_left は配信されない
        // given (前提条件):
        let harness = Harness::new();
        let mut alice = harness.connect("alice").await;
        let mut bob_tab1 = harness.connect("bob").await;
        let mut bob_tab2 = harness.connect("bob").await;
        harness.join(&mut alice, "general").await;
        harness.join(&mut bob_tab1, "general").await;
        harness.join(&mut bob_tab2, "general").await;
        alice.drain();

        // when (操作):
        harness
            .leave_usecase()
            .execute(bob_tab1.id(), &room("general"))
            .await;

        // then (期待する結果):
        assert!(alice.drain().is_empty());
        let handle = harness.rooms.find(&room("general")).await.unwrap();
        let room = handle.lock().await;
        assert_eq!(room.online_users().len(), 2);
    }

    #[tokio::test]
    async fn test_last_leave_removes_room_without_history() {
        // テスト項目: 最後のメンバーが退出すると、履歴の無いルームだけがアリーナから消える
        // given (前提条件):
        let harness = Harness::new();
        let mut alice = harness.connect("alice").await;
        harness.join(&mut alice, "scratch").await;
        harness.join(&mut alice, "chatted").await;
        harness
            .send_usecase()
            .execute(alice.id(), &room("chatted"), "hi".to_string())
            .await
            .unwrap();

        // when (操作):
        let leave = harness.leave_usecase();
        leave.execute(alice.id(), &room("scratch")).await;
        leave.execute(alice.id(), &room("chatted")).await;

        // then (期待する結果):
        assert!(harness.rooms.find(&room("scratch")).await.is_none());
        assert!(harness.rooms.find(&room("chatted")).await.is_some());
    }

    #[tokio::test]
    async fn test_rejoin_after_room_removed() {
        // テスト項目: 削除されたルームに再参加すると新しいルームが作られる
        // given (前提条件):
        let harness = Harness::new();
        let mut alice = harness.connect("alice").await;
        harness.join(&mut alice, "scratch").await;
        let stale = harness.rooms.find(&room("scratch")).await.unwrap();
        harness
            .leave_usecase()
            .execute(alice.id(), &room("scratch"))
            .await;

        // when (操作):
        harness.join(&mut alice, "scratch").await;

        // then (期待する結果):
        assert!(stale.lock().await.is_retired());
        let handle = harness.rooms.find(&room("scratch")).await.unwrap();
        let room = handle.lock().await;
        assert!(!room.is_retired());
        assert!(room.is_member(alice.id()));
    }
}
