//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use std::{collections::BTreeSet, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{
    Connection, ConnectionId, HistoryError, Message, MessageId, NewMessage, Presence,
    RepositoryError, Room, RoomName, Timestamp, Unregistered, UserId, UserIdentity,
};

/// 1 ルーム分の排他領域
///
/// メンバーシップ・typing 状態・配信順序はこのロックの内側でのみ変更する。
pub type RoomHandle = Arc<Mutex<Room>>;

/// Room Repository trait
///
/// ルーム名をキーにした Room のアリーナ。ルームごとに独立したロックを持ち、
/// 別のルームに対する操作は互いにブロックしない。
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// ルームを取得（存在しなければ作成）
    async fn get_or_create(&self, name: &RoomName) -> RoomHandle;

    /// ルームを取得
    async fn find(&self, name: &RoomName) -> Option<RoomHandle>;

    /// 全ルームをルーム名の辞書順で取得
    async fn list(&self) -> Vec<RoomHandle>;

    /// 破棄可能（`Room::is_disposable`）なルームをアリーナから削除
    ///
    /// 他の操作がロック中のルームは削除しない。削除したルームは retire され、
    /// 古いハンドルを持つ参加処理は取り直す必要がある。
    async fn remove_if_idle(&self, name: &RoomName) -> bool;
}

/// Connection Repository trait
///
/// 接続レジストリ。ルームとは独立したロックで保護される。
#[async_trait]
pub trait ConnectionRepository: Send + Sync {
    /// 認証済みユーザーの接続を登録
    async fn register(&self, user: UserIdentity, connected_at: Timestamp) -> Connection;

    /// 接続を削除（未登録の ID は何もしない）
    async fn unregister(&self, connection_id: &ConnectionId, now: Timestamp)
    -> Option<Unregistered>;

    /// 接続を取得
    async fn get(&self, connection_id: &ConnectionId) -> Option<Connection>;

    /// ユーザーの接続 ID 一覧を取得
    async fn connections_of(&self, user_id: &UserId) -> BTreeSet<ConnectionId>;

    /// ユーザーのプレゼンスを取得
    async fn presence(&self, user_id: &UserId) -> Presence;

    /// 接続の参加ルームを記録
    async fn add_room(
        &self,
        connection_id: &ConnectionId,
        room: RoomName,
    ) -> Result<(), RepositoryError>;

    /// 接続の参加ルームから削除
    async fn remove_room(&self, connection_id: &ConnectionId, room: &RoomName) -> bool;

    /// 接続中の接続数を取得
    async fn count(&self) -> usize;
}

/// History Repository trait（永続化コラボレーター）
///
/// メッセージの追記とページングのみを提供する狭いインターフェース。
/// 失敗は `HistoryError::StorageUnavailable` のみ。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// メッセージを永続化し、ID とタイムスタンプを付与して返す
    async fn append(&self, message: NewMessage) -> Result<Message, HistoryError>;

    /// `before` より古いメッセージを新しい順に最大 `limit` 件取得
    async fn page(
        &self,
        room: &RoomName,
        before: Option<MessageId>,
        limit: usize,
    ) -> Result<Vec<Message>, HistoryError>;
}
