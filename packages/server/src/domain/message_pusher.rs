//! MessagePusher trait 定義（トランスポートコラボレーター）
//!
//! 特定の接続へイベントを届けるためのインターフェース。
//! ワイヤーエンコーディングは実装側（Infrastructure 層）の責務です。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ConnectionId, MessagePushError, ServerEvent};

/// 接続ごとの送信キュー（エンコード済みフレーム）
pub type PusherChannel = mpsc::Sender<String>;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// 接続の送信キューを登録
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel);

    /// 接続の送信キューを破棄（以降の配信はすべて取り消される）
    async fn unregister_client(&self, connection_id: &ConnectionId);

    /// 1 接続へイベントを送信
    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        event: &ServerEvent,
    ) -> Result<(), MessagePushError>;

    /// 複数接続へイベントを送信
    ///
    /// 一部の失敗は許容し、配信できなかった接続 ID を返す。
    async fn broadcast(
        &self,
        targets: &[ConnectionId],
        event: &ServerEvent,
    ) -> Result<Vec<ConnectionId>, MessagePushError>;
}
