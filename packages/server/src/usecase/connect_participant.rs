//! UseCase: 参加者接続処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectParticipantUseCase::execute() メソッド
//! - 認証済み ID を持つ接続の登録と、送信キューの登録
//!
//! ### なぜこのテストが必要か
//! - 未認証の接続がレジストリに入らないことを保証
//! - 同一ユーザーの複数接続（複数タブ）がそれぞれ独立して登録されることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：新規接続の登録
//! - 異常系：ID が渡されない接続
//! - エッジケース：同じユーザーの 2 つ目の接続

use std::sync::Arc;

use roomcast_shared::time::Clock;

use crate::domain::{
    Connection, ConnectionRepository, MessagePusher, PusherChannel, Timestamp, UserIdentity,
};

use super::error::ConnectError;

/// 参加者接続のユースケース
pub struct ConnectParticipantUseCase {
    /// Repository（接続レジストリ）
    connections: Arc<dyn ConnectionRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl ConnectParticipantUseCase {
    /// 新しい ConnectParticipantUseCase を作成
    pub fn new(
        connections: Arc<dyn ConnectionRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            connections,
            message_pusher,
            clock,
        }
    }

    /// 参加者接続を実行
    ///
    /// # Arguments
    ///
    /// * `identity` - 認証コラボレーターが検証したユーザー（なければ拒否）
    /// * `sender` - 接続への送信キュー
    ///
    /// # Returns
    ///
    /// * `Ok(Connection)` - 登録された接続（ルーム未参加）
    /// * `Err(ConnectError)` - 接続拒否
    pub async fn execute(
        &self,
        identity: Option<UserIdentity>,
        sender: PusherChannel,
    ) -> Result<Connection, ConnectError> {
        let identity = identity.ok_or(ConnectError::Unauthenticated)?;

        // 1. レジストリに登録（接続 ID はここで採番される）
        let connected_at = Timestamp::new(self.clock.now_millis());
        let connection = self.connections.register(identity, connected_at).await;

        // 2. 送信キューを MessagePusher に登録
        self.message_pusher
            .register_client(connection.id.clone(), sender)
            .await;

        tracing::info!(
            "Connection '{}' registered for user '{}'",
            connection.id,
            connection.user.id
        );
        Ok(connection)
    }
}
