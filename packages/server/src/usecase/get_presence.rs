//! UseCase: プレゼンス取得処理

use std::sync::Arc;

use crate::domain::{ConnectionRepository, Presence, UserId};

/// プレゼンス取得のユースケース
pub struct GetPresenceUseCase {
    connections: Arc<dyn ConnectionRepository>,
}

impl GetPresenceUseCase {
    /// 新しい GetPresenceUseCase を作成
    pub fn new(connections: Arc<dyn ConnectionRepository>) -> Self {
        Self { connections }
    }

    /// ユーザーのプレゼンスを取得
    ///
    /// 一度も接続したことのないユーザーはオフライン（last_seen なし）として返す。
    pub async fn execute(&self, user_id: &UserId) -> Presence {
        self.connections.presence(user_id).await
    }
}
