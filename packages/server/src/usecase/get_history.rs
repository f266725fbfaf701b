//! UseCase: 履歴取得処理
//!
//! History Gateway の読み取り口。ルームの状態には触れません。

use std::sync::Arc;

use crate::domain::{HistoryRepository, Message, MessageId, RoomName};

use super::error::HistoryQueryError;

/// 履歴取得のユースケース
pub struct GetHistoryUseCase {
    history: Arc<dyn HistoryRepository>,
    /// `limit` 省略時の件数
    default_limit: usize,
    max_limit: usize,
}

impl GetHistoryUseCase {
    /// 新しい GetHistoryUseCase を作成
    pub fn new(history: Arc<dyn HistoryRepository>, default_limit: usize, max_limit: usize) -> Self {
        Self {
            history,
            default_limit: default_limit.min(max_limit),
            max_limit,
        }
    }

    /// 履歴の 1 ページを取得
    ///
    /// # Arguments
    ///
    /// * `before` - このメッセージ ID より古いものを返す（省略時は最新から）
    /// * `limit` - 最大件数（1 以上 `max_limit` 以下）
    ///
    /// # Returns
    ///
    /// 新しい順のメッセージ
    pub async fn execute(
        &self,
        room_name: &RoomName,
        before: Option<MessageId>,
        limit: Option<usize>,
    ) -> Result<Vec<Message>, HistoryQueryError> {
        let limit = limit.unwrap_or(self.default_limit);
        if limit == 0 || limit > self.max_limit {
            return Err(HistoryQueryError::InvalidLimit {
                limit,
                max: self.max_limit,
            });
        }

        self.history
            .page(room_name, before, limit)
            .await
            .map_err(|e| HistoryQueryError::StorageUnavailable(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::MAX_PAGE_SIZE,
        domain::{HistoryError, MockHistoryRepository},
        usecase::test_support::{Harness, room},
    };

    #[tokio::test]
    async fn test_page_through_history() {
        // テスト項目: 150 件の履歴を 50 件ずつ遡って取得できる
        // given (前提条件):
        let harness = Harness::new();
        let mut alice = harness.connect("alice").await;
        harness.join(&mut alice, "general").await;
        let send = harness.send_usecase();
        for i in 1..=150 {
            send.execute(alice.id(), &room("general"), format!("m{i}"))
                .await
                .unwrap();
        }
        let usecase = GetHistoryUseCase::new(harness.history.clone(), 50, MAX_PAGE_SIZE);

        // when (操作):
        let first = usecase
            .execute(&room("general"), None, Some(50))
            .await
            .unwrap();
        let second = usecase
            .execute(&room("general"), Some(first[49].id), Some(50))
            .await
            .unwrap();
        let third = usecase
            .execute(&room("general"), Some(second[49].id), Some(50))
            .await
            .unwrap();
        let fourth = usecase
            .execute(&room("general"), Some(third[49].id), Some(50))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(first[0].body.as_str(), "m150");
        assert_eq!(first[49].body.as_str(), "m101");
        assert_eq!(second[0].body.as_str(), "m100");
        assert_eq!(third[49].body.as_str(), "m1");
        assert!(fourth.is_empty());
    }

    #[tokio::test]
    async fn test_limit_is_validated() {
        // テスト項目: 0 件や上限超えの limit は InvalidLimit で拒否される
        // given (前提条件):
        let harness = Harness::new();
        let usecase = GetHistoryUseCase::new(harness.history.clone(), 50, MAX_PAGE_SIZE);

        // when (操作):
        let zero = usecase.execute(&room("general"), None, Some(0)).await;
        let too_many = usecase
            .execute(&room("general"), None, Some(MAX_PAGE_SIZE + 1))
            .await;
        let default = usecase.execute(&room("general"), None, None).await;

        // then (期待する結果):
        assert_eq!(
            zero,
            Err(HistoryQueryError::InvalidLimit {
                limit: 0,
                max: MAX_PAGE_SIZE
            })
        );
        assert!(matches!(
            too_many,
            Err(HistoryQueryError::InvalidLimit { .. })
        ));
        assert_eq!(default, Ok(Vec::new()));
    }

    #[tokio::test]
    async fn test_storage_failure_is_reported() {
        // テスト項目: ストア障害は StorageUnavailable として返される
        // given (前提条件):
        let mut history = MockHistoryRepository::new();
        history
            .expect_page()
            .times(1)
            .returning(|_, _, _| Err(HistoryError::StorageUnavailable("locked".to_string())));
        let usecase = GetHistoryUseCase::new(Arc::new(history), 50, MAX_PAGE_SIZE);

        // when (操作):
        let result = usecase.execute(&room("general"), None, None).await;

        // then (期待する結果):
        assert!(matches!(
            result,
            Err(HistoryQueryError::StorageUnavailable(_))
        ));
    }
}
