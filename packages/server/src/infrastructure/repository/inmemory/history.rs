//! InMemory History Repository 実装
//!
//! ルームごとにメッセージを ID 昇順の `Vec` で保持します。
//! ID はルームをまたいで単調増加し、追記時に採番されます。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use roomcast_shared::time::Clock;
use tokio::sync::Mutex;

use crate::domain::{
    HistoryError, HistoryRepository, Message, MessageId, NewMessage, RoomName, Timestamp,
};

#[derive(Default)]
struct HistoryState {
    last_id: i64,
    rooms: HashMap<RoomName, Vec<Message>>,
}

/// インメモリ History Repository 実装
pub struct InMemoryHistoryRepository {
    state: Mutex<HistoryState>,
    clock: Arc<dyn Clock>,
}

impl InMemoryHistoryRepository {
    /// 新しい InMemoryHistoryRepository を作成
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(HistoryState::default()),
            clock,
        }
    }

    /// 保存済みメッセージ数
    pub async fn len(&self) -> usize {
        self.state.lock().await.rooms.values().map(Vec::len).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl HistoryRepository for InMemoryHistoryRepository {
    async fn append(&self, message: NewMessage) -> Result<Message, HistoryError> {
        let mut state = self.state.lock().await;
        state.last_id += 1;
        let id = MessageId::new(state.last_id);
        let message = Message::from_new(message, id, Timestamp::new(self.clock.now_millis()));
        state
            .rooms
            .entry(message.room.clone())
            .or_default()
            .push(message.clone());
        Ok(message)
    }

    async fn page(
        &self,
        room: &RoomName,
        before: Option<MessageId>,
        limit: usize,
    ) -> Result<Vec<Message>, HistoryError> {
        let state = self.state.lock().await;
        let Some(messages) = state.rooms.get(room) else {
            return Ok(Vec::new());
        };
        let end = match before {
            Some(before) => messages.partition_point(|message| message.id < before),
            None => messages.len(),
        };
        Ok(messages[..end].iter().rev().take(limit).cloned().collect())
    }
}
