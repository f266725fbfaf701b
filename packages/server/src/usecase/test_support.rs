//! ユースケースのテストで共有するフィクスチャ
//!
//! 実際の InMemory Repository と WebSocketMessagePusher を組み合わせ、
//! 各接続の送信キューを直接読み出して配信内容を検証します。

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::sync::mpsc;

use roomcast_shared::time::ManualClock;

use crate::{
    config::ChatConfig,
    domain::{
        Connection, ConnectionId, ConnectionRepository, HistoryError, HistoryRepository, Message,
        MessageId, NewMessage, RoomName, UserId, UserIdentity, UserName,
    },
    infrastructure::{
        dto::websocket::ServerEventDto,
        message_pusher::WebSocketMessagePusher,
        repository::{InMemoryConnectionRepository, InMemoryHistoryRepository, InMemoryRoomRepository},
    },
};

use super::{
    BroadcastDispatcher, ConnectParticipantUseCase, DisconnectParticipantUseCase, JoinRoomUseCase,
    LeaveRoomUseCase, SendMessageUseCase, TypingUseCase,
};

pub const START_MILLIS: i64 = 1_700_000_000_000;

pub struct Harness {
    pub config: ChatConfig,
    pub clock: Arc<ManualClock>,
    pub connections: Arc<InMemoryConnectionRepository>,
    pub rooms: Arc<InMemoryRoomRepository>,
    pub history: Arc<dyn HistoryRepository>,
    pub pusher: Arc<WebSocketMessagePusher>,
    pub dispatcher: Arc<BroadcastDispatcher>,
    pub dead_rx: mpsc::UnboundedReceiver<ConnectionId>,
}

pub struct TestClient {
    pub connection: Connection,
    pub rx: mpsc::Receiver<String>,
}

impl TestClient {
    pub fn id(&self) -> &ConnectionId {
        &self.connection.id
    }

    /// 受信済みのイベントをすべて取り出す
    pub fn drain(&mut self) -> Vec<ServerEventDto> {
        let mut events = Vec::new();
        while let Ok(frame) = self.rx.try_recv() {
            events.push(serde_json::from_str(&frame).unwrap());
        }
        events
    }

    /// 受信済みのイベント種別を取り出す
    pub fn drain_kinds(&mut self) -> Vec<&'static str> {
        self.drain().iter().map(kind_of).collect()
    }
}

/// 追記のたびに `delay` だけ待たされる履歴ストア
pub struct SlowHistory {
    inner: InMemoryHistoryRepository,
    delay: Duration,
}

impl SlowHistory {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: InMemoryHistoryRepository::new(Arc::new(ManualClock::new(START_MILLIS))),
            delay,
        }
    }
}

#[async_trait]
impl HistoryRepository for SlowHistory {
    async fn append(&self, message: NewMessage) -> Result<Message, HistoryError> {
        tokio::time::sleep(self.delay).await;
        self.inner.append(message).await
    }

    async fn page(
        &self,
        room: &RoomName,
        before: Option<MessageId>,
        limit: usize,
    ) -> Result<Vec<Message>, HistoryError> {
        self.inner.page(room, before, limit).await
    }
}

pub fn kind_of(event: &ServerEventDto) -> &'static str {
    match event {
        ServerEventDto::Message(_) => "message",
        ServerEventDto::UserJoined(_) => "user_joined",
        ServerEventDto::UserLeft(_) => "user_left",
        ServerEventDto::Typing(_) => "typing",
        ServerEventDto::StopTyping(_) => "stop_typing",
        ServerEventDto::RoomUsers(_) => "room_users",
        ServerEventDto::History(_) => "history",
        ServerEventDto::Error(_) => "error",
    }
}

pub fn room(name: &str) -> RoomName {
    RoomName::new(name.to_string()).unwrap()
}

pub fn user_id(id: &str) -> UserId {
    UserId::new(id.to_string()).unwrap()
}

pub fn identity(id: &str) -> UserIdentity {
    UserIdentity::new(user_id(id), UserName::new(format!("{id}-name")).unwrap())
}

impl Harness {
    pub fn new() -> Self {
        let clock = Arc::new(ManualClock::new(START_MILLIS));
        let history = Arc::new(InMemoryHistoryRepository::new(clock.clone()));
        Self::build(clock, history)
    }

    pub fn with_history(history: Arc<dyn HistoryRepository>) -> Self {
        Self::build(Arc::new(ManualClock::new(START_MILLIS)), history)
    }

    fn build(clock: Arc<ManualClock>, history: Arc<dyn HistoryRepository>) -> Self {
        let config = ChatConfig::default();
        let rooms = Arc::new(InMemoryRoomRepository::new(
            clock.clone(),
            config.typing_timeout,
        ));
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let (dead_tx, dead_rx) = mpsc::unbounded_channel();
        let dispatcher = Arc::new(BroadcastDispatcher::new(pusher.clone(), dead_tx));
        Self {
            config,
            clock,
            connections: Arc::new(InMemoryConnectionRepository::new()),
            rooms,
            history,
            pusher,
            dispatcher,
            dead_rx,
        }
    }

    pub fn connect_usecase(&self) -> ConnectParticipantUseCase {
        ConnectParticipantUseCase::new(
            self.connections.clone(),
            self.pusher.clone(),
            self.clock.clone(),
        )
    }

    pub fn disconnect_usecase(&self) -> DisconnectParticipantUseCase {
        DisconnectParticipantUseCase::new(
            self.connections.clone(),
            self.rooms.clone(),
            self.pusher.clone(),
            self.dispatcher.clone(),
            self.clock.clone(),
        )
    }

    pub fn join_usecase(&self) -> JoinRoomUseCase {
        JoinRoomUseCase::new(
            self.connections.clone(),
            self.rooms.clone(),
            self.history.clone(),
            self.dispatcher.clone(),
            self.config.backfill_limit,
        )
    }

    pub fn leave_usecase(&self) -> LeaveRoomUseCase {
        LeaveRoomUseCase::new(
            self.connections.clone(),
            self.rooms.clone(),
            self.dispatcher.clone(),
        )
    }

    pub fn send_usecase(&self) -> SendMessageUseCase {
        SendMessageUseCase::new(
            self.rooms.clone(),
            self.history.clone(),
            self.dispatcher.clone(),
            self.config.max_message_length,
        )
    }

    pub fn typing_usecase(&self) -> TypingUseCase {
        TypingUseCase::new(self.rooms.clone(), self.dispatcher.clone())
    }

    /// 接続を登録し、送信キューを受け取る
    pub async fn connect(&self, user: &str) -> TestClient {
        let (tx, rx) = mpsc::channel(self.config.outbound_queue_capacity);
        let connection = self
            .connect_usecase()
            .execute(Some(identity(user)), tx)
            .await
            .unwrap();
        TestClient { connection, rx }
    }

    /// ルームに参加し、参加時に届いたイベントを読み捨てる
    pub async fn join(&self, client: &mut TestClient, room_name: &str) {
        self.join_usecase()
            .execute(client.id(), room(room_name))
            .await
            .unwrap();
        client.drain();
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.count().await
    }
}
