//! Shared application state.

use std::{sync::Arc, time::Duration};

use tokio::sync::mpsc;

use roomcast_shared::time::Clock;

use crate::{
    config::{ChatConfig, MAX_PAGE_SIZE},
    domain::{
        ConnectionId, ConnectionRepository, HistoryRepository, MessagePusher, RoomRepository,
    },
    usecase::{
        BroadcastDispatcher, ConnectParticipantUseCase, DisconnectParticipantUseCase,
        GetHistoryUseCase, GetPresenceUseCase, GetRoomDetailUseCase, GetRoomsUseCase,
        JoinRoomUseCase, LeaveRoomUseCase, SendMessageUseCase, TypingUseCase,
    },
};

/// Shared application state
pub struct AppState {
    /// ConnectParticipantUseCase（参加者接続のユースケース）
    pub connect_participant_usecase: Arc<ConnectParticipantUseCase>,
    /// DisconnectParticipantUseCase（参加者切断のユースケース）
    pub disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
    /// JoinRoomUseCase（ルーム参加のユースケース）
    pub join_room_usecase: Arc<JoinRoomUseCase>,
    /// LeaveRoomUseCase（ルーム退出のユースケース）
    pub leave_room_usecase: Arc<LeaveRoomUseCase>,
    /// SendMessageUseCase（メッセージ送信のユースケース）
    pub send_message_usecase: Arc<SendMessageUseCase>,
    /// TypingUseCase（typing インジケーターのユースケース）
    pub typing_usecase: Arc<TypingUseCase>,
    /// GetHistoryUseCase（履歴取得のユースケース）
    pub get_history_usecase: Arc<GetHistoryUseCase>,
    /// GetPresenceUseCase（プレゼンス取得のユースケース）
    pub get_presence_usecase: Arc<GetPresenceUseCase>,
    /// GetRoomsUseCase（ルーム一覧取得のユースケース）
    pub get_rooms_usecase: Arc<GetRoomsUseCase>,
    /// GetRoomDetailUseCase（ルーム詳細取得のユースケース）
    pub get_room_detail_usecase: Arc<GetRoomDetailUseCase>,
    /// 接続ごとの送信キューへの直接送信（エラー通知など）
    pub dispatcher: Arc<BroadcastDispatcher>,
    /// Bound on a single socket write
    pub delivery_timeout: Duration,
    /// Capacity of each connection's outbound queue
    pub outbound_queue_capacity: usize,
}

impl AppState {
    /// Wire every use case on top of the given collaborators.
    ///
    /// Connections that fail to keep up are reported on `dead_connections`.
    pub fn new(
        config: &ChatConfig,
        connections: Arc<dyn ConnectionRepository>,
        rooms: Arc<dyn RoomRepository>,
        history: Arc<dyn HistoryRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
        dead_connections: mpsc::UnboundedSender<ConnectionId>,
    ) -> Self {
        let dispatcher = Arc::new(BroadcastDispatcher::new(
            message_pusher.clone(),
            dead_connections,
        ));

        Self {
            connect_participant_usecase: Arc::new(ConnectParticipantUseCase::new(
                connections.clone(),
                message_pusher.clone(),
                clock.clone(),
            )),
            disconnect_participant_usecase: Arc::new(DisconnectParticipantUseCase::new(
                connections.clone(),
                rooms.clone(),
                message_pusher,
                dispatcher.clone(),
                clock,
            )),
            join_room_usecase: Arc::new(JoinRoomUseCase::new(
                connections.clone(),
                rooms.clone(),
                history.clone(),
                dispatcher.clone(),
                config.backfill_limit,
            )),
            leave_room_usecase: Arc::new(LeaveRoomUseCase::new(
                connections.clone(),
                rooms.clone(),
                dispatcher.clone(),
            )),
            send_message_usecase: Arc::new(SendMessageUseCase::new(
                rooms.clone(),
                history.clone(),
                dispatcher.clone(),
                config.max_message_length,
            )),
            typing_usecase: Arc::new(TypingUseCase::new(rooms.clone(), dispatcher.clone())),
            get_history_usecase: Arc::new(GetHistoryUseCase::new(
                history,
                config.backfill_limit,
                MAX_PAGE_SIZE,
            )),
            get_presence_usecase: Arc::new(GetPresenceUseCase::new(connections)),
            get_rooms_usecase: Arc::new(GetRoomsUseCase::new(rooms.clone())),
            get_room_detail_usecase: Arc::new(GetRoomDetailUseCase::new(rooms)),
            dispatcher,
            delivery_timeout: config.delivery_timeout,
            outbound_queue_capacity: config.outbound_queue_capacity,
        }
    }
}
