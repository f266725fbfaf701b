//! WebSocket connection handlers.

use std::{sync::Arc, time::Duration};

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{
    sink::{Sink, SinkExt},
    stream::StreamExt,
};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::{
    domain::{
        ConnectionId, ErrorCode, ErrorNotice, MessageId, RoomName, ServerEvent, UserId,
        UserIdentity, UserName, ValueObjectError,
    },
    infrastructure::dto::websocket::ClientEvent,
    ui::state::AppState,
    usecase::{ConnectError, error::notice_for},
};

/// Query parameters for WebSocket connection
///
/// The identity is verified upstream; the coordinator trusts what it is given.
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub user_id: Option<String>,
    pub name: Option<String>,
}

impl ConnectQuery {
    /// Convert String -> UserIdentity (Domain Model); `None` if no user id was supplied
    fn identity(self) -> Result<Option<UserIdentity>, ValueObjectError> {
        let Some(user_id) = self.user_id.filter(|id| !id.trim().is_empty()) else {
            return Ok(None);
        };
        let user_id = UserId::new(user_id)?;
        let name = match self.name.filter(|name| !name.trim().is_empty()) {
            Some(name) => UserName::new(name)?,
            None => UserName::from(&user_id),
        };
        Ok(Some(UserIdentity::new(user_id, name)))
    }
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let identity = match query.identity() {
        Ok(identity) => identity,
        Err(e) => {
            tracing::warn!("Rejecting connection with invalid identity: {}", e);
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    // Create a bounded queue for this connection's outbound frames
    let (tx, rx) = mpsc::channel(state.outbound_queue_capacity);

    let connection = match state
        .connect_participant_usecase
        .execute(identity, tx)
        .await
    {
        Ok(connection) => connection,
        Err(ConnectError::Unauthenticated) => {
            tracing::warn!("Rejecting connection without a user identity");
            return Err(StatusCode::UNAUTHORIZED);
        }
    };

    let connection_id = connection.id.clone();
    let failed_state = state.clone();
    let failed_id = connection_id.clone();
    Ok(ws
        .on_failed_upgrade(move |e| {
            tracing::warn!("WebSocket upgrade for '{}' failed: {}", failed_id, e);
            tokio::spawn(async move {
                failed_state
                    .disconnect_participant_usecase
                    .execute(&failed_id)
                    .await;
            });
        })
        .on_upgrade(move |socket| handle_socket(socket, state, connection_id, rx)))
}

/// Spawns a task that drains the connection's queue into the WebSocket sender.
///
/// Each write is bounded by `delivery_timeout`; a write that does not finish in
/// time ends the task, which disconnects the connection.
///
/// # Returns
///
/// A `JoinHandle` for the spawned task
fn pusher_loop<S>(
    mut rx: mpsc::Receiver<String>,
    mut sender: S,
    delivery_timeout: Duration,
    connection_id: ConnectionId,
) -> tokio::task::JoinHandle<()>
where
    S: Sink<Message> + Unpin + Send + 'static,
    S::Error: std::fmt::Display,
{
    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            match tokio::time::timeout(delivery_timeout, sender.send(Message::Text(frame.into())))
                .await
            {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::debug!("Socket of '{}' closed: {}", connection_id, e);
                    break;
                }
                Err(_) => {
                    tracing::warn!(
                        "Write to '{}' did not finish within {:?}",
                        connection_id,
                        delivery_timeout
                    );
                    break;
                }
            }
        }
    })
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    connection_id: ConnectionId,
    rx: mpsc::Receiver<String>,
) {
    let (sender, mut receiver) = socket.split();

    // Spawn a task to deliver queued events to this connection
    let mut send_task = pusher_loop(rx, sender, state.delivery_timeout, connection_id.clone());

    // Spawn a task to receive events from this connection
    let recv_state = state.clone();
    let recv_id = connection_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::debug!("WebSocket error on '{}': {}", recv_id, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    process_frame(recv_state.clone(), recv_id.clone(), text.as_str().to_string())
                        .await;
                }
                Message::Close(_) => {
                    tracing::info!("Connection '{}' requested close", recv_id);
                    break;
                }
                // Ping/pong is handled automatically by the WebSocket protocol
                _ => {}
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    state
        .disconnect_participant_usecase
        .execute(&connection_id)
        .await;
}

/// Handle one inbound frame on its own task and wait for it to finish.
///
/// Aborting the reader does not cancel an event already being handled, so an
/// accepted send is always both persisted and delivered.
async fn process_frame(state: Arc<AppState>, connection_id: ConnectionId, text: String) {
    let task = tokio::spawn(async move {
        handle_client_event(&state, &connection_id, &text).await;
    });
    if let Err(e) = task.await {
        tracing::error!("Event handler task failed: {}", e);
    }
}

/// Dispatch one inbound frame to its use case.
///
/// Rejections are reported to this connection only, as an `error` event.
async fn handle_client_event(state: &AppState, connection_id: &ConnectionId, text: &str) {
    let event = match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => event,
        Err(e) => {
            tracing::debug!("Malformed frame from '{}': {}", connection_id, e);
            let notice = ErrorNotice::new(
                ErrorCode::BadRequest,
                format!("malformed event: {e}"),
                None,
            );
            reply_error(state, connection_id, notice).await;
            return;
        }
    };

    let room = match RoomName::new(event.room().to_string()) {
        Ok(room) => room,
        Err(e) => {
            let notice = ErrorNotice::new(ErrorCode::BadRequest, e.to_string(), None);
            reply_error(state, connection_id, notice).await;
            return;
        }
    };

    let notice = match event {
        ClientEvent::Join { .. } => state
            .join_room_usecase
            .execute(connection_id, room.clone())
            .await
            .err()
            .map(|e| notice_for(&e, e.code(), Some(room))),
        ClientEvent::Leave { .. } => {
            state
                .leave_room_usecase
                .execute(connection_id, &room)
                .await;
            None
        }
        ClientEvent::Send { body, .. } => state
            .send_message_usecase
            .execute(connection_id, &room, body)
            .await
            .err()
            .map(|e| notice_for(&e, e.code(), Some(room))),
        ClientEvent::Typing { .. } => state
            .typing_usecase
            .start(connection_id, &room)
            .await
            .err()
            .map(|e| notice_for(&e, e.code(), Some(room))),
        ClientEvent::StopTyping { .. } => state
            .typing_usecase
            .stop(connection_id, &room)
            .await
            .err()
            .map(|e| notice_for(&e, e.code(), Some(room))),
        ClientEvent::History {
            before_id, limit, ..
        } => {
            match state
                .get_history_usecase
                .execute(&room, before_id.map(MessageId::new), limit)
                .await
            {
                Ok(messages) => {
                    let event = ServerEvent::History { room, messages };
                    state.dispatcher.send_to(connection_id, &event).await;
                    None
                }
                Err(e) => Some(notice_for(&e, e.code(), Some(room))),
            }
        }
    };

    if let Some(notice) = notice {
        reply_error(state, connection_id, notice).await;
    }
}

async fn reply_error(state: &AppState, connection_id: &ConnectionId, notice: ErrorNotice) {
    tracing::debug!(
        "Rejected request from '{}': {} ({})",
        connection_id,
        notice.message,
        notice.code.as_str()
    );
    state
        .dispatcher
        .send_to(connection_id, &ServerEvent::Error(notice))
        .await;
}
