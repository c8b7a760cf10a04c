//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionIdFactory, RoomId},
    infrastructure::dto::websocket::{ClientMessage, decode_client_message},
    ui::{server::MAX_BODY_BYTES, state::AppState},
    usecase::PostItemError,
};

use super::http::ApiError;

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    #[serde(rename = "roomId")]
    pub room_id: Option<String>,
}

impl ConnectQuery {
    /// Absent or empty `roomId` selects the default room
    fn room_id(self) -> Result<RoomId, ApiError> {
        match self.room_id {
            Some(id) if !id.is_empty() => Ok(RoomId::try_from(id)?),
            _ => Ok(RoomId::default_room()),
        }
    }
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let room_id = query.room_id()?;

    Ok(ws
        .max_message_size(MAX_BODY_BYTES)
        .on_upgrade(move |socket| handle_socket(socket, state, room_id)))
}

/// Spawns a task that receives messages from the rx channel and pushes them to the WebSocket sender.
///
/// Everything this connection receives (snapshot, new_item) goes through here.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, room_id: RoomId) {
    let connection_id = ConnectionIdFactory::generate();
    let (sender, mut receiver) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel();

    // writer を先に起動してから購読する（snapshot はチャンネル経由で送られる）
    let mut send_task = pusher_loop(rx, sender);

    if let Err(e) = state
        .subscribe_room_usecase
        .execute(&room_id, connection_id.clone(), tx)
        .await
    {
        tracing::warn!(room = %room_id, connection = %connection_id, "Failed to subscribe: {}", e);
        send_task.abort();
        return;
    }
    tracing::info!(room = %room_id, connection = %connection_id, "Connection joined room");

    let recv_state = state.clone();
    let recv_room_id = room_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::debug!(room = %recv_room_id, "WebSocket error: {}", e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    handle_text_frame(&recv_state, &recv_room_id, text.as_str()).await;
                }
                Message::Close(_) => break,
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
        .unsubscribe_room_usecase
        .execute(&room_id, &connection_id)
        .await;
}

/// One inbound frame. Nothing is ever sent back to the peer on failure.
async fn handle_text_frame(state: &AppState, room_id: &RoomId, text: &str) {
    let message = match decode_client_message(text) {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!(room = %room_id, "Discarding inbound frame: {}", e);
            return;
        }
    };

    match message {
        ClientMessage::NewItem { text } => {
            match state.post_item_usecase.execute(room_id.clone(), text).await {
                Ok(_) => {}
                Err(PostItemError::Validation(e)) => {
                    tracing::warn!(room = %room_id, "Discarding new_item: {}", e);
                }
                Err(PostItemError::Storage(e)) => {
                    tracing::warn!(room = %room_id, "Failed to persist new_item: {}", e);
                }
            }
        }
    }
}
