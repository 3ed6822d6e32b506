//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionId, MediaFileName, PusherChannel},
    infrastructure::dto::websocket::{ClientMessage, ServerMessage},
    ui::state::AppState,
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let connection_id = ConnectionId::generate();
    tracing::info!("Upgrading connection '{}'", connection_id);
    ws.on_upgrade(move |socket| handle_socket(socket, state, connection_id))
}

/// Spawns a task that drains the connection's outbound channel into the WebSocket.
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

/// Send a direct reply on this connection's own channel
fn reply(tx: &PusherChannel, message: ServerMessage) {
    if let Some(json) = message.encode()
        && tx.send(json).is_err()
    {
        tracing::debug!("Reply dropped, connection is closing");
    }
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, connection_id: ConnectionId) {
    let (sender, mut receiver) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel();

    // Initial server time for the first rough calibration
    reply(&tx, ServerMessage::ServerTime(state.sync_clock.server_time()));
    state
        .coordinator
        .connect(connection_id.clone(), tx.clone())
        .await;

    let mut send_task = pusher_loop(rx, sender);

    let state_for_recv = state.clone();
    let id_for_recv = connection_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!("WebSocket error on '{}': {}", id_for_recv, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    handle_text(&state_for_recv, &id_for_recv, &tx, &text).await;
                }
                Message::Close(_) => {
                    tracing::info!("Connection '{}' requested close", id_for_recv);
                    break;
                }
                _ => {}
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    state.coordinator.disconnect(&connection_id).await;
}

async fn handle_text(
    state: &AppState,
    connection_id: &ConnectionId,
    tx: &PusherChannel,
    text: &str,
) {
    let message = match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!("Ignoring malformed message from '{}': {}", connection_id, e);
            return;
        }
    };
    tracing::debug!("Received from '{}': {:?}", connection_id, message);

    match message {
        ClientMessage::SyncRequest(request) => {
            reply(tx, ServerMessage::SyncResponse(state.sync_clock.respond(request)));
        }
        ClientMessage::Ping(ping) => {
            reply(tx, ServerMessage::Pong(state.sync_clock.pong(ping)));
        }
        ClientMessage::SetupRoom(setup) => {
            if let Err(e) = state
                .coordinator
                .configure(connection_id, setup.target_time)
                .await
            {
                tracing::warn!("Rejected setup-room from '{}': {}", connection_id, e);
            }
        }
        ClientMessage::JoinRoom(join) => {
            let media_file_name = MediaFileName::from_declared(join.media_file_name);
            state.coordinator.join(connection_id, media_file_name).await;
        }
        ClientMessage::LeaveRoom => {
            state.coordinator.leave(connection_id).await;
        }
        ClientMessage::ReconfigureRoom => {
            state.coordinator.reconfigure(connection_id).await;
        }
        ClientMessage::OffsetUpdate(update) => {
            state
                .coordinator
                .record_offset(connection_id, update.offset)
                .await;
        }
        ClientMessage::PlaybackState(playback) => {
            state
                .coordinator
                .relay_playback_state(connection_id, playback)
                .await;
        }
    }
}
