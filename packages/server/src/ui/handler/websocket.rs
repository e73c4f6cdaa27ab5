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

use crate::{domain::ConnectionId, ui::state::AppState};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Spawns a task that receives messages from the rx channel and pushes them to the WebSocket sender.
///
/// Events produced by the gateway (via the MessagePusher) reach this connection through `rx`.
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

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let connection_id = ConnectionId::generate();
    let (sender, mut receiver) = socket.split();

    // Create a channel for this connection to receive events
    let (tx, rx) = mpsc::unbounded_channel();
    state.gateway.connect(connection_id, tx).await;

    let gateway = state.gateway.clone();

    // Spawn a task to receive events from this client
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!("WebSocket error on {}: {}", connection_id, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    tracing::debug!("Received text from {}: {}", connection_id, text.as_str());
                    gateway.dispatch(connection_id, text.as_str()).await;
                }
                Message::Ping(_) => {
                    tracing::debug!("Received ping");
                    // Ping/pong is handled automatically by the WebSocket protocol
                }
                Message::Close(_) => {
                    tracing::info!("Connection {} requested close", connection_id);
                    break;
                }
                _ => {}
            }
        }
    });

    // Spawn a task to push events to this client
    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    state.gateway.disconnect(&connection_id).await;
}
