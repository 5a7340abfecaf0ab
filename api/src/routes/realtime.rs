//! Real-time WebSocket channel.
//!
//! Every connected client gets the current state as soon as it connects,
//! then one `demographicsUpdate` event per refresh cycle. Messages from the
//! client are ignored apart from Close.

use crate::state::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use futures_util::{SinkExt, StreamExt};
use shared::models::DemographicState;
use shared::publish::UpdateEvent;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast::error::RecvError;

static NEXT_CLIENT_ID: AtomicU64 = AtomicU64::new(1);

/// Creates the real-time routes.
pub fn realtime_routes(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .with_state(state)
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

fn encode(state: &DemographicState) -> Option<Message> {
    match serde_json::to_string(&UpdateEvent::new(state.clone())) {
        Ok(json) => Some(Message::Text(json.into())),
        Err(err) => {
            tracing::error!(error = %err, "Failed to encode demographics update");
            None
        }
    }
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let client_id = NEXT_CLIENT_ID.fetch_add(1, Ordering::Relaxed);
    // Subscribe before reading the snapshot so no broadcast slips between.
    let mut updates = state.publisher().subscribe();
    let (mut sender, mut receiver) = socket.split();

    tracing::info!(client_id, "Client connected");

    let initial = encode(&state.publisher().snapshot());
    if let Some(message) = initial {
        if sender.send(message).await.is_err() {
            tracing::info!(client_id, "Client disconnected");
            return;
        }
    }

    loop {
        tokio::select! {
            update = updates.recv() => {
                let latest = match update {
                    Ok(latest) => latest,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(client_id, skipped, "Client lagging, sending latest state");
                        state.publisher().snapshot()
                    }
                    Err(RecvError::Closed) => break,
                };
                let Some(message) = encode(&latest) else { continue };
                if sender.send(message).await.is_err() {
                    break;
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        tracing::debug!(client_id, error = %err, "WebSocket receive error");
                        break;
                    }
                }
            }
        }
    }

    tracing::info!(client_id, "Client disconnected");
}
