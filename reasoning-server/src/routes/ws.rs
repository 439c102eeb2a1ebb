use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::broadcast;

use crate::state::AppState;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(20);

/// `WS /ws/reasoning` — greeting frame, then event frames as they are
/// published, idle heartbeats every 20s. Inbound client data is ignored.
pub async fn reasoning_ws(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    if socket.send(Message::Text(json!({"type": "ready"}).to_string().into())).await.is_err() {
        return;
    }

    let mut events = {
        let coordinator = state.coordinator.lock().unwrap();
        coordinator.store.subscribe()
    };

    let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
    heartbeat.tick().await; // first tick fires immediately

    loop {
        tokio::select! {
            recv = events.recv() => {
                match recv {
                    Ok(event) => {
                        let frame = json!({ "events": [event] });
                        if socket.send(Message::Text(frame.to_string().into())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => {
                        let coordinator = state.coordinator.lock().unwrap();
                        coordinator.store.note_dropped_subscriber_message();
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        let _ = close_with(&mut socket, 1011, "event store closed").await;
                        return;
                    }
                }
            }
            _ = heartbeat.tick() => {
                if socket.send(Message::Ping(Vec::new().into())).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => {
                        let _ = close_with(&mut socket, 1011, "connection error").await;
                        return;
                    }
                    _ => {} // any other inbound data is ignored
                }
            }
        }
    }

    let _ = close_with(&mut socket, 1000, "normal closure").await;
}

async fn close_with(socket: &mut WebSocket, code: u16, reason: &'static str) -> Result<(), axum::Error> {
    socket
        .send(Message::Close(Some(CloseFrame { code, reason: reason.into() })))
        .await
}
