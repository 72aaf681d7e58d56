//! WebSocket Handler
//!
//! Real-time mirroring of ingested messages and status changes to browser clients.
//! Every connection receives every event; there are no per-conversation subscriptions.

pub mod publish;

use axum::extract::ws::{Message, WebSocket};
use axum::{
    extract::{State, WebSocketUpgrade},
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use wa_common::protocol::{ClientEvent, ServerEvent};

use crate::api::AppState;

pub use publish::{spawn_redis_relay, EventHub, EventPublisher, PublishError, RedisPublisher};

/// WebSocket upgrade handler.
pub async fn handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let events = state.hub.subscribe();
    ws.on_upgrade(move |socket| handle_socket(socket, events))
}

/// Handle WebSocket connection.
async fn handle_socket(socket: WebSocket, mut events: broadcast::Receiver<ServerEvent>) {
    let connection_id = Uuid::now_v7();
    let (mut ws_sender, mut ws_receiver) = socket.split();

    // Replies to this client only (pong, errors)
    let (tx, mut rx) = mpsc::channel::<ServerEvent>(16);

    info!(%connection_id, "WebSocket connected");

    let sender_handle = tokio::spawn(async move {
        loop {
            let event = tokio::select! {
                direct = rx.recv() => match direct {
                    Some(event) => event,
                    None => break,
                },
                received = events.recv() => match received {
                    Ok(event) => event,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(%connection_id, skipped, "WebSocket client lagging, events skipped");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            };

            let msg = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize event: {}", e);
                    continue;
                }
            };

            if ws_sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let reply = handle_client_message(text.as_str());
                if tx.send(reply).await.is_err() {
                    break;
                }
            }
            Ok(Message::Close(_)) => {
                debug!(%connection_id, "WebSocket close frame received");
                break;
            }
            Err(e) => {
                warn!(%connection_id, "WebSocket error: {}", e);
                break;
            }
            _ => {}
        }
    }

    sender_handle.abort();
    info!(%connection_id, "WebSocket disconnected");
}

/// Handle a client message and produce the direct reply.
fn handle_client_message(text: &str) -> ServerEvent {
    match serde_json::from_str::<ClientEvent>(text) {
        Ok(ClientEvent::Ping) => ServerEvent::Pong,
        Err(e) => ServerEvent::Error {
            code: "invalid_event".to_string(),
            message: e.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_gets_pong() {
        assert_eq!(handle_client_message(r#"{"type":"ping"}"#), ServerEvent::Pong);
    }

    #[test]
    fn garbage_gets_error_frame() {
        match handle_client_message("not json") {
            ServerEvent::Error { code, .. } => assert_eq!(code, "invalid_event"),
            other => panic!("unexpected reply: {other:?}"),
        }
    }
}
