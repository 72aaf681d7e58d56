//! Real-time Protocol
//!
//! JSON frames exchanged over the `/ws` socket. Every frame carries a `type` tag.

use serde::{Deserialize, Serialize};

use crate::types::{DeliveryState, Message};

/// Server-to-client events. Broadcast to every connected client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// A message was ingested or sent locally.
    NewMessage { message: Box<Message> },
    /// The delivery state of an existing message changed.
    StatusUpdate {
        /// External id of the updated message.
        id: String,
        status: DeliveryState,
    },
    /// Reply to a client ping.
    Pong,
    /// The client sent something the server could not handle.
    Error { code: String, message: String },
}

impl ServerEvent {
    pub fn new_message(message: Message) -> Self {
        Self::NewMessage {
            message: Box::new(message),
        }
    }

    pub fn status_update(external_id: impl Into<String>, status: DeliveryState) -> Self {
        Self::StatusUpdate {
            id: external_id.into(),
            status,
        }
    }

    /// Event name as seen by browser listeners.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::NewMessage { .. } => "new-message",
            Self::StatusUpdate { .. } => "status-update",
            Self::Pong => "pong",
            Self::Error { .. } => "error",
        }
    }
}

/// Client-to-server events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Keepalive.
    Ping,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_update_frame_shape() {
        let event = ServerEvent::status_update("wamid.A1", DeliveryState::Read);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "status-update", "id": "wamid.A1", "status": "read"})
        );
        assert_eq!(event.name(), "status-update");
    }

    #[test]
    fn client_ping_parses() {
        let event: ClientEvent = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert_eq!(event, ClientEvent::Ping);
        assert!(serde_json::from_str::<ClientEvent>(r#"{"type":"subscribe"}"#).is_err());
    }
}
