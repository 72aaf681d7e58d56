//! Message Handlers
//!
//! Read projections over stored messages and the local send path.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;
use wa_common::protocol::ServerEvent;
use wa_common::{ContactSummary, DeliveryState, Direction, Message, MessageText, NewMessage};

use crate::api::AppState;
use crate::store::StoreError;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            Self::Store(err) => {
                tracing::error!(%err, "Chat endpoint storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Storage error".to_string(),
                )
            }
        };
        (
            status,
            Json(serde_json::json!({ "error": code, "message": message })),
        )
            .into_response()
    }
}

// ============================================================================
// Request Types
// ============================================================================

/// Request to send a message from the business account.
#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct SendMessageRequest {
    /// Counterpart phone identifier
    #[serde(default)]
    #[validate(length(min = 1, max = 32, message = "wa_id must be 1-32 characters"))]
    pub wa_id: String,
    /// Message text
    #[serde(default)]
    #[validate(length(min = 1, max = 4096, message = "text must be 1-4096 characters"))]
    pub text: String,
    /// Display name of the counterpart
    #[validate(length(max = 256, message = "contact_name must be at most 256 characters"))]
    pub contact_name: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// List conversations with their latest message.
#[utoipa::path(
    get,
    path = "/api/contacts",
    tag = "chat",
    responses((status = 200, description = "Conversations, most recent first", body = [ContactSummary])),
)]
#[instrument(skip(state))]
pub async fn list_contacts(
    State(state): State<AppState>,
) -> Result<Json<Vec<ContactSummary>>, ChatError> {
    Ok(Json(state.store.list_contacts().await?))
}

/// List the messages of one conversation, oldest first.
#[utoipa::path(
    get,
    path = "/api/messages/{wa_id}",
    tag = "chat",
    params(("wa_id" = String, Path, description = "Counterpart phone identifier")),
    responses((status = 200, description = "Chronological messages", body = [Message])),
)]
#[instrument(skip(state))]
pub async fn list_messages(
    State(state): State<AppState>,
    Path(wa_id): Path<String>,
) -> Result<Json<Vec<Message>>, ChatError> {
    Ok(Json(state.store.list_messages(&wa_id).await?))
}

/// Store a message sent from the business account and announce it.
#[utoipa::path(
    post,
    path = "/api/messages",
    tag = "chat",
    request_body = SendMessageRequest,
    responses(
        (status = 201, description = "Message stored", body = Message),
        (status = 400, description = "Validation error"),
    ),
)]
#[instrument(skip_all, fields(wa_id = %body.wa_id))]
pub async fn send_message(
    State(state): State<AppState>,
    Json(body): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<Message>), ChatError> {
    let new = build_local_message(body, &state.config.business_phone_id)?;
    let message = state.store.insert(new).await?;

    info!(external_id = %message.external_id, "Local message stored");

    if let Err(e) = state
        .publisher
        .publish(&ServerEvent::new_message(message.clone()))
        .await
    {
        warn!(error = %e, "Failed to publish real-time event");
    }

    Ok((StatusCode::CREATED, Json(message)))
}

/// Validate a send request and turn it into an outbound record.
pub fn build_local_message(
    body: SendMessageRequest,
    business_phone_id: &str,
) -> Result<NewMessage, ChatError> {
    body.validate()
        .map_err(|e| ChatError::Validation(e.to_string()))?;

    let wa_id = body.wa_id.trim().to_string();
    if wa_id.is_empty() {
        return Err(ChatError::Validation("wa_id must not be blank".to_string()));
    }
    if wa_id == business_phone_id {
        return Err(ChatError::Validation(
            "wa_id must not be the business number".to_string(),
        ));
    }
    if body.text.trim().is_empty() {
        return Err(ChatError::Validation("text must not be blank".to_string()));
    }

    let external_id = format!("local-{}", Uuid::now_v7());
    Ok(NewMessage {
        meta_msg_id: external_id.clone(),
        external_id,
        conversation_id: wa_id,
        sender_id: business_phone_id.to_string(),
        sent_at: Utc::now().timestamp(),
        kind: "text".to_string(),
        text: MessageText::new(body.text),
        status: DeliveryState::Sent,
        direction: Direction::Outbound,
        contact_name: body.contact_name.filter(|n| !n.trim().is_empty()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUSINESS: &str = "918329446654";

    fn request(wa_id: &str, text: &str) -> SendMessageRequest {
        SendMessageRequest {
            wa_id: wa_id.into(),
            text: text.into(),
            contact_name: Some("Neha Joshi".into()),
        }
    }

    #[test]
    fn local_message_is_outbound_and_sent() {
        let new = build_local_message(request("929967673820", "hello"), BUSINESS).unwrap();
        assert_eq!(new.direction, Direction::Outbound);
        assert_eq!(new.status, DeliveryState::Sent);
        assert_eq!(new.sender_id, BUSINESS);
        assert_eq!(new.conversation_id, "929967673820");
        assert_eq!(new.kind, "text");
        assert_eq!(new.text.body, "hello");
        assert!(new.external_id.starts_with("local-"));
        assert_eq!(new.external_id, new.meta_msg_id);
        assert_eq!(new.contact_name.as_deref(), Some("Neha Joshi"));
    }

    #[test]
    fn local_ids_are_unique() {
        let a = build_local_message(request("1", "x"), BUSINESS).unwrap();
        let b = build_local_message(request("1", "x"), BUSINESS).unwrap();
        assert_ne!(a.external_id, b.external_id);
    }

    #[test]
    fn rejects_missing_target_or_body() {
        for (wa_id, text) in [("", "hello"), ("  ", "hello"), ("1", ""), ("1", "   "), (BUSINESS, "hi")] {
            assert!(
                matches!(
                    build_local_message(request(wa_id, text), BUSINESS),
                    Err(ChatError::Validation(_))
                ),
                "wa_id={wa_id:?} text={text:?}"
            );
        }
    }
}
