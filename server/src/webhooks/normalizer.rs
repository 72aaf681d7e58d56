//! Webhook Normalizer
//!
//! Maps a decoded [`WebhookEvent`] onto the message store: either one new
//! record or one delivery-state update, never both. Each successful write is
//! followed by a best-effort real-time event.
//!
//! Failure policy: [`Normalizer::process`] is strict and surfaces storage errors.
//! [`Normalizer::ingest_best_effort`] implements *best-effort ingestion*: a
//! storage failure is logged and reported as "nothing processed" so the webhook
//! sender is always acknowledged and a batch keeps going. This can lose data
//! silently from the sender's point of view; it trades that for never provoking
//! a redelivery storm.

use std::sync::Arc;

use tracing::{debug, error, info, warn};
use wa_common::protocol::ServerEvent;
use wa_common::{DeliveryState, Direction, Message, MessageText, NewMessage};

use super::payload::{NewMessageEvent, StatusUpdateEvent, UnrecognizedReason, WebhookEvent};
use crate::store::{MessageStore, StoreError};
use crate::ws::EventPublisher;

/// Result of normalizing one payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A new message was stored.
    Created(Message),
    /// An existing message changed delivery state.
    Updated(Message),
    /// No side effect.
    Skipped(SkipReason),
}

impl Outcome {
    /// The created or updated record, if any.
    pub fn into_record(self) -> Option<Message> {
        match self {
            Self::Created(msg) | Self::Updated(msg) => Some(msg),
            Self::Skipped(_) => None,
        }
    }

    pub const fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }
}

/// Why a payload produced no side effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The payload did not decode to a message or status.
    Unrecognized(UnrecognizedReason),
    /// An outbound message with no recipient and no contact card.
    NoCounterpart { external_id: String },
    /// A status for a message this store has never seen.
    UnknownMessage { external_id: String },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unrecognized(reason) => reason.fmt(f),
            Self::NoCounterpart { external_id } => {
                write!(f, "no conversation counterpart for {external_id}")
            }
            Self::UnknownMessage { external_id } => write!(f, "unknown message {external_id}"),
        }
    }
}

/// Applies webhook notifications to the message store.
pub struct Normalizer {
    store: Arc<dyn MessageStore>,
    publisher: Option<Arc<dyn EventPublisher>>,
    business_phone_id: String,
}

impl Normalizer {
    pub fn new(
        store: Arc<dyn MessageStore>,
        publisher: Option<Arc<dyn EventPublisher>>,
        business_phone_id: impl Into<String>,
    ) -> Self {
        Self {
            store,
            publisher,
            business_phone_id: business_phone_id.into(),
        }
    }

    /// Decode and apply one raw payload.
    pub async fn process(&self, payload: &serde_json::Value) -> Result<Outcome, StoreError> {
        self.apply(WebhookEvent::decode(payload)).await
    }

    /// Apply an already decoded event.
    pub async fn apply(&self, event: WebhookEvent) -> Result<Outcome, StoreError> {
        match event {
            WebhookEvent::NewMessage(event) => self.apply_new_message(event).await,
            WebhookEvent::StatusUpdate(event) => self.apply_status_update(event).await,
            WebhookEvent::Unrecognized(reason) => {
                debug!(%reason, "Ignoring unrecognized webhook payload");
                Ok(Outcome::Skipped(SkipReason::Unrecognized(reason)))
            }
        }
    }

    /// Best-effort ingestion: like [`Self::process`], but a storage failure is
    /// logged and yields `None` instead of an error.
    pub async fn ingest_best_effort(&self, payload: &serde_json::Value) -> Option<Message> {
        let event = WebhookEvent::decode(payload);
        let kind = event.kind();
        match self.apply(event).await {
            Ok(outcome) => outcome.into_record(),
            Err(e) => {
                error!(event = kind, error = %e, "Webhook ingestion failed, payload dropped");
                None
            }
        }
    }

    /// Build the record for a new message, or explain why there is none.
    pub fn normalize_message(&self, event: NewMessageEvent) -> Result<NewMessage, SkipReason> {
        let direction = Direction::classify(&event.sender_id, &self.business_phone_id);

        // Each candidate must name someone other than the business.
        let counterpart = |id: Option<&String>| {
            id.filter(|id| !id.is_empty() && **id != self.business_phone_id)
                .cloned()
        };
        let conversation_id = match direction {
            Direction::Inbound => counterpart(Some(&event.sender_id)),
            Direction::Outbound => counterpart(event.recipient_id.as_ref())
                .or_else(|| counterpart(event.contact_wa_id.as_ref())),
        };

        let Some(conversation_id) = conversation_id else {
            return Err(SkipReason::NoCounterpart {
                external_id: event.external_id,
            });
        };

        Ok(NewMessage {
            meta_msg_id: event.external_id.clone(),
            external_id: event.external_id,
            conversation_id,
            sender_id: event.sender_id,
            sent_at: event.sent_at,
            kind: event.kind,
            text: MessageText::new(event.body),
            status: DeliveryState::Delivered,
            direction,
            contact_name: event.contact_name,
        })
    }

    async fn apply_new_message(&self, event: NewMessageEvent) -> Result<Outcome, StoreError> {
        let new = match self.normalize_message(event) {
            Ok(new) => new,
            Err(reason) => {
                debug!(%reason, "Ignoring webhook message");
                return Ok(Outcome::Skipped(reason));
            }
        };

        let message = self.store.insert(new).await?;
        info!(
            external_id = %message.external_id,
            wa_id = %message.conversation_id,
            direction = %message.direction,
            "Webhook message stored"
        );

        self.notify(ServerEvent::new_message(message.clone())).await;
        Ok(Outcome::Created(message))
    }

    async fn apply_status_update(&self, event: StatusUpdateEvent) -> Result<Outcome, StoreError> {
        let Some(message) = self
            .store
            .update_status(&event.external_id, event.status)
            .await?
        else {
            debug!(external_id = %event.external_id, "Status update for unknown message");
            return Ok(Outcome::Skipped(SkipReason::UnknownMessage {
                external_id: event.external_id,
            }));
        };

        info!(
            external_id = %message.external_id,
            status = %message.status,
            "Message status updated"
        );

        self.notify(ServerEvent::status_update(
            message.external_id.clone(),
            message.status,
        ))
        .await;
        Ok(Outcome::Updated(message))
    }

    async fn notify(&self, event: ServerEvent) {
        let Some(publisher) = &self.publisher else {
            return;
        };
        if let Err(e) = publisher.publish(&event).await {
            warn!(event = event.name(), error = %e, "Failed to publish real-time event");
        }
    }
}
