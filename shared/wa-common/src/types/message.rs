//! Message Types
//!
//! The canonical message record and its read projections. Wire names follow the
//! archived WhatsApp payload vocabulary (`wa_id`, `from`, `text.body`, ...) so that
//! replayed archives and the browser client agree on one document shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

/// Lifecycle stage of a message as reported by the delivery network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryState {
    /// Accepted locally, not yet confirmed by the network.
    #[default]
    Sent,
    /// Delivered to the recipient device.
    Delivered,
    /// Opened by the recipient.
    Read,
    /// Delivery failed.
    Failed,
}

impl DeliveryState {
    /// Parse from the lowercase wire form.
    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "sent" => Some(Self::Sent),
            "delivered" => Some(Self::Delivered),
            "read" => Some(Self::Read),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Lowercase wire form.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Delivered => "delivered",
            Self::Read => "read",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for DeliveryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DeliveryState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s).ok_or_else(|| Error::UnknownDeliveryState(s.to_string()))
    }
}

/// Whether a message originated from the business account or from the counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Sent by the counterpart to the business.
    Inbound,
    /// Sent by the business.
    Outbound,
}

impl Direction {
    /// Classify a sender against the business phone identifier.
    pub fn classify(sender_id: &str, business_phone_id: &str) -> Self {
        if sender_id == business_phone_id {
            Self::Outbound
        } else {
            Self::Inbound
        }
    }

    /// Parse from the lowercase wire form.
    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "inbound" => Some(Self::Inbound),
            "outbound" => Some(Self::Outbound),
            _ => None,
        }
    }

    /// Lowercase wire form.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Inbound => "inbound",
            Self::Outbound => "outbound",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s).ok_or_else(|| Error::UnknownDirection(s.to_string()))
    }
}

/// Text content of a message. Empty for non-text kinds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct MessageText {
    #[serde(default)]
    pub body: String,
}

impl MessageText {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }
}

/// A message ready to be persisted. The store assigns identity and timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub external_id: String,
    pub meta_msg_id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub sent_at: i64,
    pub kind: String,
    pub text: MessageText,
    pub status: DeliveryState,
    pub direction: Direction,
    pub contact_name: Option<String>,
}

/// The persisted message record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Message {
    /// Store-assigned row identity.
    #[serde(rename = "_id")]
    pub row_id: Uuid,
    /// Vendor message identifier. Natural key for status updates.
    #[serde(rename = "id")]
    pub external_id: String,
    /// Alias of `id` kept for status-update correlation.
    pub meta_msg_id: String,
    /// Counterpart phone identifier; partitions messages into conversations.
    #[serde(rename = "wa_id")]
    pub conversation_id: String,
    /// Originating phone identifier.
    #[serde(rename = "from")]
    pub sender_id: String,
    /// Seconds since the Unix epoch, vendor supplied.
    #[serde(rename = "timestamp")]
    pub sent_at: i64,
    /// Content type, e.g. `text`.
    #[serde(rename = "type")]
    pub kind: String,
    pub text: MessageText,
    pub status: DeliveryState,
    pub direction: Direction,
    /// Human name of the conversation counterpart.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl Message {
    /// Materialize a new record with the given identity and creation time.
    pub fn from_new(new: NewMessage, row_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            row_id,
            external_id: new.external_id,
            meta_msg_id: new.meta_msg_id,
            conversation_id: new.conversation_id,
            sender_id: new.sender_id,
            sent_at: new.sent_at,
            kind: new.kind,
            text: new.text,
            status: new.status,
            direction: new.direction,
            contact_name: new.contact_name,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn body(&self) -> &str {
        &self.text.body
    }
}

/// One row of the conversation list: the latest message per counterpart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ContactSummary {
    /// Grouping key, always equal to `wa_id`.
    #[serde(rename = "_id")]
    pub id: String,
    pub wa_id: String,
    pub name: Option<String>,
    pub last_message: String,
    pub timestamp: i64,
}
