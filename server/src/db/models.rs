//! Database Models

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;
use wa_common::{ContactSummary, DeliveryState, Direction, Message, MessageText};

/// Row of the `processed_messages` table.
#[derive(Debug, Clone, FromRow)]
pub struct MessageRow {
    pub id: Uuid,
    pub external_id: String,
    pub meta_msg_id: String,
    pub wa_id: String,
    pub from_id: String,
    pub sent_at: i64,
    pub kind: String,
    pub body: String,
    pub status: String,
    pub direction: String,
    pub contact_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<MessageRow> for Message {
    type Error = wa_common::Error;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        Ok(Self {
            row_id: row.id,
            external_id: row.external_id,
            meta_msg_id: row.meta_msg_id,
            conversation_id: row.wa_id,
            sender_id: row.from_id,
            sent_at: row.sent_at,
            kind: row.kind,
            text: MessageText::new(row.body),
            status: row.status.parse::<DeliveryState>()?,
            direction: row.direction.parse::<Direction>()?,
            contact_name: row.contact_name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Latest message per contact, as produced by the contacts query.
#[derive(Debug, Clone, FromRow)]
pub struct ContactRow {
    pub wa_id: String,
    pub name: Option<String>,
    pub last_message: String,
    pub timestamp: i64,
}

impl From<ContactRow> for ContactSummary {
    fn from(row: ContactRow) -> Self {
        Self {
            id: row.wa_id.clone(),
            wa_id: row.wa_id,
            name: row.name,
            last_message: row.last_message,
            timestamp: row.timestamp,
        }
    }
}
