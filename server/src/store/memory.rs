//! In-memory message store.
//!
//! Used when no `DATABASE_URL` is configured and by tests. Mirrors the ordering
//! rules of the SQL queries; insertion order stands in for `created_at, id`.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;
use wa_common::{ContactSummary, DeliveryState, Message, NewMessage};

use super::{MessageStore, StoreError};

/// Message store holding records in process memory.
#[derive(Default)]
pub struct MemoryMessageStore {
    messages: RwLock<Vec<Message>>,
}

impl MemoryMessageStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.messages.read().await.is_empty()
    }

    /// Snapshot of every record in insertion order.
    pub async fn all(&self) -> Vec<Message> {
        self.messages.read().await.clone()
    }
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
    async fn insert(&self, message: NewMessage) -> Result<Message, StoreError> {
        let record = Message::from_new(message, Uuid::now_v7(), Utc::now());
        self.messages.write().await.push(record.clone());
        Ok(record)
    }

    async fn update_status(
        &self,
        external_id: &str,
        status: DeliveryState,
    ) -> Result<Option<Message>, StoreError> {
        let mut messages = self.messages.write().await;
        let Some(record) = messages.iter_mut().find(|m| m.external_id == external_id) else {
            return Ok(None);
        };
        record.status = status;
        record.updated_at = Utc::now();
        Ok(Some(record.clone()))
    }

    async fn list_contacts(&self) -> Result<Vec<ContactSummary>, StoreError> {
        let messages = self.messages.read().await;

        // Later inserts win ties on sent_at, matching `created_at DESC`.
        let mut latest: HashMap<&str, &Message> = HashMap::new();
        for msg in messages.iter() {
            match latest.get(msg.conversation_id.as_str()) {
                Some(current) if current.sent_at > msg.sent_at => {}
                _ => {
                    latest.insert(msg.conversation_id.as_str(), msg);
                }
            }
        }

        let mut contacts: Vec<ContactSummary> = latest
            .into_values()
            .map(|msg| ContactSummary {
                id: msg.conversation_id.clone(),
                wa_id: msg.conversation_id.clone(),
                name: msg.contact_name.clone(),
                last_message: msg.text.body.clone(),
                timestamp: msg.sent_at,
            })
            .collect();
        contacts.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| a.wa_id.cmp(&b.wa_id))
        });
        Ok(contacts)
    }

    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>, StoreError> {
        let mut found: Vec<Message> = self
            .messages
            .read()
            .await
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect();
        // Stable sort keeps insertion order for equal timestamps.
        found.sort_by_key(|m| m.sent_at);
        Ok(found)
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
