//! `PostgreSQL` message store.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;
use wa_common::{ContactSummary, DeliveryState, Message, NewMessage};

use super::{MessageStore, StoreError};
use crate::db;

/// Message store backed by the `processed_messages` table.
#[derive(Clone)]
pub struct PgMessageStore {
    pool: PgPool,
}

impl PgMessageStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageStore for PgMessageStore {
    async fn insert(&self, message: NewMessage) -> Result<Message, StoreError> {
        let row = db::insert_message(&self.pool, Uuid::now_v7(), &message).await?;
        Ok(Message::try_from(row)?)
    }

    async fn update_status(
        &self,
        external_id: &str,
        status: DeliveryState,
    ) -> Result<Option<Message>, StoreError> {
        db::update_message_status(&self.pool, external_id, status)
            .await?
            .map(Message::try_from)
            .transpose()
            .map_err(StoreError::from)
    }

    async fn list_contacts(&self) -> Result<Vec<ContactSummary>, StoreError> {
        let rows = db::list_contacts(&self.pool).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>, StoreError> {
        db::list_messages_for_contact(&self.pool, conversation_id)
            .await?
            .into_iter()
            .map(Message::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::from)
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
