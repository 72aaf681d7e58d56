//! Message Storage
//!
//! The persistence seam used by the normalizer and the chat API. Writes are
//! single-record and atomic; concurrent status updates to one external id are
//! last-write-wins.

mod memory;
mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use wa_common::{ContactSummary, DeliveryState, Message, NewMessage};

pub use memory::MemoryMessageStore;
pub use postgres::PgMessageStore;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Stored record is invalid: {0}")]
    Corrupt(#[from] wa_common::Error),
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Persistence for canonical messages and their read projections.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persist a new message. Never de-duplicates on external id.
    async fn insert(&self, message: NewMessage) -> Result<Message, StoreError>;

    /// Overwrite the delivery state of the earliest message with `external_id`.
    ///
    /// Returns `None` when nothing matches.
    async fn update_status(
        &self,
        external_id: &str,
        status: DeliveryState,
    ) -> Result<Option<Message>, StoreError>;

    /// Latest message per contact, most recent contact first.
    async fn list_contacts(&self) -> Result<Vec<ContactSummary>, StoreError>;

    /// Every message of one conversation, ordered by `sent_at` ascending.
    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>, StoreError>;

    /// Short backend name for health reporting.
    fn backend(&self) -> &'static str;
}
