//! Database Queries
//!
//! Runtime queries (no compile-time `DATABASE_URL` required).
//!
//! All query functions include error context logging to aid debugging.

use sqlx::PgPool;
use tracing::error;
use uuid::Uuid;
use wa_common::{DeliveryState, NewMessage};

use super::models::{ContactRow, MessageRow};

/// Log and return a database error with context.
macro_rules! db_error {
    ($query:expr, $($field:tt)*) => {
        |e| {
            error!(query = $query, $($field)*, error = %e, "Database query failed");
            e
        }
    };
}

/// Insert a message. Duplicate external ids are allowed.
pub async fn insert_message(pool: &PgPool, id: Uuid, msg: &NewMessage) -> sqlx::Result<MessageRow> {
    sqlx::query_as::<_, MessageRow>(
        r"
        INSERT INTO processed_messages
            (id, external_id, meta_msg_id, wa_id, from_id, sent_at, kind, body,
             status, direction, contact_name)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING *
        ",
    )
    .bind(id)
    .bind(&msg.external_id)
    .bind(&msg.meta_msg_id)
    .bind(&msg.conversation_id)
    .bind(&msg.sender_id)
    .bind(msg.sent_at)
    .bind(&msg.kind)
    .bind(&msg.text.body)
    .bind(msg.status.as_str())
    .bind(msg.direction.as_str())
    .bind(msg.contact_name.as_deref())
    .fetch_one(pool)
    .await
    .map_err(db_error!("insert_message", external_id = %msg.external_id))
}

/// Set the delivery state of the earliest message with the given external id.
///
/// Returns `None` when no message carries that id.
pub async fn update_message_status(
    pool: &PgPool,
    external_id: &str,
    status: DeliveryState,
) -> sqlx::Result<Option<MessageRow>> {
    sqlx::query_as::<_, MessageRow>(
        r"
        UPDATE processed_messages
        SET status = $2, updated_at = NOW()
        WHERE id = (
            SELECT id FROM processed_messages
            WHERE external_id = $1
            ORDER BY created_at ASC, id ASC
            LIMIT 1
        )
        RETURNING *
        ",
    )
    .bind(external_id)
    .bind(status.as_str())
    .fetch_optional(pool)
    .await
    .map_err(db_error!("update_message_status", external_id = %external_id))
}

/// One row per contact with its most recent message, newest contact first.
pub async fn list_contacts(pool: &PgPool) -> sqlx::Result<Vec<ContactRow>> {
    sqlx::query_as::<_, ContactRow>(
        r"
        SELECT wa_id, name, last_message, timestamp
        FROM (
            SELECT DISTINCT ON (wa_id)
                wa_id,
                contact_name AS name,
                body AS last_message,
                sent_at AS timestamp
            FROM processed_messages
            ORDER BY wa_id, sent_at DESC, created_at DESC, id DESC
        ) latest
        ORDER BY timestamp DESC, wa_id ASC
        ",
    )
    .fetch_all(pool)
    .await
    .map_err(db_error!("list_contacts", scope = "all"))
}

/// All messages for one contact, oldest first.
pub async fn list_messages_for_contact(
    pool: &PgPool,
    wa_id: &str,
) -> sqlx::Result<Vec<MessageRow>> {
    sqlx::query_as::<_, MessageRow>(
        r"
        SELECT * FROM processed_messages
        WHERE wa_id = $1
        ORDER BY sent_at ASC, created_at ASC, id ASC
        ",
    )
    .bind(wa_id)
    .fetch_all(pool)
    .await
    .map_err(db_error!("list_messages_for_contact", wa_id = %wa_id))
}
