//! Database Integration Tests
//!
//! Run against a live `PostgreSQL` (`DATABASE_URL`); each test gets a fresh,
//! migrated database from `sqlx::test`.

#[cfg(test)]
mod postgres_tests {
    use super::super::*;
    use sqlx::PgPool;
    use uuid::Uuid;
    use wa_common::{DeliveryState, Direction, Message, MessageText, NewMessage};

    use crate::store::{MessageStore, PgMessageStore};

    fn inbound(external_id: &str, wa_id: &str, sent_at: i64, body: &str) -> NewMessage {
        NewMessage {
            external_id: external_id.to_string(),
            meta_msg_id: external_id.to_string(),
            conversation_id: wa_id.to_string(),
            sender_id: wa_id.to_string(),
            sent_at,
            kind: "text".to_string(),
            text: MessageText::new(body),
            status: DeliveryState::Sent,
            direction: Direction::Inbound,
            contact_name: Some(format!("Contact {wa_id}")),
        }
    }

    // ========================================================================
    // Query Tests
    // ========================================================================

    #[sqlx::test]
    #[ignore = "requires PostgreSQL"]
    async fn test_insert_and_list_message(pool: PgPool) {
        let id = Uuid::now_v7();
        let row = insert_message(&pool, id, &inbound("wamid.1", "919937320320", 1_754_400_000, "Hi"))
            .await
            .expect("Failed to insert message");

        assert_eq!(row.id, id);
        assert_eq!(row.status, "sent");
        assert_eq!(row.direction, "inbound");
        assert_eq!(row.created_at, row.updated_at);

        let mut rows = list_messages_for_contact(&pool, "919937320320")
            .await
            .expect("Query failed");
        assert_eq!(rows.len(), 1);
        let message = Message::try_from(rows.remove(0)).expect("Row should convert");
        assert_eq!(message.row_id, id);
        assert_eq!(message.external_id, "wamid.1");
        assert_eq!(message.body(), "Hi");
        assert_eq!(message.conversation_id, "919937320320");
    }

    #[sqlx::test]
    #[ignore = "requires PostgreSQL"]
    async fn test_update_status_touches_earliest_duplicate(pool: PgPool) {
        let first = insert_message(&pool, Uuid::now_v7(), &inbound("wamid.dup", "1", 10, "a"))
            .await
            .expect("insert");
        let second = insert_message(&pool, Uuid::now_v7(), &inbound("wamid.dup", "1", 11, "b"))
            .await
            .expect("insert");

        let updated = update_message_status(&pool, "wamid.dup", DeliveryState::Read)
            .await
            .expect("update")
            .expect("row should match");
        assert_eq!(updated.id, first.id);
        assert_eq!(updated.status, "read");
        assert!(updated.updated_at >= updated.created_at);

        let untouched = list_messages_for_contact(&pool, "1").await.expect("list");
        let other = untouched.iter().find(|r| r.id == second.id).expect("second row");
        assert_eq!(other.status, "sent");
    }

    #[sqlx::test]
    #[ignore = "requires PostgreSQL"]
    async fn test_update_status_unknown_id_is_noop(pool: PgPool) {
        let result = update_message_status(&pool, "wamid.none", DeliveryState::Delivered)
            .await
            .expect("update");
        assert!(result.is_none());
    }

    #[sqlx::test]
    #[ignore = "requires PostgreSQL"]
    async fn test_list_contacts_latest_first(pool: PgPool) {
        for (id, wa_id, ts, body) in [
            ("m1", "111", 100, "old a"),
            ("m2", "111", 300, "new a"),
            ("m3", "222", 200, "only b"),
        ] {
            insert_message(&pool, Uuid::now_v7(), &inbound(id, wa_id, ts, body))
                .await
                .expect("insert");
        }

        let contacts = list_contacts(&pool).await.expect("list");
        assert_eq!(contacts.len(), 2);
        assert_eq!(contacts[0].wa_id, "111");
        assert_eq!(contacts[0].last_message, "new a");
        assert_eq!(contacts[0].timestamp, 300);
        assert_eq!(contacts[1].wa_id, "222");
        assert_eq!(contacts[1].name.as_deref(), Some("Contact 222"));
    }

    #[sqlx::test]
    #[ignore = "requires PostgreSQL"]
    async fn test_list_messages_chronological(pool: PgPool) {
        for (id, ts) in [("late", 50), ("early", 10), ("mid", 30)] {
            insert_message(&pool, Uuid::now_v7(), &inbound(id, "333", ts, id))
                .await
                .expect("insert");
        }
        insert_message(&pool, Uuid::now_v7(), &inbound("other", "444", 1, "x"))
            .await
            .expect("insert");

        let rows = list_messages_for_contact(&pool, "333").await.expect("list");
        let ids: Vec<_> = rows.iter().map(|r| r.external_id.as_str()).collect();
        assert_eq!(ids, ["early", "mid", "late"]);
    }

    // ========================================================================
    // Store Tests
    // ========================================================================

    #[sqlx::test]
    #[ignore = "requires PostgreSQL"]
    async fn test_pg_store_roundtrip(pool: PgPool) {
        let store = PgMessageStore::new(pool);
        assert_eq!(store.backend(), "postgres");

        let created = store
            .insert(inbound("wamid.s1", "555", 1_754_400_000, "hello"))
            .await
            .expect("insert");
        assert_eq!(created.status, DeliveryState::Sent);

        let updated = store
            .update_status("wamid.s1", DeliveryState::Delivered)
            .await
            .expect("update")
            .expect("present");
        assert_eq!(updated.row_id, created.row_id);
        assert_eq!(updated.status, DeliveryState::Delivered);

        let messages = store.list_messages("555").await.expect("list");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].status, DeliveryState::Delivered);

        let contacts = store.list_contacts().await.expect("contacts");
        assert_eq!(contacts[0].id, "555");
        assert_eq!(contacts[0].last_message, "hello");
    }
}
