//! Chat Service
//!
//! Conversation list, conversation history and locally originated messages.

pub mod messages;

use axum::{
    routing::{get, post},
    Router,
};

use crate::api::AppState;

/// Create chat router (mounted under `/api`).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/contacts", get(messages::list_contacts))
        .route("/messages", post(messages::send_message))
        .route("/messages/{wa_id}", get(messages::list_messages))
}
