//! WhatsApp Webhook Ingestion
//!
//! Decodes vendor notifications, normalizes them into canonical messages and
//! announces every change to connected clients.

pub mod batch;
pub mod handlers;
pub mod normalizer;
pub mod payload;
pub mod signing;
pub mod types;

use axum::{routing::post, Router};

use crate::api::AppState;

pub use normalizer::{Normalizer, Outcome, SkipReason};
pub use payload::WebhookEvent;

/// Create webhook ingestion router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/webhook",
            post(handlers::receive_webhook).get(handlers::verify_webhook),
        )
        .route("/process-samples", post(handlers::process_samples))
        .route(
            "/process-uploaded-samples",
            post(handlers::process_uploaded_samples),
        )
}
