//! Webhook Types
//!
//! Request/response bodies and errors of the ingestion endpoints.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use wa_common::Message;

use super::batch::SampleError;

/// Acknowledgement returned to the webhook sender.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct WebhookAck {
    /// Always true: the payload was accepted, even if nothing was stored
    pub success: bool,
    /// Created or updated record, `null` when nothing was processed
    pub result: Option<Message>,
}

/// Body of the uploaded-samples batch endpoint.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UploadedSamplesRequest {
    /// Archived webhook payloads, processed in order
    #[serde(default)]
    #[schema(value_type = Object)]
    pub payloads: serde_json::Value,
}

/// Webhook errors.
#[derive(Error, Debug)]
pub enum WebhookError {
    #[error("Missing or invalid webhook signature")]
    InvalidSignature,
    #[error("Webhook verification is not configured")]
    VerificationDisabled,
    #[error("Verification token mismatch")]
    VerificationFailed,
    #[error("Invalid JSON payload: {0}")]
    InvalidJson(String),
    #[error("Validation: {0}")]
    Validation(String),
    #[error(transparent)]
    Samples(#[from] SampleError),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Self::InvalidSignature => (StatusCode::UNAUTHORIZED, "INVALID_SIGNATURE"),
            Self::VerificationDisabled => (StatusCode::NOT_FOUND, "VERIFICATION_DISABLED"),
            Self::VerificationFailed => (StatusCode::FORBIDDEN, "VERIFICATION_FAILED"),
            Self::InvalidJson(_) => (StatusCode::BAD_REQUEST, "INVALID_JSON"),
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Self::Samples(SampleError::DirectoryNotFound(dir) | SampleError::NoSamples(dir)) => {
                tracing::warn!(dir = %dir.display(), "Sample batch has nothing to read");
                (StatusCode::NOT_FOUND, "SAMPLES_NOT_FOUND")
            }
            Self::Samples(SampleError::Io(e)) => {
                tracing::error!(error = %e, "Sample directory read failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };
        (
            status,
            Json(serde_json::json!({ "error": code, "message": self.to_string() })),
        )
            .into_response()
    }
}
