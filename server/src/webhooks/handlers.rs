//! Webhook API Handlers
//!
//! Ingestion endpoints. The single-payload endpoint always acknowledges with 200
//! once the body is accepted, so the sender never retries.

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap};
use axum::response::IntoResponse;
use axum::Json;
use tracing::{info, instrument, warn};
use wa_common::Message;

use super::batch::{self, BatchReport, SampleResult};
use super::signing::{self, VerifyQuery, SIGNATURE_HEADER};
use super::types::{UploadedSamplesRequest, WebhookAck, WebhookError};
use crate::api::AppState;

/// GET /api/webhook
#[utoipa::path(
    get,
    path = "/api/webhook",
    tag = "webhooks",
    params(VerifyQuery),
    responses(
        (status = 200, description = "Challenge echoed", body = String),
        (status = 403, description = "Token mismatch"),
        (status = 404, description = "Verification not configured"),
    ),
)]
#[instrument(skip(state, query))]
pub async fn verify_webhook(
    State(state): State<AppState>,
    Query(query): Query<VerifyQuery>,
) -> Result<impl IntoResponse, WebhookError> {
    let expected = state
        .config
        .webhook_verify_token
        .as_deref()
        .ok_or(WebhookError::VerificationDisabled)?;

    let Some(challenge) = query.accept(expected) else {
        warn!(mode = ?query.mode, "Webhook verification rejected");
        return Err(WebhookError::VerificationFailed);
    };

    info!("Webhook verification successful");
    Ok(([(header::CONTENT_TYPE, "text/plain")], challenge.to_string()))
}

/// POST /api/webhook
#[utoipa::path(
    post,
    path = "/api/webhook",
    tag = "webhooks",
    request_body(content = serde_json::Value, description = "WhatsApp Business webhook payload"),
    responses(
        (status = 200, description = "Payload accepted", body = WebhookAck),
        (status = 400, description = "Body is not JSON"),
        (status = 401, description = "Signature missing or wrong"),
    ),
)]
#[instrument(skip_all, fields(bytes = body.len()))]
pub async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, WebhookError> {
    if let Some(secret) = state.config.webhook_app_secret.as_deref() {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(WebhookError::InvalidSignature)?;
        if !signing::verify_signature(secret, &body, signature) {
            warn!("Webhook signature mismatch");
            return Err(WebhookError::InvalidSignature);
        }
    }

    let payload: serde_json::Value =
        serde_json::from_slice(&body).map_err(|e| WebhookError::InvalidJson(e.to_string()))?;

    let result = state.normalizer.ingest_best_effort(&payload).await;

    Ok(Json(WebhookAck {
        success: true,
        result,
    }))
}

/// POST /api/process-samples
#[utoipa::path(
    post,
    path = "/api/process-samples",
    tag = "webhooks",
    responses(
        (status = 200, description = "Samples replayed"),
        (status = 404, description = "Samples directory missing or empty"),
    ),
)]
#[instrument(skip(state))]
pub async fn process_samples(
    State(state): State<AppState>,
) -> Result<Json<BatchReport<SampleResult>>, WebhookError> {
    let report = batch::ingest_directory(&state.normalizer, &state.config.samples_dir).await?;
    Ok(Json(report))
}

/// POST /api/process-uploaded-samples
#[utoipa::path(
    post,
    path = "/api/process-uploaded-samples",
    tag = "webhooks",
    request_body = UploadedSamplesRequest,
    responses(
        (status = 200, description = "Payloads replayed"),
        (status = 400, description = "Payloads is not an array"),
    ),
)]
#[instrument(skip_all)]
pub async fn process_uploaded_samples(
    State(state): State<AppState>,
    Json(req): Json<UploadedSamplesRequest>,
) -> Result<Json<BatchReport<Message>>, WebhookError> {
    let serde_json::Value::Array(payloads) = req.payloads else {
        return Err(WebhookError::Validation(
            "Payloads must be an array".to_string(),
        ));
    };

    Ok(Json(batch::ingest_payloads(&state.normalizer, &payloads).await))
}
