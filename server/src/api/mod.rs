//! API Router and Application State
//!
//! Central routing configuration and shared state.

use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, extract::State, routing::get, Json, Router};
use serde::Serialize;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use utoipa::OpenApi;

use crate::{
    chat,
    config::Config,
    store::MessageStore,
    webhooks::{self, Normalizer},
    ws::{self, EventHub, EventPublisher},
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration
    pub config: Arc<Config>,
    /// Message persistence
    pub store: Arc<dyn MessageStore>,
    /// Local fan-out feeding WebSocket connections
    pub hub: EventHub,
    /// Where change notifications are published (the hub itself, or Redis)
    pub publisher: Arc<dyn EventPublisher>,
    /// Webhook normalizer bound to the same store and publisher
    pub normalizer: Arc<Normalizer>,
    realtime: &'static str,
}

impl AppState {
    /// Create state that publishes straight into the local hub.
    #[must_use]
    pub fn new(config: Config, store: Arc<dyn MessageStore>, hub: EventHub) -> Self {
        let publisher: Arc<dyn EventPublisher> = Arc::new(hub.clone());
        Self::with_publisher(config, store, hub, publisher, "local")
    }

    /// Create state with an external publisher whose events reach `hub` via a relay.
    #[must_use]
    pub fn with_publisher(
        config: Config,
        store: Arc<dyn MessageStore>,
        hub: EventHub,
        publisher: Arc<dyn EventPublisher>,
        realtime: &'static str,
    ) -> Self {
        let normalizer = Normalizer::new(
            store.clone(),
            Some(publisher.clone()),
            config.business_phone_id.clone(),
        );
        Self {
            config: Arc::new(config),
            store,
            hub,
            publisher,
            normalizer: Arc::new(normalizer),
            realtime,
        }
    }
}

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let max_body_size = state.config.max_body_size;
    let static_dir = state.config.static_dir.clone();

    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/openapi.json", get(openapi_json))
        .merge(webhooks::router())
        .merge(chat::router());

    let mut router = Router::new()
        .nest("/api", api_routes)
        // WebSocket
        .route("/ws", get(ws::handler));

    // Built client bundle, with unknown paths falling back to the SPA entry point
    if let Some(dir) = static_dir {
        let index = ServeFile::new(dir.join("index.html"));
        router = router.fallback_service(ServeDir::new(dir).not_found_service(index));
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(DefaultBodyLimit::max(max_body_size))
        .with_state(state)
}

/// Health check response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    /// Service status
    status: &'static str,
    /// Storage backend in use (`postgres` or `memory`)
    storage: &'static str,
    /// Real-time transport (`redis` or `local`)
    realtime: &'static str,
}

/// Health check endpoint.
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "system",
    responses((status = 200, description = "Service is up", body = HealthResponse)),
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        storage: state.store.backend(),
        realtime: state.realtime,
    })
}

#[derive(OpenApi)]
#[openapi(
    info(title = "WA Mirror API"),
    paths(
        health_check,
        webhooks::handlers::verify_webhook,
        webhooks::handlers::receive_webhook,
        webhooks::handlers::process_samples,
        webhooks::handlers::process_uploaded_samples,
        chat::messages::list_contacts,
        chat::messages::list_messages,
        chat::messages::send_message,
    ),
    components(schemas(
        HealthResponse,
        wa_common::Message,
        wa_common::MessageText,
        wa_common::DeliveryState,
        wa_common::Direction,
        wa_common::ContactSummary,
        webhooks::types::WebhookAck,
        webhooks::types::UploadedSamplesRequest,
        webhooks::batch::SampleResult,
        chat::messages::SendMessageRequest,
    )),
    tags(
        (name = "webhooks", description = "WhatsApp webhook ingestion"),
        (name = "chat", description = "Conversations and local messages"),
        (name = "system", description = "Service status"),
    )
)]
pub struct ApiDoc;

/// OpenAPI document.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
