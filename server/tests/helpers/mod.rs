//! Reusable test helpers for HTTP integration tests.
//!
//! Provides `TestApp` for building and sending requests through the full axum
//! router. The app runs on the in-memory store and the local event hub, so no
//! database or Redis is needed.
#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{self, Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tokio::sync::broadcast;
use tower::ServiceExt;
use wa_common::protocol::ServerEvent;
use wa_mirror_server::api::{create_router, AppState};
use wa_mirror_server::config::Config;
use wa_mirror_server::store::MemoryMessageStore;
use wa_mirror_server::ws::EventHub;

/// Business number used by [`Config::default_for_test`].
pub const BUSINESS: &str = "918329446654";

/// Router plus handles on its store and hub.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryMessageStore>,
    pub hub: EventHub,
}

impl TestApp {
    /// Create a new test app with the default test configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default_for_test())
    }

    /// Create a test app with a custom configuration.
    pub fn with_config(config: Config) -> Self {
        let store = Arc::new(MemoryMessageStore::new());
        let hub = EventHub::new(config.event_buffer);
        let state = AppState::new(config, store.clone(), hub.clone());

        Self {
            router: create_router(state),
            store,
            hub,
        }
    }

    /// Listen for real-time events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.hub.subscribe()
    }

    /// Build a request with the given method and URI.
    pub fn request(method: Method, uri: &str) -> http::request::Builder {
        Request::builder().method(method).uri(uri)
    }

    /// Send a request through the router via `tower::ServiceExt::oneshot`.
    pub async fn oneshot(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("oneshot request failed")
    }

    /// GET a URI and return the response.
    pub async fn get(&self, uri: &str) -> Response<Body> {
        let req = Self::request(Method::GET, uri)
            .body(Body::empty())
            .unwrap();
        self.oneshot(req).await
    }

    /// POST a JSON body and return the response.
    pub async fn post_json(&self, uri: &str, body: &serde_json::Value) -> Response<Body> {
        let req = Self::request(Method::POST, uri)
            .header("Content-Type", "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap();
        self.oneshot(req).await
    }
}

/// Collect a response body and parse it as JSON.
pub async fn body_to_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("Response is not JSON")
}

/// Collect a response body as text.
pub async fn body_to_string(response: Response<Body>) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("Response is not UTF-8")
}

/// Wrap a change `value` in the archived sample envelope.
pub fn sample_payload(value: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "payload_type": "whatsapp_webhook",
        "_id": "conv1-msg1-user",
        "metaData": {
            "entry": [{
                "changes": [{ "field": "messages", "value": value }],
                "id": "30164062719905277"
            }],
            "gs_app_id": "conv1-app",
            "object": "whatsapp_business_account"
        }
    })
}

/// Text message sent by `from`.
pub fn text_message(
    from: &str,
    name: &str,
    id: &str,
    timestamp: &str,
    body: &str,
) -> serde_json::Value {
    sample_payload(serde_json::json!({
        "messaging_product": "whatsapp",
        "metadata": { "display_phone_number": BUSINESS, "phone_number_id": "629305560276479" },
        "contacts": [{ "profile": { "name": name }, "wa_id": from }],
        "messages": [{
            "from": from,
            "id": id,
            "timestamp": timestamp,
            "text": { "body": body },
            "type": "text"
        }]
    }))
}

/// Status notification for message `id`.
pub fn status_update(id: &str, status: &str) -> serde_json::Value {
    sample_payload(serde_json::json!({
        "messaging_product": "whatsapp",
        "metadata": { "display_phone_number": BUSINESS, "phone_number_id": "629305560276479" },
        "statuses": [{
            "id": id,
            "meta_msg_id": id,
            "recipient_id": "919937320320",
            "status": status,
            "timestamp": "1754400020"
        }]
    }))
}
