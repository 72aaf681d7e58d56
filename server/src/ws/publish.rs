//! Event Publishing
//!
//! Best-effort fan-out of [`ServerEvent`]s. Events published while nobody is
//! listening are dropped, never queued.

use async_trait::async_trait;
use fred::clients::Client as RedisClient;
use fred::prelude::{ClientLike, EventInterface, PubsubInterface};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use wa_common::protocol::ServerEvent;

/// Redis pub/sub channel shared by all server instances.
pub const EVENTS_CHANNEL: &str = "wa-mirror:events";

/// Publishing errors.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("JSON error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Redis error: {0}")]
    Redis(#[from] fred::error::Error),
}

/// Anything that can broadcast server events to connected clients.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish one event to every subscriber.
    async fn publish(&self, event: &ServerEvent) -> Result<(), PublishError>;
}

/// In-process broadcast hub feeding WebSocket connections.
#[derive(Clone)]
pub struct EventHub {
    tx: broadcast::Sender<ServerEvent>,
}

impl EventHub {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Register a new listener. It only sees events sent after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.tx.subscribe()
    }

    /// Number of currently connected listeners.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Deliver an event to local listeners. Returns how many received it.
    pub fn send(&self, event: ServerEvent) -> usize {
        match self.tx.send(event) {
            Ok(n) => n,
            Err(broadcast::error::SendError(event)) => {
                debug!(event = event.name(), "No listeners, event dropped");
                0
            }
        }
    }
}

#[async_trait]
impl EventPublisher for EventHub {
    async fn publish(&self, event: &ServerEvent) -> Result<(), PublishError> {
        self.send(event.clone());
        Ok(())
    }
}

/// Publishes events to Redis so every instance's hub receives them.
#[derive(Clone)]
pub struct RedisPublisher {
    redis: RedisClient,
}

impl RedisPublisher {
    #[must_use]
    pub const fn new(redis: RedisClient) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl EventPublisher for RedisPublisher {
    async fn publish(&self, event: &ServerEvent) -> Result<(), PublishError> {
        let payload = serde_json::to_string(event)?;
        self.redis
            .publish::<(), _, _>(EVENTS_CHANNEL, payload)
            .await?;
        Ok(())
    }
}

/// Forward events from the Redis channel into the local hub.
pub fn spawn_redis_relay(redis: &RedisClient, hub: EventHub) -> JoinHandle<()> {
    let subscriber = redis.clone_new();

    tokio::spawn(async move {
        let _connect_handle = subscriber.connect();
        if let Err(e) = subscriber.wait_for_connect().await {
            error!("Relay subscriber connection failed: {}", e);
            return;
        }

        let mut messages = subscriber.message_rx();
        if let Err(e) = subscriber.subscribe(EVENTS_CHANNEL).await {
            error!("Failed to subscribe to {}: {}", EVENTS_CHANNEL, e);
            return;
        }
        info!(channel = EVENTS_CHANNEL, "Redis event relay started");

        while let Ok(message) = messages.recv().await {
            let Some(payload) = message.value.as_str() else {
                continue;
            };
            match serde_json::from_str::<ServerEvent>(&payload) {
                Ok(event) => {
                    hub.send(event);
                }
                Err(e) => warn!(error = %e, "Dropping malformed relay event"),
            }
        }

        warn!("Redis event relay stopped");
    })
}
