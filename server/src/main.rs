//! WA Mirror Server - Main Entry Point
//!
//! WhatsApp Business webhook mirror with real-time fan-out.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use wa_mirror_server::{
    api, config, db,
    store::{MemoryMessageStore, MessageStore, PgMessageStore},
    ws::{self, EventHub},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wa_mirror_server=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        business_phone_id = %config.business_phone_id,
        "Starting WA Mirror Server"
    );

    // Initialize storage
    let store: Arc<dyn MessageStore> = match config.database_url.as_deref() {
        Some(url) => {
            let pool = db::create_pool(url).await?;
            db::run_migrations(&pool).await?;
            Arc::new(PgMessageStore::new(pool))
        }
        None => {
            warn!("DATABASE_URL not set, messages are kept in memory only");
            Arc::new(MemoryMessageStore::new())
        }
    };

    let hub = EventHub::new(config.event_buffer);

    // Real-time transport: Redis pub/sub when configured, local hub otherwise
    let state = match config.redis_url.as_deref() {
        Some(url) => {
            let redis = db::create_redis_client(url).await?;
            ws::spawn_redis_relay(&redis, hub.clone());
            let publisher = Arc::new(ws::RedisPublisher::new(redis));
            api::AppState::with_publisher(config.clone(), store, hub, publisher, "redis")
        }
        None => api::AppState::new(config.clone(), store, hub),
    };

    // Build router
    let app = api::create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address))?;
    info!(address = %config.bind_address, "Server listening");

    // Graceful shutdown handler
    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
        info!("Received shutdown signal, cleaning up...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shutdown complete");

    Ok(())
}
