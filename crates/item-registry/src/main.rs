//! Lost-and-found Item Registry Service
//!
//! REST API for reporting, claiming and moderating found items

use anyhow::{Context, Result};
use item_registry::{
    create_router, AppState, Config, ItemService, ItemStore, KeyValueStore, MemoryKv, RedisKv,
    StorageBackend,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "item_registry=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;

    info!("Starting Item Registry Service");
    info!("Storage backend: {}", config.storage_backend);
    info!("Listening on {}", config.address());

    // Initialize storage
    let kv: Arc<dyn KeyValueStore> = match config.storage_backend {
        StorageBackend::Redis => {
            info!("Redis URL: {}", config.redis_url);
            Arc::new(
                RedisKv::connect(&config.redis_url)
                    .await
                    .context("Failed to initialize storage")?,
            )
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage; items are lost on restart");
            Arc::new(MemoryKv::new())
        }
    };

    let store = ItemStore::new(kv);
    let indexed = store
        .count_items()
        .await
        .context("Failed to read item index")?;
    info!("{} items in index", indexed);

    if config.admin_token.is_none() {
        warn!("ADMIN_TOKEN not set; staff edit and delete routes are unauthenticated");
    }

    // Create application state
    let state = AppState::new(ItemService::new(store), config.admin_token.clone());

    // Create router
    let app = create_router(state);

    // Bind and serve
    let addr = config.address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    info!("Item Registry Service running on http://{}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
