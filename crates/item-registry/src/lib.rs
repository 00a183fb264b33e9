//! Lost-and-found Item Registry Service
//!
//! Finders report items they picked up on campus, owners claim them with
//! contact details and an optional proof photo, and staff edit or remove
//! listings. Items are persisted in a key-value store (Redis in production).
//!
//! ## Endpoints
//!
//! - `GET /health` - Key-value round trip
//! - `GET /api/items` - List items, most recently found first (`?q=`, `?status=`)
//! - `POST /api/items` - Report a found item
//! - `GET /api/items/{id}` - Get one item
//! - `PUT /api/items/{id}` - Staff edit
//! - `DELETE /api/items/{id}` - Staff delete
//! - `POST /api/items/{id}/claim` - Claim a lost item

pub mod auth;
pub mod config;
pub mod handlers;
pub mod kv;
pub mod service;
pub mod storage;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use config::{Config, StorageBackend};
pub use handlers::AppState;
pub use kv::{KeyValueStore, MemoryKv, RedisKv};
pub use service::{Clock, ItemService, ManualClock, SystemClock};
pub use storage::ItemStore;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let shared_state = Arc::new(state);

    let staff_routes = put(handlers::update_item_handler)
        .delete(handlers::delete_item_handler)
        .route_layer(middleware::from_fn_with_state(
            shared_state.clone(),
            auth::require_staff,
        ));

    Router::new()
        .route("/health", get(handlers::health_handler))
        .route(
            "/api/items",
            get(handlers::list_items_handler).post(handlers::create_item_handler),
        )
        .route(
            "/api/items/{id}",
            get(handlers::get_item_handler).merge(staff_routes),
        )
        .route("/api/items/{id}/claim", post(handlers::claim_item_handler))
        .with_state(shared_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
