//! API request handlers for the item registry

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use lostfound_common::{ClaimItemRequest, EditItemRequest, Error, Item, ReportItemRequest};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

use crate::service::{ItemService, ListQuery};

/// Shared application state
pub struct AppState {
    pub service: ItemService,

    /// Bearer token for staff routes; `None` leaves them open
    pub admin_token: Option<String>,
}

impl AppState {
    pub fn new(service: ItemService, admin_token: Option<String>) -> Self {
        Self {
            service,
            admin_token,
        }
    }
}

/// API Error type
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Map a service error, prefixing storage failures with `context`
    fn from_service(err: Error, context: &str) -> Self {
        match err {
            Error::Validation(message) => ApiError::new(StatusCode::BAD_REQUEST, message),
            Error::NotFound(_) => ApiError::new(StatusCode::NOT_FOUND, err.to_string()),
            Error::AlreadyClaimed => ApiError::new(StatusCode::BAD_REQUEST, err.to_string()),
            other => {
                error!("{}: {}", context, other);
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("{}: {}", context, other),
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.message
        });

        (self.status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

/// Item as returned by the API, with the derived claim-expiry fields
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemView {
    #[serde(flatten)]
    pub item: Item,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub claim_expires_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub claim_expired: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub claim_time_remaining: Option<String>,
}

impl ItemView {
    pub fn new(item: Item, now: DateTime<Utc>) -> Self {
        let expiry = item.claim_expiry(now);
        Self {
            claim_expires_at: expiry.as_ref().map(|e| e.expires_at),
            claim_expired: expiry.as_ref().map(|e| e.expired),
            claim_time_remaining: expiry.map(|e| e.remaining),
            item,
        }
    }
}

/// List of items
#[derive(Debug, Serialize)]
pub struct ItemsListResponse {
    pub items: Vec<ItemView>,
    pub total: usize,
}

/// Single item
#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub item: ItemView,
}

/// Outcome of a mutation, with the resulting item where there is one
#[derive(Debug, Serialize)]
pub struct MutationResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<ItemView>,
}

/// Health check endpoint
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Response {
    let service = &state.service;
    let backend = service.store().backend_name();
    let timestamp = service.now();

    match service.health().await {
        Ok(connected) => Json(serde_json::json!({
            "status": "ok",
            "timestamp": timestamp,
            "kv": {
                "connected": connected,
                "backend": backend
            }
        }))
        .into_response(),
        Err(e) => {
            error!("Health check failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "status": "error",
                    "timestamp": timestamp,
                    "error": e.to_string(),
                    "kv": {
                        "connected": false,
                        "backend": backend
                    }
                })),
            )
                .into_response()
        }
    }
}

/// List items, most recently found first
pub async fn list_items_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<ItemsListResponse>, ApiError> {
    let Query(query) = query?;
    info!("Listing items (q={:?}, status={:?})", query.q, query.status);

    let items = state
        .service
        .list_items(&query)
        .await
        .map_err(|e| ApiError::from_service(e, "Failed to fetch items"))?;

    let now = state.service.now();
    let items: Vec<ItemView> = items.into_iter().map(|i| ItemView::new(i, now)).collect();
    let total = items.len();

    Ok(Json(ItemsListResponse { items, total }))
}

/// Report a found item
pub async fn create_item_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ReportItemRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MutationResponse>), ApiError> {
    let Json(payload) = payload?;
    info!("Reporting item: {}", payload.item_name);

    let item = state
        .service
        .create_item(payload)
        .await
        .map_err(|e| ApiError::from_service(e, "Failed to create item"))?;

    Ok((
        StatusCode::CREATED,
        Json(MutationResponse {
            message: "Item created successfully".to_string(),
            item: Some(ItemView::new(item, state.service.now())),
        }),
    ))
}

/// Get a single item
pub async fn get_item_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ItemResponse>, ApiError> {
    info!("Getting item: {}", id);

    let item = state
        .service
        .get_item(&id)
        .await
        .map_err(|e| ApiError::from_service(e, "Failed to fetch item"))?;

    Ok(Json(ItemResponse {
        item: ItemView::new(item, state.service.now()),
    }))
}

/// Staff edit of an item's content and finder details
pub async fn update_item_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<EditItemRequest>, JsonRejection>,
) -> Result<Json<MutationResponse>, ApiError> {
    let Json(payload) = payload?;
    info!("Updating item: {}", id);

    let item = state
        .service
        .update_item(&id, payload)
        .await
        .map_err(|e| ApiError::from_service(e, "Failed to update item"))?;

    Ok(Json(MutationResponse {
        message: "Item updated successfully".to_string(),
        item: Some(ItemView::new(item, state.service.now())),
    }))
}

/// Delete an item
pub async fn delete_item_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MutationResponse>, ApiError> {
    info!("Deleting item: {}", id);

    state
        .service
        .delete_item(&id)
        .await
        .map_err(|e| ApiError::from_service(e, "Failed to delete item"))?;

    Ok(Json(MutationResponse {
        message: "Item deleted successfully".to_string(),
        item: None,
    }))
}

/// Claim a lost item
pub async fn claim_item_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<ClaimItemRequest>, JsonRejection>,
) -> Result<Json<MutationResponse>, ApiError> {
    let Json(payload) = payload?;
    info!("Claiming item: {}", id);

    let item = state
        .service
        .claim_item(&id, payload)
        .await
        .map_err(|e| ApiError::from_service(e, "Failed to claim item"))?;

    Ok(Json(MutationResponse {
        message: "Item claimed successfully".to_string(),
        item: Some(ItemView::new(item, state.service.now())),
    }))
}
