//! Integration tests for the Item Registry API

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use item_registry::{
    create_router, kv::KvOp, AppState, Clock, ItemService, ItemStore, ManualClock, MemoryKv,
    SystemClock,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`

const ADMIN_TOKEN: &str = "staff-secret";

struct TestApp {
    router: Router,
    kv: Arc<MemoryKv>,
}

/// Helper to create a test app backed by an in-memory store
fn create_test_app() -> TestApp {
    build_app(None, Arc::new(SystemClock))
}

fn build_app(admin_token: Option<&str>, clock: Arc<dyn Clock>) -> TestApp {
    let kv = Arc::new(MemoryKv::new());
    let service = ItemService::with_clock(ItemStore::new(kv.clone()), clock);
    let state = AppState::new(service, admin_token.map(str::to_string));

    TestApp {
        router: create_router(state),
        kv,
    }
}

impl TestApp {
    async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        (status, json)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None, None).await
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body), None).await
    }

    async fn create(&self, body: Value) -> Value {
        let (status, json) = self.post("/api/items", body).await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {}", json);
        json["item"].clone()
    }
}

fn report_at(name: &str, found_at: DateTime<Utc>) -> Value {
    json!({
        "itemName": name,
        "description": "Found near library",
        "latitude": 19.9,
        "longitude": 99.8,
        "foundAt": found_at.to_rfc3339(),
        "finderName": "A",
        "finderEmail": "a@b.com",
        "finderPhone": "0812345678",
        "pickupLocation": "Office"
    })
}

fn report(name: &str) -> Value {
    report_at(name, Utc::now() - Duration::days(1))
}

fn claim_body() -> Value {
    json!({
        "claimerName": "B",
        "claimerEmail": "b@c.com",
        "claimerPhone": "0899999999"
    })
}

fn edit_body() -> Value {
    json!({
        "itemName": "Brown Wallet",
        "description": "Leather, slightly worn",
        "finderName": "C",
        "finderEmail": "c@d.com",
        "finderPhone": "081-111-1111",
        "pickupLocation": "Library front desk"
    })
}

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app();

    let (status, json) = app.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["kv"]["connected"], true);
    assert_eq!(json["kv"]["backend"], "memory");
    assert!(json["timestamp"].is_string());

    // The scratch key is cleaned up.
    assert!(app.kv.is_empty().await);
}

#[tokio::test]
async fn test_health_check_reports_storage_failure() {
    let app = create_test_app();
    app.kv.fail_on(KvOp::Set, "connection refused").await;

    let (status, json) = app.get("/health").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["status"], "error");
    assert_eq!(json["kv"]["connected"], false);
    assert!(json["error"]
        .as_str()
        .unwrap()
        .contains("connection refused"));
}

#[tokio::test]
async fn test_report_then_claim_scenario() {
    let app = create_test_app();

    let (status, json) = app.post("/api/items", report("Black Wallet")).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["message"], "Item created successfully");

    let item = &json["item"];
    assert_eq!(item["status"], "lost");
    assert!(item["claimedAt"].is_null());
    assert!(item["claimImageUrl"].is_null());
    let id = item["id"].as_str().unwrap().to_string();

    let (status, json) = app
        .post(&format!("/api/items/{}/claim", id), claim_body())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Item claimed successfully");
    assert_eq!(json["item"]["status"], "claimed");
    assert!(json["item"]["claimedAt"].is_string());
    assert_eq!(json["item"]["claimerName"], "B");
    assert_eq!(json["item"]["claimExpired"], false);

    let (status, json) = app
        .post(&format!("/api/items/{}/claim", id), claim_body())
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Item has already been claimed");
}

#[tokio::test]
async fn test_created_item_round_trips() {
    let app = create_test_app();

    let created = app.create(report("Student ID")).await;
    let id = created["id"].as_str().unwrap();

    let (status, json) = app.get(&format!("/api/items/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["item"], created);
    assert!(json["item"]["createdAt"].is_string());
}

#[tokio::test]
async fn test_create_validation_errors() {
    let app = create_test_app();

    let mut body = report(&"n".repeat(101));
    let (status, json) = app.post("/api/items", body.clone()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Item name must be 100 characters or less");

    body["itemName"] = json!("n".repeat(100));
    body["latitude"] = json!(90.0001);
    let (status, json) = app.post("/api/items", body.clone()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Latitude must be between -90 and 90");

    body["latitude"] = json!(-90.0);
    let (status, _) = app.post("/api/items", body.clone()).await;
    assert_eq!(status, StatusCode::CREATED);

    let mut body = report("Umbrella");
    body["finderEmail"] = json!("not-an-email");
    let (status, json) = app.post("/api/items", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Finder email is not a valid email address");

    let mut body = report("Umbrella");
    body["imageUrl"] = json!("ftp://example.com/u.jpg");
    let (status, json) = app.post("/api/items", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Image URL must use HTTP or HTTPS");

    let future = report_at("Umbrella", Utc::now() + Duration::hours(1));
    let (status, json) = app.post("/api/items", future).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Found date cannot be in the future");

    // Only the one valid report was stored.
    let (_, json) = app.get("/api/items").await;
    assert_eq!(json["total"], 1);
}

#[tokio::test]
async fn test_non_numeric_coordinates_fail_in_field_order() {
    let app = create_test_app();

    let mut body = report("");
    body["latitude"] = json!("19.9");
    let (status, json) = app.post("/api/items", body.clone()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Item name is required");

    body["itemName"] = json!("Keys");
    let (status, json) = app.post("/api/items", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Invalid latitude");
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = create_test_app();

    let (status, json) = app
        .post("/api/items", json!({ "itemName": "Keys", "description": 42 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_list_after_creates_and_delete() {
    let app = create_test_app();
    let now = Utc::now();

    let mut ids = Vec::new();
    for hours_ago in [30, 5, 50, 1, 12] {
        let item = app
            .create(report_at(
                &format!("Item {}", hours_ago),
                now - Duration::hours(hours_ago),
            ))
            .await;
        ids.push(item["id"].as_str().unwrap().to_string());
    }

    let deleted = ids[1].clone();
    let (status, json) = app
        .send(Method::DELETE, &format!("/api/items/{}", deleted), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Item deleted successfully");

    let (status, json) = app.get("/api/items").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total"], 4);

    let items = json["items"].as_array().unwrap();
    assert!(items.iter().all(|i| i["id"] != deleted.as_str()));

    let names: Vec<&str> = items
        .iter()
        .map(|i| i["itemName"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Item 1", "Item 12", "Item 30", "Item 50"]);
}

#[tokio::test]
async fn test_list_search_and_status_filter() {
    let app = create_test_app();

    let wallet = app.create(report("Black Wallet")).await;
    app.create(report("Red Umbrella")).await;
    app.post(
        &format!("/api/items/{}/claim", wallet["id"].as_str().unwrap()),
        claim_body(),
    )
    .await;

    let (_, json) = app.get("/api/items?q=wallet").await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["items"][0]["itemName"], "Black Wallet");

    let (_, json) = app.get("/api/items?status=lost").await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["items"][0]["itemName"], "Red Umbrella");

    let (_, json) = app.get("/api/items?q=umbrella&status=claimed").await;
    assert_eq!(json["total"], 0);
}

#[tokio::test]
async fn test_list_unknown_status_is_bad_request() {
    let app = create_test_app();

    let (status, json) = app.get("/api/items?status=bogus").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("bogus"));
}

#[tokio::test]
async fn test_get_missing_item() {
    let app = create_test_app();

    let (status, json) = app.get("/api/items/does-not-exist").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Item not found");
}

#[tokio::test]
async fn test_update_item() {
    let app = create_test_app();

    let created = app.create(report("Black Wallet")).await;
    let id = created["id"].as_str().unwrap();

    let (status, json) = app
        .send(
            Method::PUT,
            &format!("/api/items/{}", id),
            Some(edit_body()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Item updated successfully");

    let item = &json["item"];
    assert_eq!(item["itemName"], "Brown Wallet");
    assert_eq!(item["finderPhone"], "081-111-1111");
    assert_eq!(item["pickupLocation"], "Library front desk");
    assert_eq!(item["id"], created["id"]);
    assert_eq!(item["createdAt"], created["createdAt"]);
    assert_eq!(item["foundAt"], created["foundAt"]);
    assert_eq!(item["latitude"], created["latitude"]);
    assert_eq!(item["status"], "lost");

    let (_, json) = app.get(&format!("/api/items/{}", id)).await;
    assert_eq!(json["item"]["itemName"], "Brown Wallet");
}

#[tokio::test]
async fn test_update_errors() {
    let app = create_test_app();

    let (status, _) = app
        .send(Method::PUT, "/api/items/missing", Some(edit_body()), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let created = app.create(report("Black Wallet")).await;
    let mut body = edit_body();
    body["pickupLocation"] = json!("p".repeat(201));

    let (status, json) = app
        .send(
            Method::PUT,
            &format!("/api/items/{}", created["id"].as_str().unwrap()),
            Some(body),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Pickup location must be 200 characters or less");
}

#[tokio::test]
async fn test_delete_missing_is_not_found() {
    let app = create_test_app();

    for _ in 0..2 {
        let (status, json) = app
            .send(Method::DELETE, "/api/items/ghost", None, None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "Item not found");
    }
}

#[tokio::test]
async fn test_claim_errors() {
    let app = create_test_app();

    let (status, _) = app.post("/api/items/missing/claim", claim_body()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let created = app.create(report("Black Wallet")).await;
    let uri = format!("/api/items/{}/claim", created["id"].as_str().unwrap());

    // Proof image alone is not enough.
    let (status, json) = app
        .post(
            &uri,
            json!({ "claimImageUrl": "https://example.com/proof.jpg" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Claimer name is required");

    let mut body = claim_body();
    body["claimerPhone"] = json!("12345");
    let (status, json) = app.post(&uri, body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Claimer phone must be 10 to 15 digits");

    let mut body = claim_body();
    body["claimImageUrl"] = json!("data:image/jpeg;base64,/9j/4AAQSkZJRg==");
    let (status, json) = app.post(&uri, body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json["item"]["claimImageUrl"],
        "data:image/jpeg;base64,/9j/4AAQSkZJRg=="
    );
}

#[tokio::test]
async fn test_claim_expiry_is_derived() {
    let start = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
    let clock = Arc::new(ManualClock::new(start));
    let app = build_app(None, clock.clone());

    let created = app
        .create(report_at("Laptop charger", start - Duration::hours(3)))
        .await;
    let id = created["id"].as_str().unwrap();
    app.post(&format!("/api/items/{}/claim", id), claim_body())
        .await;

    clock.advance(Duration::days(1) + Duration::hours(2));
    let (_, json) = app.get(&format!("/api/items/{}", id)).await;
    assert_eq!(json["item"]["claimTimeRemaining"], "1d 22h");
    assert_eq!(json["item"]["claimExpired"], false);

    clock.advance(Duration::days(5));
    let (_, json) = app.get(&format!("/api/items/{}", id)).await;
    assert_eq!(json["item"]["status"], "claimed");
    assert_eq!(json["item"]["claimExpired"], true);
    assert_eq!(json["item"]["claimTimeRemaining"], "Expired");

    // Still listed; expiry never removes or resets an item.
    let (_, json) = app.get("/api/items").await;
    assert_eq!(json["total"], 1);
}

#[tokio::test]
async fn test_staff_routes_require_token() {
    let app = build_app(Some(ADMIN_TOKEN), Arc::new(SystemClock));

    let created = app.create(report("Black Wallet")).await;
    let uri = format!("/api/items/{}", created["id"].as_str().unwrap());

    let (status, json) = app
        .send(Method::PUT, &uri, Some(edit_body()), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "Admin token required");

    let (status, json) = app
        .send(Method::DELETE, &uri, None, Some("guess"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "Invalid admin token");

    // Public routes stay open.
    let (status, _) = app.get(&uri).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send(Method::PUT, &uri, Some(edit_body()), Some(ADMIN_TOKEN))
        .await;
    assert_eq!(status, StatusCode::OK);

    // Scheme is matched case-insensitively.
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(&uri)
        .header(header::AUTHORIZATION, format!("bearer {}", ADMIN_TOKEN))
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_storage_failure_is_internal_error() {
    let app = create_test_app();
    app.create(report("Black Wallet")).await;

    app.kv.fail_on(KvOp::Get, "redis timeout").await;

    let (status, json) = app.get("/api/items").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = json["error"].as_str().unwrap();
    assert!(message.starts_with("Failed to fetch items"));
    assert!(message.contains("redis timeout"));

    let (status, _) = app.post("/api/items", report("Keys")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}
