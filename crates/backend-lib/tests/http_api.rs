// ===========================
// crates/backend-lib/tests/http_api.rs
// ===========================
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
};
use backend_lib::{config::Settings, ws_router, AppState};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(Settings::default()));
    (ws_router::create_router(Arc::clone(&state)), state)
}

async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_catalog_sleds() {
    let (app, _) = app();
    let (status, body) = get_json(app, "/api/cosmetics/sleds").await;

    assert_eq!(status, StatusCode::OK);
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 6);
    assert_eq!(items[0]["id"], "🛷");
    assert_eq!(items[0]["name"], "Classic Sled");
    assert!(items.iter().all(|item| item["url"].is_null()));
}

#[tokio::test]
async fn test_catalog_unknown_category_is_empty() {
    let (app, _) = app();
    let (status, body) = get_json(app, "/api/cosmetics/boots").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({"items": []}));
}

#[tokio::test]
async fn test_catalog_odd_category_is_empty_not_an_error() {
    for uri in ["/api/cosmetics/Hats", "/api/cosmetics/my-hats", "/api/cosmetics/SLEDS"] {
        let (app, _) = app();
        let (status, body) = get_json(app, uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body, serde_json::json!({"items": []}), "{uri}");
    }
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let (app, _) = app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/cosmetics/hats")
                .header(header::ORIGIN, "http://example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "*"
    );
}

#[tokio::test]
async fn test_health_counts_rooms() {
    let (app, state) = app();
    state.rooms.join_room(sledrun_common::HUB_CODE, "walker", None).unwrap();

    let (status, body) = get_json(app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["rooms"], 1);
    assert_eq!(body["clients"], 0);
}
