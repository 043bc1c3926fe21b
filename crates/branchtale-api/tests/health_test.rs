//! Integration tests for the health endpoint.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use branchtale_test_support::ScriptedStoryService;

#[tokio::test]
async fn test_health_returns_200_with_status_ok() {
    let state = common::test_state(Arc::new(ScriptedStoryService::new()));

    let (status, json) = common::get_json(common::build_test_app(&state), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let state = common::test_state(Arc::new(ScriptedStoryService::new()));
    let app = common::build_test_app(&state);

    let request = axum::http::Request::builder()
        .method("GET")
        .uri("/api/v1/nonexistent")
        .body(axum::body::Body::empty())
        .unwrap();

    let response = tower::ServiceExt::oneshot(app, request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
