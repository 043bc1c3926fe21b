//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use branchtale_core::clock::Clock;
use branchtale_core::service::StoryService;
use branchtale_generation::application::schedule::PollConfig;
use branchtale_test_support::FixedClock;
use http_body_util::BodyExt;
use tower::ServiceExt;

use branchtale_api::state::AppState;

/// Build application state around `service` with the fixed test clock and
/// the default poll schedule.
pub fn test_state(service: Arc<dyn StoryService>) -> AppState {
    let clock: Arc<dyn Clock> = Arc::new(FixedClock::reference());
    AppState::new(service, clock, PollConfig::default())
}

/// Build the full app router, the same way `main.rs` does minus the
/// transport layers.
pub fn build_test_app(state: &AppState) -> Router {
    branchtale_api::app(state.clone())
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body_bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap()
    };

    (status, json)
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    send(app, request).await
}

/// Send a POST request without a body and return the response.
pub async fn post_empty(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}
