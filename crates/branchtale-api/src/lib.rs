//! Branchtale play server.
//!
//! Exposes play sessions over HTTP so a front end can submit a theme, wait
//! for the generated story, and walk through it.

use axum::Router;

pub mod background;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use state::AppState;

/// Builds the application router without transport layers.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/play", routes::play::router())
        .with_state(state)
}
