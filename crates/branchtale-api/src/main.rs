//! Branchtale play server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use branchtale_api::background::session_sweeper;
use branchtale_api::config::AppConfig;
use branchtale_api::error::AppError;
use branchtale_api::state::AppState;
use branchtale_core::clock::SystemClock;
use branchtale_http::HttpStoryService;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // A missing .env file is fine; the process environment still applies.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting Branchtale play server");

    let config = AppConfig::from_env()?;
    tracing::info!(
        story_service_url = %config.story_service_url,
        poll_interval_secs = config.poll.interval.as_secs(),
        poll_max_attempts = ?config.poll.max_attempts,
        poll_transport_retries = config.poll.transport_retries,
        session_idle_ttl_secs = config.session_idle_ttl.as_secs(),
        "configuration loaded"
    );

    let service = Arc::new(HttpStoryService::new(config.story_service_url.clone()));
    let app_state = AppState::new(service, Arc::new(SystemClock), config.poll)
        .with_idle_ttl(config.session_idle_ttl);

    let cancel = CancellationToken::new();
    let sweeper = tokio::spawn(session_sweeper::run(
        app_state.clone(),
        config.session_sweep_interval,
        cancel.clone(),
    ));

    // TODO: Replace CorsLayer::permissive() with the front end's origin once it is deployed separately.
    let app = branchtale_api::app(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cancel.cancel();
    if let Err(e) = sweeper.await {
        tracing::warn!(error = %e, "session sweeper did not stop cleanly");
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
