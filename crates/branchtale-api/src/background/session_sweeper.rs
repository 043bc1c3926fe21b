//! Periodic eviction of abandoned play sessions.
//!
//! Every session left untouched for the idle TTL is reset, which cancels
//! its poll schedule, and then dropped.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::state::AppState;

/// Default delay between two sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Run the sweep loop until `cancel` is triggered.
pub async fn run(state: AppState, every: Duration, cancel: CancellationToken) {
    tracing::info!(
        idle_ttl_secs = state.idle_ttl().as_secs(),
        interval_secs = every.as_secs(),
        "Session sweeper started"
    );

    let mut interval = tokio::time::interval(every);

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                tracing::info!("Session sweeper stopping");
                break;
            }
            _ = interval.tick() => {
                let evicted = state.evict_idle().await;
                if evicted > 0 {
                    let remaining = state.session_count().await;
                    tracing::info!(
                        evicted,
                        remaining,
                        "Session sweeper: evicted idle sessions"
                    );
                } else {
                    tracing::debug!("Session sweeper: nothing to evict");
                }
            }
        }
    }
}
