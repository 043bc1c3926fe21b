//! Shared application state.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use branchtale_core::clock::Clock;
use branchtale_core::service::StoryService;
use branchtale_generation::application::schedule::PollConfig;
use branchtale_session::application::play_session::PlaySession;
use branchtale_session::domain::commands::ResetSession;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use uuid::Uuid;

use crate::error::ApiError;

/// Idle time after which an untouched session is evicted.
pub const DEFAULT_SESSION_IDLE_TTL: Duration = Duration::from_secs(30 * 60);

/// A play session shared between request handlers and its background
/// generation task.
pub type SharedSession = Arc<Mutex<PlaySession>>;

struct SessionSlot {
    session: SharedSession,
    last_touched: Instant,
}

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Story generation service.
    pub service: Arc<dyn StoryService>,
    /// Clock used for job timestamps.
    pub clock: Arc<dyn Clock>,
    /// Poll schedule applied to every session.
    pub poll_config: PollConfig,
    idle_ttl: Duration,
    sessions: Arc<RwLock<HashMap<Uuid, SessionSlot>>>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(service: Arc<dyn StoryService>, clock: Arc<dyn Clock>, poll_config: PollConfig) -> Self {
        Self {
            service,
            clock,
            poll_config,
            idle_ttl: DEFAULT_SESSION_IDLE_TTL,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Sets how long a session may go untouched before it is evicted.
    #[must_use]
    pub fn with_idle_ttl(mut self, idle_ttl: Duration) -> Self {
        self.idle_ttl = idle_ttl;
        self
    }

    /// Idle time after which a session is evicted.
    #[must_use]
    pub fn idle_ttl(&self) -> Duration {
        self.idle_ttl
    }

    /// Opens an idle session and returns its id.
    pub async fn create_session(&self) -> Uuid {
        let session = PlaySession::new(
            Arc::clone(&self.service),
            Arc::clone(&self.clock),
            self.poll_config,
        );
        let id = session.id();
        self.sessions.write().await.insert(
            id,
            SessionSlot {
                session: Arc::new(Mutex::new(session)),
                last_touched: Instant::now(),
            },
        );
        id
    }

    /// Looks up a session and marks it as used.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::SessionNotFound` for an unknown id.
    pub async fn session(&self, id: Uuid) -> Result<SharedSession, ApiError> {
        let mut sessions = self.sessions.write().await;
        let slot = sessions.get_mut(&id).ok_or(ApiError::SessionNotFound(id))?;
        slot.last_touched = Instant::now();
        Ok(Arc::clone(&slot.session))
    }

    /// Forgets a session and returns it, if it existed.
    pub async fn remove_session(&self, id: Uuid) -> Option<SharedSession> {
        self.sessions
            .write()
            .await
            .remove(&id)
            .map(|slot| slot.session)
    }

    /// Number of live sessions.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Resets and forgets every session untouched for the idle TTL.
    ///
    /// Returns the number of sessions evicted. Resetting cancels any poll
    /// schedule the session still runs, even if a background task holds it.
    pub async fn evict_idle(&self) -> usize {
        let now = Instant::now();
        let evicted: Vec<(Uuid, SharedSession)> = {
            let mut sessions = self.sessions.write().await;
            let expired: Vec<Uuid> = sessions
                .iter()
                .filter(|(_, slot)| now.duration_since(slot.last_touched) >= self.idle_ttl)
                .map(|(id, _)| *id)
                .collect();
            expired
                .into_iter()
                .filter_map(|id| sessions.remove(&id).map(|slot| (id, slot.session)))
                .collect()
        };

        for (id, session) in &evicted {
            session.lock().await.reset(&ResetSession::default());
            tracing::info!(session_id = %id, "evicted idle play session");
        }
        evicted.len()
    }
}
