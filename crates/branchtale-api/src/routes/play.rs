//! Routes for play sessions.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use branchtale_core::ids::{NodeId, StoryId};
use branchtale_generation::application::orchestrator::JobHandle;
use branchtale_session::domain::commands::{
    ChooseOption, OpenStory, ResetSession, RestartStory, SubmitTheme,
};
use branchtale_session::domain::view::SessionView;
use serde::{Deserialize, Serialize};
use tracing::{Instrument, debug, info, info_span, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::{AppState, SharedSession};

/// Request body for POST /{id}/submit.
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    /// Theme to generate a story around.
    pub theme: String,
}

/// Request body for POST /{id}/open.
#[derive(Debug, Deserialize)]
pub struct OpenRequest {
    /// Story to play.
    pub story_id: StoryId,
}

/// Request body for POST /{id}/choose.
#[derive(Debug, Deserialize)]
pub struct ChooseRequest {
    /// Target of the chosen option.
    pub node_id: NodeId,
}

/// Response body for POST /.
#[derive(Debug, Serialize)]
pub struct CreatedSession {
    /// Id of the new session.
    pub session_id: Uuid,
}

/// POST /
async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<CreatedSession>) {
    let session_id = state.create_session().await;
    info!(session_id = %session_id, "play session created");
    (StatusCode::CREATED, Json(CreatedSession { session_id }))
}

/// GET /{id}
async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let session = state.session(id).await?;
    let view = session.lock().await.view();
    Ok(Json(view))
}

/// POST /{id}/submit
///
/// Returns as soon as the job is accepted; the session reaches `playing` or
/// `failed` in the background.
#[instrument(skip(state, request), fields(session_id = %id))]
async fn submit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SubmitRequest>,
) -> Result<Json<SessionView>, ApiError> {
    let session = state.session(id).await?;
    let command = SubmitTheme::new(request.theme);
    info!(correlation_id = %command.correlation_id, "handling submit_theme command");

    let mut guard = session.lock().await;
    let handle = guard.submit(&command).await?;
    let view = guard.view();
    drop(guard);

    let span = info_span!("await_story", session_id = %id, job_id = %handle.job_id());
    tokio::spawn(await_story(session, handle).instrument(span));
    Ok(Json(view))
}

async fn await_story(session: SharedSession, mut handle: JobHandle) {
    let outcome = handle.wait_for_outcome().await;
    let mut session = session.lock().await;
    match session.settle(&handle, outcome).await {
        Ok(phase) => debug!(?phase, "generation settled"),
        Err(e) => debug!(error = %e, "generation ended in failure"),
    }
}

/// POST /{id}/open
#[instrument(skip(state, request), fields(session_id = %id, story_id = %request.story_id))]
async fn open_story(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<OpenRequest>,
) -> Result<Json<SessionView>, ApiError> {
    let session = state.session(id).await?;
    let command = OpenStory::new(request.story_id);
    info!(correlation_id = %command.correlation_id, "handling open_story command");

    let mut session = session.lock().await;
    session.open_story(&command).await?;
    Ok(Json(session.view()))
}

/// POST /{id}/choose
#[instrument(skip(state, request), fields(session_id = %id, node_id = %request.node_id))]
async fn choose(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ChooseRequest>,
) -> Result<Json<SessionView>, ApiError> {
    let session = state.session(id).await?;
    let command = ChooseOption::new(request.node_id);

    let mut session = session.lock().await;
    session.choose(&command)?;
    Ok(Json(session.view()))
}

/// POST /{id}/restart
async fn restart(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let session = state.session(id).await?;
    let mut session = session.lock().await;
    session.restart(&RestartStory::default())?;
    Ok(Json(session.view()))
}

/// POST /{id}/reset
async fn reset(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let session = state.session(id).await?;
    let mut session = session.lock().await;
    session.reset(&ResetSession::default());
    Ok(Json(session.view()))
}

/// DELETE /{id}
#[instrument(skip(state), fields(session_id = %id))]
async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let session = state
        .remove_session(id)
        .await
        .ok_or(ApiError::SessionNotFound(id))?;
    // A background task may still hold the session; stop its polling now.
    session.lock().await.reset(&ResetSession::default());
    info!("play session deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Returns the router for play sessions.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_session))
        .route("/{id}", get(get_session).delete(delete_session))
        .route("/{id}/submit", post(submit))
        .route("/{id}/open", post(open_story))
        .route("/{id}/choose", post(choose))
        .route("/{id}/restart", post(restart))
        .route("/{id}/reset", post(reset))
}
