//! The play session: one orchestrator, one engine, one lifecycle.
//!
//! Every transition happens inside a single `&mut self` call, so a session
//! is never observed half reset. Generation results are accepted only for
//! the job the session is still waiting on; an outcome that arrives after a
//! reset or a newer submission is ignored.

use std::sync::Arc;

use branchtale_core::clock::Clock;
use branchtale_core::command::Command;
use branchtale_core::error::DomainError;
use branchtale_core::ids::StoryId;
use branchtale_core::service::StoryService;
use branchtale_generation::application::orchestrator::{JobHandle, JobOrchestrator};
use branchtale_generation::application::schedule::PollConfig;
use branchtale_generation::domain::job::JobOutcome;
use branchtale_story::application::engine::StoryEngine;
use branchtale_story::application::loader::load_story;
use branchtale_story::domain::view::NodeView;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::domain::commands::{ChooseOption, OpenStory, ResetSession, RestartStory, SubmitTheme};
use crate::domain::view::{JobView, SessionPhase, SessionView};

/// A single reader's session.
pub struct PlaySession {
    id: Uuid,
    service: Arc<dyn StoryService>,
    orchestrator: JobOrchestrator,
    engine: StoryEngine,
    phase: SessionPhase,
    story_id: Option<StoryId>,
    failure: Option<DomainError>,
}

impl std::fmt::Debug for PlaySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaySession")
            .field("id", &self.id)
            .field("phase", &self.phase)
            .field("story_id", &self.story_id)
            .field("orchestrator", &self.orchestrator)
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

impl PlaySession {
    /// Creates an idle session with a random id.
    #[must_use]
    pub fn new(service: Arc<dyn StoryService>, clock: Arc<dyn Clock>, config: PollConfig) -> Self {
        Self::with_id(Uuid::new_v4(), service, clock, config)
    }

    /// Creates an idle session with the given id.
    #[must_use]
    pub fn with_id(
        id: Uuid,
        service: Arc<dyn StoryService>,
        clock: Arc<dyn Clock>,
        config: PollConfig,
    ) -> Self {
        Self {
            id,
            orchestrator: JobOrchestrator::new(Arc::clone(&service), clock, config),
            service,
            engine: StoryEngine::new(),
            phase: SessionPhase::Idle,
            story_id: None,
            failure: None,
        }
    }

    /// Session identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Why the session failed, while `Failed`.
    #[must_use]
    pub fn failure(&self) -> Option<&DomainError> {
        self.failure.as_ref()
    }

    /// Discards any previous state and submits a new theme.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for a blank theme, in which case the
    /// session is left as it was. Returns `DomainError::Transport` if the job
    /// could not be created; the session is then `Failed`.
    #[instrument(
        skip_all,
        fields(
            session_id = %self.id,
            command_type = command.command_type(),
            correlation_id = %command.correlation_id(),
        )
    )]
    pub async fn submit(&mut self, command: &SubmitTheme) -> Result<JobHandle, DomainError> {
        if command.theme.trim().is_empty() {
            return Err(DomainError::Validation("theme must not be empty".to_owned()));
        }
        self.clear();
        match self.orchestrator.submit(&command.theme).await {
            Ok(handle) => {
                self.phase = SessionPhase::Generating;
                info!(job_id = %handle.job_id(), "generating story");
                Ok(handle)
            }
            Err(e) => {
                self.fail(e.clone());
                Err(e)
            }
        }
    }

    /// Waits for the current job and loads the story it produced.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if nothing is being generated.
    /// Otherwise returns the error that moved the session to `Failed`.
    pub async fn await_story(&mut self) -> Result<NodeView, DomainError> {
        let handle = match (self.phase, self.orchestrator.handle()) {
            (SessionPhase::Generating, Some(handle)) => handle,
            _ => {
                return Err(DomainError::Validation(
                    "no story is being generated".to_owned(),
                ));
            }
        };
        let outcome = handle.clone().wait_for_outcome().await;
        self.settle(&handle, outcome).await?;
        self.engine
            .current_view()
            .ok_or_else(|| DomainError::Validation("generation was superseded".to_owned()))
    }

    /// Applies the outcome of the job behind `handle`.
    ///
    /// Split from [`Self::await_story`] so a caller can wait without holding
    /// the session. Outcomes for a job the session no longer waits on are
    /// ignored and the current phase is returned.
    ///
    /// # Errors
    ///
    /// Returns the error that moved the session to `Failed`.
    #[instrument(skip_all, fields(session_id = %self.id, job_id = %handle.job_id()))]
    pub async fn settle(
        &mut self,
        handle: &JobHandle,
        outcome: JobOutcome,
    ) -> Result<SessionPhase, DomainError> {
        if self.phase != SessionPhase::Generating || !handle.is_current() {
            debug!("ignoring outcome of a job no longer awaited");
            return Ok(self.phase);
        }
        match outcome {
            JobOutcome::Completed(story_id) => {
                self.load(story_id).await?;
            }
            JobOutcome::Failed(failure) => {
                let e = DomainError::from(failure);
                self.fail(e.clone());
                return Err(e);
            }
            JobOutcome::Superseded => {}
        }
        Ok(self.phase)
    }

    /// Discards any job and plays an existing story.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound`, `DomainError::Transport` or
    /// `DomainError::Integrity` if the story cannot be loaded; the session is
    /// then `Failed`.
    #[instrument(
        skip_all,
        fields(
            session_id = %self.id,
            command_type = command.command_type(),
            correlation_id = %command.correlation_id(),
            story_id = %command.story_id,
        )
    )]
    pub async fn open_story(&mut self, command: &OpenStory) -> Result<NodeView, DomainError> {
        self.orchestrator.reset();
        self.clear();
        self.load(command.story_id.clone()).await
    }

    /// Follows an option of the current node.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` unless playing, and
    /// `DomainError::Integrity` for a target the current node does not offer.
    #[instrument(
        skip_all,
        fields(
            session_id = %self.id,
            command_type = command.command_type(),
            correlation_id = %command.correlation_id(),
        )
    )]
    pub fn choose(&mut self, command: &ChooseOption) -> Result<NodeView, DomainError> {
        self.require_playing()?;
        self.engine.choose(&command.node_id)
    }

    /// Goes back to the first node.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` unless playing.
    #[instrument(
        skip_all,
        fields(
            session_id = %self.id,
            command_type = command.command_type(),
            correlation_id = %command.correlation_id(),
        )
    )]
    pub fn restart(&mut self, command: &RestartStory) -> Result<NodeView, DomainError> {
        self.require_playing()?;
        self.engine.restart()
    }

    /// Cancels polling, drops the job and the story, and returns to `Idle`.
    #[instrument(
        skip_all,
        fields(
            session_id = %self.id,
            command_type = command.command_type(),
            correlation_id = %command.correlation_id(),
        )
    )]
    pub fn reset(&mut self, command: &ResetSession) {
        self.orchestrator.reset();
        self.clear();
        info!("session reset");
    }

    /// Current projection of the session.
    #[must_use]
    pub fn view(&self) -> SessionView {
        let playing = self.phase == SessionPhase::Playing;
        SessionView {
            session_id: self.id,
            phase: self.phase,
            job: JobView::from_snapshot(&self.orchestrator.snapshot()),
            story_id: self.story_id.clone(),
            title: self.engine.title().map(str::to_owned),
            node: if playing { self.engine.current_view() } else { None },
            failure: self.failure.as_ref().map(|e| e.reason().to_owned()),
        }
    }

    async fn load(&mut self, story_id: StoryId) -> Result<NodeView, DomainError> {
        let loaded = match load_story(self.service.as_ref(), &story_id).await {
            Ok(graph) => self.engine.load(graph),
            Err(e) => Err(e),
        };
        match loaded {
            Ok(view) => {
                info!(story_id = %story_id, title = ?self.engine.title(), "playing story");
                self.story_id = Some(story_id);
                self.phase = SessionPhase::Playing;
                Ok(view)
            }
            Err(e) => {
                self.fail(e.clone());
                Err(e)
            }
        }
    }

    fn require_playing(&self) -> Result<(), DomainError> {
        if self.phase == SessionPhase::Playing {
            Ok(())
        } else {
            Err(DomainError::Validation("no story is being played".to_owned()))
        }
    }

    fn fail(&mut self, error: DomainError) {
        warn!(error = %error, "session failed");
        self.engine.unload();
        self.story_id = None;
        self.phase = SessionPhase::Failed;
        self.failure = Some(error);
    }

    fn clear(&mut self) {
        self.engine.unload();
        self.story_id = None;
        self.failure = None;
        self.phase = SessionPhase::Idle;
    }
}
