//! The generation job orchestrator.
//!
//! `Idle → Processing → {Completed | Failed}`, with [`JobOrchestrator::reset`]
//! returning to `Idle` from anywhere. At most one poll schedule exists at a
//! time, and it is cancelled on reset, on resubmission and on drop.

use std::sync::Arc;

use branchtale_core::clock::Clock;
use branchtale_core::error::DomainError;
use branchtale_core::ids::JobId;
use branchtale_core::service::StoryService;
use branchtale_core::wire::{CreateJobRequest, JobStatus};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use super::schedule::{PollConfig, PollSchedule};
use super::snapshot::{JobCell, JobPhase, JobSnapshot};
use crate::domain::job::{GenerationJob, JobFailure, JobOutcome};
use crate::domain::outcome::{PollOutcome, classify};

/// Caller-side handle on one submitted job.
///
/// The handle stays valid after the orchestrator moves on; it then reports
/// the job as superseded.
#[derive(Debug, Clone)]
pub struct JobHandle {
    job_id: JobId,
    epoch: u64,
    rx: watch::Receiver<JobSnapshot>,
}

impl JobHandle {
    /// The job this handle is bound to.
    #[must_use]
    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    /// The orchestrator's current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> JobSnapshot {
        self.rx.borrow().clone()
    }

    /// Whether the orchestrator still tracks this job.
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.rx.borrow().epoch == self.epoch
    }

    /// The job's status, or `None` once it has been superseded.
    #[must_use]
    pub fn status(&self) -> Option<JobStatus> {
        let snapshot = self.rx.borrow();
        if snapshot.epoch != self.epoch {
            return None;
        }
        snapshot.job.as_ref().map(|job| job.status)
    }

    /// Waits until the job completes, fails, or is superseded.
    pub async fn wait_for_outcome(&mut self) -> JobOutcome {
        let epoch = self.epoch;
        let Ok(snapshot) = self
            .rx
            .wait_for(|s| s.epoch != epoch || s.phase().is_terminal())
            .await
        else {
            return JobOutcome::Superseded;
        };
        if snapshot.epoch != epoch {
            return JobOutcome::Superseded;
        }
        snapshot
            .job
            .as_ref()
            .and_then(GenerationJob::outcome)
            .unwrap_or(JobOutcome::Superseded)
    }
}

/// Drives one generation job from submission to a terminal outcome.
pub struct JobOrchestrator {
    service: Arc<dyn StoryService>,
    clock: Arc<dyn Clock>,
    config: PollConfig,
    cell: JobCell,
    schedule: Option<PollSchedule>,
}

impl std::fmt::Debug for JobOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobOrchestrator")
            .field("config", &self.config)
            .field("snapshot", &self.cell.snapshot())
            .field("schedule", &self.schedule)
            .finish_non_exhaustive()
    }
}

impl JobOrchestrator {
    /// Creates an idle orchestrator.
    #[must_use]
    pub fn new(service: Arc<dyn StoryService>, clock: Arc<dyn Clock>, config: PollConfig) -> Self {
        Self {
            service,
            clock,
            config,
            cell: JobCell::new(),
            schedule: None,
        }
    }

    /// The current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> JobSnapshot {
        self.cell.snapshot()
    }

    /// The current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> JobPhase {
        self.cell.snapshot().phase()
    }

    /// Receives every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<JobSnapshot> {
        self.cell.subscribe()
    }

    /// A handle on the tracked job, if any.
    #[must_use]
    pub fn handle(&self) -> Option<JobHandle> {
        let snapshot = self.cell.snapshot();
        snapshot.job.map(|job| JobHandle {
            job_id: job.id,
            epoch: snapshot.epoch,
            rx: self.cell.subscribe(),
        })
    }

    /// Submits `theme` and starts polling the new job immediately.
    ///
    /// Any previous job is discarded first and its schedule cancelled.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for a blank theme, leaving the
    /// orchestrator untouched. Returns `DomainError::Transport` when the
    /// create request fails; the orchestrator is then `Failed` until reset.
    #[instrument(skip(self), fields(epoch))]
    pub async fn submit(&mut self, theme: &str) -> Result<JobHandle, DomainError> {
        let theme = theme.trim();
        if theme.is_empty() {
            return Err(DomainError::Validation("theme must not be empty".to_owned()));
        }

        self.schedule = None;
        let epoch = self.cell.reset();
        tracing::Span::current().record("epoch", epoch);

        let request = CreateJobRequest {
            theme: theme.to_owned(),
        };
        let response = match self.service.create_job(&request).await {
            Ok(response) => response,
            Err(e) => {
                let failure = JobFailure::transport(format!("Failed to create story: {e}"));
                warn!(reason = %failure.reason, "story generation job rejected");
                self.cell.reject(epoch, failure.clone());
                return Err(failure.into());
            }
        };

        let job_id = response.job_id.clone();
        info!(
            job_id = %job_id,
            reported_status = response.initial_status().as_str(),
            "story generation job submitted"
        );
        self.cell.track(
            epoch,
            GenerationJob::submitted(job_id.clone(), theme, self.clock.now()),
        );
        self.schedule = Some(PollSchedule::start(
            self.cell.clone(),
            Arc::clone(&self.service),
            Arc::clone(&self.clock),
            self.config,
            epoch,
            job_id.clone(),
        ));

        Ok(JobHandle {
            job_id,
            epoch,
            rx: self.cell.subscribe(),
        })
    }

    /// Issues one status request for `job_id` and applies the result.
    ///
    /// A result for a job that is not the one being polled is discarded and
    /// reported as [`PollOutcome::Stale`]; nothing is requested in that case.
    #[instrument(skip(self), fields(job_id = %job_id))]
    pub async fn poll_once(&self, job_id: &JobId) -> PollOutcome {
        let epoch = self.cell.snapshot().epoch;
        if !self.cell.begin_poll(epoch, job_id) {
            debug!("job not being polled, nothing to do");
            return PollOutcome::Stale;
        }
        let result = self.service.job_status(job_id).await;
        let outcome = self.cell.apply(
            epoch,
            job_id,
            classify(result),
            self.config.transport_retries,
            self.clock.as_ref(),
        );
        debug!(?outcome, "applied poll result");
        outcome
    }

    /// Discards the current job and cancels its schedule.
    pub fn reset(&mut self) {
        if let Some(schedule) = self.schedule.take() {
            debug!(job_id = %schedule.job_id(), "cancelling poll schedule");
        }
        let epoch = self.cell.reset();
        info!(epoch, "orchestrator reset");
    }
}
