//! Orchestrator state and the watch channel that publishes it.
//!
//! Every mutation goes through [`JobCell`], which tags state with an epoch.
//! The epoch is bumped on each submit and reset; a mutation carrying an
//! older epoch is refused under the channel's write lock, so a poll result
//! racing a reset can never leak into the new session.

use std::sync::Arc;

use branchtale_core::clock::Clock;
use branchtale_core::ids::{JobId, StoryId};
use branchtale_core::wire::JobStatus;
use tokio::sync::watch;

use crate::domain::job::{GenerationJob, JobFailure};
use crate::domain::outcome::{PollOutcome, PollSignal};

/// Coarse lifecycle of the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    /// No job.
    Idle,
    /// A job is being polled.
    Processing,
    /// The job produced a story.
    Completed,
    /// The job, or its submission, failed.
    Failed,
}

impl JobPhase {
    /// Whether polling is over for this phase.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Point-in-time view of the orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobSnapshot {
    /// Bumped on every submit and reset.
    pub epoch: u64,
    /// The tracked job, once the service accepted it.
    pub job: Option<GenerationJob>,
    /// Set when the create request itself failed.
    pub submit_failure: Option<JobFailure>,
    /// Status requests issued for the tracked job.
    pub polls_issued: u32,
    /// Consecutive transport failures while polling. "Not found" results
    /// never count.
    pub transport_failures: u32,
}

impl JobSnapshot {
    /// The lifecycle phase this snapshot represents.
    #[must_use]
    pub fn phase(&self) -> JobPhase {
        match (&self.job, &self.submit_failure) {
            (Some(job), _) => match job.status {
                JobStatus::Pending | JobStatus::Processing => JobPhase::Processing,
                JobStatus::Completed => JobPhase::Completed,
                JobStatus::Failed => JobPhase::Failed,
            },
            (None, Some(_)) => JobPhase::Failed,
            (None, None) => JobPhase::Idle,
        }
    }

    /// The failure of the job or of its submission.
    #[must_use]
    pub fn failure(&self) -> Option<&JobFailure> {
        self.job
            .as_ref()
            .and_then(|job| job.failure.as_ref())
            .or(self.submit_failure.as_ref())
    }

    /// The story produced by a completed job.
    #[must_use]
    pub fn story_id(&self) -> Option<&StoryId> {
        self.job.as_ref().and_then(|job| job.result_story_id.as_ref())
    }

    /// The id of the tracked job.
    #[must_use]
    pub fn job_id(&self) -> Option<&JobId> {
        self.job.as_ref().map(|job| &job.id)
    }

    fn polling_job(&mut self, epoch: u64, job_id: &JobId) -> Option<&mut GenerationJob> {
        if self.epoch != epoch {
            return None;
        }
        self.job
            .as_mut()
            .filter(|job| &job.id == job_id && !job.is_terminal())
    }
}

/// Shared, epoch-guarded orchestrator state.
#[derive(Debug, Clone)]
pub(crate) struct JobCell {
    tx: Arc<watch::Sender<JobSnapshot>>,
}

impl JobCell {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(JobSnapshot::default());
        Self { tx: Arc::new(tx) }
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<JobSnapshot> {
        self.tx.subscribe()
    }

    pub(crate) fn snapshot(&self) -> JobSnapshot {
        self.tx.borrow().clone()
    }

    /// Discards everything and starts a new epoch, which is returned.
    pub(crate) fn reset(&self) -> u64 {
        let mut epoch = 0;
        self.tx.send_modify(|snapshot| {
            epoch = snapshot.epoch + 1;
            *snapshot = JobSnapshot {
                epoch,
                ..JobSnapshot::default()
            };
        });
        epoch
    }

    /// Starts tracking an accepted job.
    pub(crate) fn track(&self, epoch: u64, job: GenerationJob) -> bool {
        self.tx.send_if_modified(|snapshot| {
            if snapshot.epoch != epoch {
                return false;
            }
            snapshot.job = Some(job);
            true
        })
    }

    /// Records that the create request failed.
    pub(crate) fn reject(&self, epoch: u64, failure: JobFailure) -> bool {
        self.tx.send_if_modified(|snapshot| {
            if snapshot.epoch != epoch {
                return false;
            }
            snapshot.submit_failure = Some(failure);
            true
        })
    }

    /// Counts a status request about to be issued. Returns `false` when the
    /// job is no longer being polled, in which case no request may be sent.
    pub(crate) fn begin_poll(&self, epoch: u64, job_id: &JobId) -> bool {
        let mut allowed = false;
        self.tx.send_if_modified(|snapshot| {
            if snapshot.polling_job(epoch, job_id).is_none() {
                return false;
            }
            snapshot.polls_issued += 1;
            allowed = true;
            true
        });
        allowed
    }

    /// Applies one classified status response to the tracked job.
    pub(crate) fn apply(
        &self,
        epoch: u64,
        job_id: &JobId,
        signal: PollSignal,
        transport_retries: u32,
        clock: &dyn Clock,
    ) -> PollOutcome {
        let mut outcome = PollOutcome::Stale;
        self.tx.send_if_modified(|snapshot| {
            let failures = snapshot.transport_failures;
            let Some(job) = snapshot.polling_job(epoch, job_id) else {
                return false;
            };
            match signal {
                PollSignal::InProgress(_) => {
                    outcome = PollOutcome::InProgress;
                    snapshot.transport_failures = 0;
                    failures != 0
                }
                PollSignal::NotFound => {
                    outcome = PollOutcome::NotYetVisible;
                    false
                }
                PollSignal::Completed(story_id) => {
                    job.complete(story_id.clone(), clock.now());
                    outcome = PollOutcome::Completed(story_id);
                    snapshot.transport_failures = 0;
                    true
                }
                PollSignal::Failed(reason) => {
                    let failure = JobFailure::generation(reason);
                    job.fail(failure.clone(), clock.now());
                    outcome = PollOutcome::Failed(failure);
                    true
                }
                PollSignal::Transport(message) => {
                    let failures = failures + 1;
                    if failures > transport_retries {
                        let failure =
                            JobFailure::transport(format!("Failed to check story status: {message}"));
                        job.fail(failure.clone(), clock.now());
                        outcome = PollOutcome::Failed(failure);
                    } else {
                        outcome = PollOutcome::TransportRetry { failures };
                    }
                    snapshot.transport_failures = failures;
                    true
                }
            }
        });
        outcome
    }

    /// Fails the job after the attempt budget ran out.
    pub(crate) fn give_up(&self, epoch: u64, job_id: &JobId, attempts: u32, clock: &dyn Clock) -> bool {
        self.tx.send_if_modified(|snapshot| {
            let Some(job) = snapshot.polling_job(epoch, job_id) else {
                return false;
            };
            job.fail(
                JobFailure::transport(format!("gave up after {attempts} status checks")),
                clock.now(),
            )
        })
    }
}
