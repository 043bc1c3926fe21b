//! The recurring poll task bound to one job.

use std::sync::Arc;
use std::time::Duration;

use branchtale_core::clock::Clock;
use branchtale_core::ids::JobId;
use branchtale_core::service::StoryService;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, instrument, warn};

use super::snapshot::JobCell;
use crate::domain::outcome::{PollOutcome, classify};

/// Default delay between two status requests.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Tunables for the poll schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay between two status requests. The first request is immediate.
    pub interval: Duration,
    /// Status requests allowed before the job is failed; `None` polls until
    /// a terminal status or a reset.
    pub max_attempts: Option<u32>,
    /// Consecutive transport failures tolerated before the job is failed.
    /// Zero fails the job on the first one.
    pub transport_retries: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: None,
            transport_retries: 0,
        }
    }
}

impl PollConfig {
    /// Sets the poll interval.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Caps the number of status requests.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Tolerates up to `retries` consecutive transport failures.
    #[must_use]
    pub fn with_transport_retries(mut self, retries: u32) -> Self {
        self.transport_retries = retries;
        self
    }
}

/// A running poll loop for one job. Dropping it cancels the loop; no request
/// is issued and no state is touched after cancellation.
#[derive(Debug)]
pub(crate) struct PollSchedule {
    job_id: JobId,
    _cancel_on_drop: DropGuard,
}

impl PollSchedule {
    /// Spawns the loop. The first status request goes out immediately.
    pub(crate) fn start(
        cell: JobCell,
        service: Arc<dyn StoryService>,
        clock: Arc<dyn Clock>,
        config: PollConfig,
        epoch: u64,
        job_id: JobId,
    ) -> Self {
        let cancel = CancellationToken::new();
        tokio::spawn(run(
            cell,
            service,
            clock,
            config,
            epoch,
            job_id.clone(),
            cancel.clone(),
        ));
        Self {
            job_id,
            _cancel_on_drop: cancel.drop_guard(),
        }
    }

    pub(crate) fn job_id(&self) -> &JobId {
        &self.job_id
    }
}

#[instrument(skip_all, fields(job_id = %job_id, epoch = epoch))]
async fn run(
    cell: JobCell,
    service: Arc<dyn StoryService>,
    clock: Arc<dyn Clock>,
    config: PollConfig,
    epoch: u64,
    job_id: JobId,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(config.interval.max(MIN_POLL_INTERVAL));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut attempt: u32 = 0;

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                debug!("poll schedule cancelled");
                return;
            }
            _ = ticker.tick() => {}
        }

        if give_up_if_exhausted(&cell, &config, epoch, &job_id, attempt, clock.as_ref()) {
            return;
        }

        if !cell.begin_poll(epoch, &job_id) {
            debug!("job no longer polled, stopping schedule");
            return;
        }
        attempt += 1;

        let result = tokio::select! {
            () = cancel.cancelled() => {
                debug!(attempt, "poll schedule cancelled mid-request");
                return;
            }
            result = service.job_status(&job_id) => result,
        };

        let outcome = cell.apply(
            epoch,
            &job_id,
            classify(result),
            config.transport_retries,
            clock.as_ref(),
        );

        match &outcome {
            PollOutcome::InProgress => debug!(attempt, "job still processing"),
            PollOutcome::NotYetVisible => debug!(attempt, "job not visible yet"),
            PollOutcome::TransportRetry { failures } => {
                warn!(attempt, failures, "status check failed, will retry");
            }
            PollOutcome::Completed(story_id) => {
                info!(attempt, story_id = %story_id, "story generation completed");
            }
            PollOutcome::Failed(failure) => {
                warn!(attempt, reason = %failure.reason, "story generation failed");
            }
            PollOutcome::Stale => debug!(attempt, "discarded stale poll result"),
        }

        if outcome.stops_polling()
            || give_up_if_exhausted(&cell, &config, epoch, &job_id, attempt, clock.as_ref())
        {
            return;
        }
    }
}

/// Fails the job once `attempt` status requests have used up the budget.
fn give_up_if_exhausted(
    cell: &JobCell,
    config: &PollConfig,
    epoch: u64,
    job_id: &JobId,
    attempt: u32,
    clock: &dyn Clock,
) -> bool {
    if !config.max_attempts.is_some_and(|max| attempt >= max) {
        return false;
    }
    if cell.give_up(epoch, job_id, attempt, clock) {
        warn!(attempts = attempt, "giving up on story generation job");
    }
    true
}
