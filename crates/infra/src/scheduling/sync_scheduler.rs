//! Periodic feed synchronization scheduler.
//!
//! Triggers a sweep of due subscriptions on a cron cadence. Join handles are
//! tracked, cancellation is explicit, and every asynchronous operation is
//! wrapped in a timeout. One subscription failing never aborts the sweep;
//! its error lands on the subscription's own sync metadata.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use calbridge_core::{Clock, SubscriptionRegistry, SyncService};
use futures::stream::{self, StreamExt};
use tokio::task::JoinHandle;
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::scheduling::error::{SchedulerError, SchedulerResult};

/// Configuration for the feed sync scheduler.
#[derive(Debug, Clone)]
pub struct FeedSyncSchedulerConfig {
    /// Cron expression describing the sweep cadence.
    pub cron_expression: String,
    /// A subscription is due once this many seconds have passed since its
    /// last sync attempt.
    pub interval_secs: i64,
    /// Maximum number of subscriptions synced concurrently within a sweep.
    pub max_concurrent: usize,
    /// Timeout applied to one whole sweep.
    pub job_timeout: Duration,
    /// Timeout for starting the underlying scheduler.
    pub start_timeout: Duration,
    /// Timeout for stopping the scheduler.
    pub stop_timeout: Duration,
    /// Timeout for awaiting the monitor task join handle.
    pub join_timeout: Duration,
}

impl Default for FeedSyncSchedulerConfig {
    fn default() -> Self {
        Self {
            cron_expression: "0 */5 * * * *".into(), // every 5 minutes
            interval_secs: 300,
            max_concurrent: 4,
            job_timeout: Duration::from_secs(300),
            start_timeout: Duration::from_secs(5),
            stop_timeout: Duration::from_secs(5),
            join_timeout: Duration::from_secs(5),
        }
    }
}

/// Feed synchronization scheduler with explicit lifecycle management.
pub struct FeedSyncScheduler {
    scheduler: Option<JobScheduler>,
    config: FeedSyncSchedulerConfig,
    monitor_handle: Option<JoinHandle<()>>,
    cancellation: CancellationToken,
    sync_service: Arc<SyncService>,
    subscriptions: Arc<dyn SubscriptionRegistry>,
    clock: Arc<dyn Clock>,
}

impl FeedSyncScheduler {
    /// Create a scheduler with a custom configuration.
    pub fn with_config(
        config: FeedSyncSchedulerConfig,
        sync_service: Arc<SyncService>,
        subscriptions: Arc<dyn SubscriptionRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            scheduler: None,
            config,
            monitor_handle: None,
            cancellation: CancellationToken::new(),
            sync_service,
            subscriptions,
            clock,
        }
    }

    /// Start the scheduler, spawning the monitoring task.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        self.cancellation = CancellationToken::new();

        let scheduler_instance = self.build_scheduler().await?;
        let start_timeout = self.config.start_timeout;

        let start_result = tokio::time::timeout(start_timeout, scheduler_instance.start())
            .await
            .map_err(|source| SchedulerError::Timeout { duration: start_timeout, source })?;

        start_result.map_err(|source| SchedulerError::StartFailed { source })?;

        self.scheduler = Some(scheduler_instance);

        let cancel = self.cancellation.clone();
        let handle = tokio::spawn(async move {
            cancel.cancelled().await;
            debug!("Feed sync scheduler monitor cancelled");
        });

        self.monitor_handle = Some(handle);
        info!(cron = %self.config.cron_expression, "Feed sync scheduler started");
        Ok(())
    }

    /// Stop the scheduler and wait for the monitor task to finish.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        if !self.is_running() {
            return Err(SchedulerError::NotRunning);
        }

        self.cancellation.cancel();

        let mut scheduler = match self.scheduler.take() {
            Some(scheduler) => scheduler,
            None => return Err(SchedulerError::NotRunning),
        };

        let stop_timeout = self.config.stop_timeout;
        let stop_result =
            tokio::time::timeout(stop_timeout, async move { scheduler.shutdown().await })
                .await
                .map_err(|source| SchedulerError::Timeout { duration: stop_timeout, source })?;

        stop_result.map_err(|source| SchedulerError::StopFailed { source })?;

        if let Some(handle) = self.monitor_handle.take() {
            let join_timeout = self.config.join_timeout;
            tokio::time::timeout(join_timeout, handle)
                .await
                .map_err(|source| SchedulerError::Timeout { duration: join_timeout, source })??
        }

        info!("Feed sync scheduler stopped");
        self.cancellation = CancellationToken::new();
        Ok(())
    }

    /// Returns true when a scheduler instance is active.
    pub fn is_running(&self) -> bool {
        self.scheduler.is_some()
    }

    async fn build_scheduler(&self) -> SchedulerResult<JobScheduler> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|source| SchedulerError::CreationFailed { source })?;
        let cron_expr = self.config.cron_expression.clone();
        let sync_service = self.sync_service.clone();
        let subscriptions = self.subscriptions.clone();
        let clock = self.clock.clone();
        let job_timeout = self.config.job_timeout;
        let interval_secs = self.config.interval_secs;
        let max_concurrent = self.config.max_concurrent;

        let job_definition = Job::new_async(cron_expr.as_str(), move |_id, _lock| {
            let sync_service = sync_service.clone();
            let subscriptions = subscriptions.clone();
            let clock = clock.clone();

            Box::pin(async move {
                match tokio::time::timeout(
                    job_timeout,
                    Self::sweep_due_subscriptions(
                        sync_service,
                        subscriptions,
                        clock,
                        interval_secs,
                        max_concurrent,
                    ),
                )
                .await
                {
                    Ok(Ok(())) => debug!("Feed sync sweep finished"),
                    Ok(Err(err)) => error!(error = %err, "Feed sync sweep failed"),
                    Err(_) => {
                        warn!(timeout_secs = job_timeout.as_secs(), "Feed sync sweep timed out");
                    }
                }
            })
        })
        .map_err(|source| SchedulerError::JobRegistrationFailed { source })?;

        let job_id = job_definition.guid();
        scheduler
            .add(job_definition)
            .await
            .map_err(|source| SchedulerError::JobRegistrationFailed { source })?;

        debug!(cron = %self.config.cron_expression, job_id = %job_id, "Registered feed sync job");
        Ok(scheduler)
    }

    async fn sweep_due_subscriptions(
        sync_service: Arc<SyncService>,
        subscriptions: Arc<dyn SubscriptionRegistry>,
        clock: Arc<dyn Clock>,
        interval_secs: i64,
        max_concurrent: usize,
    ) -> Result<(), SweepError> {
        let due = subscriptions
            .list_due(clock.now_ms(), interval_secs)
            .await
            .map_err(|err| SweepError::ListFailed(err.to_string()))?;

        if due.is_empty() {
            debug!("No subscriptions due for sync");
            return Ok(());
        }

        info!(due = due.len(), "Starting feed sync sweep");

        let total = due.len();
        let results = stream::iter(due)
            .map(|subscription| {
                let sync_service = sync_service.clone();
                async move {
                    let outcome = sync_service.sync_subscription(&subscription.id).await;
                    (subscription.id, outcome)
                }
            })
            .buffer_unordered(max_concurrent.max(1))
            .collect::<Vec<_>>()
            .await;

        let mut errors = 0;
        for (subscription_id, outcome) in results {
            match outcome {
                Ok(outcome) => {
                    debug!(
                        subscription_id = %subscription_id,
                        added = outcome.counts.added,
                        updated = outcome.counts.updated,
                        deleted = outcome.counts.deleted,
                        not_modified = outcome.not_modified,
                        "Subscription synced"
                    );
                }
                Err(err) => {
                    errors += 1;
                    warn!(subscription_id = %subscription_id, error = %err, "Subscription sync failed");
                }
            }
        }

        info!(total, errors, "Feed sync sweep completed");

        if errors > 0 {
            return Err(SweepError::SyncFailures { errors, total });
        }

        Ok(())
    }
}

impl Drop for FeedSyncScheduler {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("FeedSyncScheduler dropped while running; cancelling tasks");
            self.cancellation.cancel();
        }
    }
}

#[derive(Debug)]
enum SweepError {
    ListFailed(String),
    SyncFailures { errors: usize, total: usize },
}

impl fmt::Display for SweepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ListFailed(msg) => write!(f, "failed to list due subscriptions: {msg}"),
            Self::SyncFailures { errors, total } => {
                write!(f, "feed sync encountered {errors} errors across {total} subscriptions")
            }
        }
    }
}

impl std::error::Error for SweepError {}
