//! Cron scheduler for the periodic sync and reminder jobs.
//!
//! Registers two cron jobs on a shared `tokio-cron-scheduler` instance: the
//! full SaaS-to-store sync and the reminder batch. Each job takes a shared
//! overlap guard so a slow sync and a reminder run can never interleave
//! their note writes; a job finding the guard taken skips its tick instead
//! of queueing behind it.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dunner_core::{ReminderService, SyncService};
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, error, info, instrument, warn};

use crate::scheduling::error::{SchedulerError, SchedulerResult};

/// Configuration for the sync scheduler.
#[derive(Debug, Clone)]
pub struct SyncSchedulerConfig {
    /// Cron expression for the full sync job
    pub sync_cron: String,
    /// Cron expression for the reminder batch job
    pub reminder_cron: String,
    /// Timeout applied to a single job execution
    pub job_timeout: Duration,
    /// Timeout for starting/stopping the underlying scheduler
    pub lifecycle_timeout: Duration,
}

impl Default for SyncSchedulerConfig {
    fn default() -> Self {
        Self {
            sync_cron: "0 15 3 * * *".into(),
            reminder_cron: "0 30 9 * * Mon-Fri".into(),
            job_timeout: Duration::from_secs(1800),
            lifecycle_timeout: Duration::from_secs(5),
        }
    }
}

/// Cron scheduler with explicit lifecycle management.
pub struct SyncScheduler {
    scheduler: Option<JobScheduler>,
    config: SyncSchedulerConfig,
    sync: Arc<SyncService>,
    reminders: Arc<ReminderService>,
    run_guard: Arc<Mutex<()>>,
}

impl SyncScheduler {
    pub fn new(
        config: SyncSchedulerConfig,
        sync: Arc<SyncService>,
        reminders: Arc<ReminderService>,
    ) -> Self {
        Self { scheduler: None, config, sync, reminders, run_guard: Arc::new(Mutex::new(())) }
    }

    /// Start the scheduler and register both jobs.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        let scheduler = self.build_scheduler().await?;

        let timeout = self.config.lifecycle_timeout;
        tokio::time::timeout(timeout, scheduler.start())
            .await
            .map_err(|_| SchedulerError::Timeout { seconds: timeout.as_secs() })?
            .map_err(|err| SchedulerError::StartFailed(err.to_string()))?;

        self.scheduler = Some(scheduler);
        info!(
            sync_cron = %self.config.sync_cron,
            reminder_cron = %self.config.reminder_cron,
            "sync scheduler started"
        );
        Ok(())
    }

    /// Stop the scheduler gracefully.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        let mut scheduler = self.scheduler.take().ok_or(SchedulerError::NotRunning)?;

        let timeout = self.config.lifecycle_timeout;
        tokio::time::timeout(timeout, scheduler.shutdown())
            .await
            .map_err(|_| SchedulerError::Timeout { seconds: timeout.as_secs() })?
            .map_err(|err| SchedulerError::StopFailed(err.to_string()))?;

        info!("sync scheduler stopped");
        Ok(())
    }

    /// Returns true when a scheduler instance is active.
    pub fn is_running(&self) -> bool {
        self.scheduler.is_some()
    }

    async fn build_scheduler(&self) -> SchedulerResult<JobScheduler> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|err| SchedulerError::CreationFailed(err.to_string()))?;

        let sync_job = self.sync_job()?;
        scheduler
            .add(sync_job)
            .await
            .map_err(|err| SchedulerError::JobRegistrationFailed(err.to_string()))?;

        let reminder_job = self.reminder_job()?;
        scheduler
            .add(reminder_job)
            .await
            .map_err(|err| SchedulerError::JobRegistrationFailed(err.to_string()))?;

        Ok(scheduler)
    }

    fn sync_job(&self) -> SchedulerResult<Job> {
        let sync = Arc::clone(&self.sync);
        let guard = Arc::clone(&self.run_guard);
        let job_timeout = self.config.job_timeout;

        Job::new_async(self.config.sync_cron.as_str(), move |_id, _lock| {
            let sync = Arc::clone(&sync);
            let guard = Arc::clone(&guard);

            Box::pin(async move {
                let Ok(_slot) = guard.try_lock() else {
                    warn!(job = "sync", "previous job still running, skipping this tick");
                    return;
                };

                debug!(job = "sync", "scheduled sync starting");
                match tokio::time::timeout(job_timeout, sync.run(Utc::now())).await {
                    Ok(Ok(report)) => {
                        info!(
                            job = "sync",
                            clients = report.clients_synced,
                            invoices = report.invoices_synced,
                            errors = report.errors.len(),
                            "scheduled sync finished"
                        );
                    }
                    Ok(Err(err)) => error!(job = "sync", error = %err, "scheduled sync failed"),
                    Err(_) => warn!(
                        job = "sync",
                        timeout_secs = job_timeout.as_secs(),
                        "scheduled sync timed out"
                    ),
                }
            })
        })
        .map_err(|err| SchedulerError::JobRegistrationFailed(err.to_string()))
    }

    fn reminder_job(&self) -> SchedulerResult<Job> {
        let reminders = Arc::clone(&self.reminders);
        let guard = Arc::clone(&self.run_guard);
        let job_timeout = self.config.job_timeout;

        Job::new_async(self.config.reminder_cron.as_str(), move |_id, _lock| {
            let reminders = Arc::clone(&reminders);
            let guard = Arc::clone(&guard);

            Box::pin(async move {
                let Ok(_slot) = guard.try_lock() else {
                    warn!(job = "reminders", "previous job still running, skipping this tick");
                    return;
                };

                debug!(job = "reminders", "scheduled reminder batch starting");
                match tokio::time::timeout(job_timeout, reminders.run_batch(Utc::now())).await {
                    Ok(Ok(outcome)) => {
                        info!(
                            job = "reminders",
                            batch_id = %outcome.batch_id,
                            sent = outcome.sent.len(),
                            failed = outcome.failed.len(),
                            "scheduled reminder batch finished"
                        );
                    }
                    Ok(Err(err)) => {
                        error!(job = "reminders", error = %err, "scheduled reminder batch failed");
                    }
                    Err(_) => warn!(
                        job = "reminders",
                        timeout_secs = job_timeout.as_secs(),
                        "scheduled reminder batch timed out"
                    ),
                }
            })
        })
        .map_err(|err| SchedulerError::JobRegistrationFailed(err.to_string()))
    }
}
