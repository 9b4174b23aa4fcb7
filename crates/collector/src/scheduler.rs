use crate::funding_collector::FundingCollector;
use crate::types::PollOutcome;
use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

/// Runs a [`FundingCollector`] on a cron schedule.
pub struct CollectorScheduler {
    collector: Arc<FundingCollector>,
    cron_schedule: String,
}

impl CollectorScheduler {
    #[must_use]
    pub fn new(collector: Arc<FundingCollector>, cron_schedule: impl Into<String>) -> Self {
        Self {
            collector,
            cron_schedule: cron_schedule.into(),
        }
    }

    /// Polls once immediately, then on every cron tick until Ctrl+C.
    ///
    /// # Errors
    /// Returns an error if the cron expression is invalid or the scheduler
    /// fails to start.
    pub async fn start(self) -> Result<()> {
        info!("Starting funding collector with cron: {}", self.cron_schedule);

        self.run_once().await?;

        let mut scheduler = JobScheduler::new().await?;
        let collector = self.collector.clone();

        let job = Job::new_async(self.cron_schedule.as_str(), move |_uuid, _lock| {
            let collector = collector.clone();
            Box::pin(async move {
                if let Err(e) = collector.poll_once(Utc::now().timestamp_millis()).await {
                    error!("Funding poll failed: {:#}", e);
                }
            })
        })
        .with_context(|| format!("Invalid cron schedule: {}", self.cron_schedule))?;

        scheduler.add(job).await?;
        scheduler.start().await?;

        info!("Funding collector started");

        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl+C, shutting down");

        scheduler.shutdown().await?;

        let stats = self.collector.stats().await;
        info!(
            polls = stats.polls,
            stored = stats.snapshots_stored,
            cache_hits = stats.cache_hits,
            errors = stats.errors_encountered,
            "Funding collector stopped"
        );
        Ok(())
    }

    /// Runs a single poll now.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read.
    pub async fn run_once(&self) -> Result<PollOutcome> {
        let outcome = self
            .collector
            .poll_once(Utc::now().timestamp_millis())
            .await?;
        info!(?outcome, "Funding poll finished");
        Ok(outcome)
    }
}
